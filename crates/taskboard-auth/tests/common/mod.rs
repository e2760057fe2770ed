#![allow(dead_code)]

use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use taskboard_auth::{SessionInvalidated, SessionManager, SessionState};
use taskboard_config::Config;
use taskboard_storage::{MemoryStorage, SessionStore};
use wiremock::MockServer;

/// What the invalidation handler saw when it ran.
#[derive(Debug, Clone)]
pub struct ObservedEvent {
    pub event: SessionInvalidated,
    pub stored_token: Option<String>,
    pub state: SessionState,
}

pub struct Harness {
    pub server: MockServer,
    pub manager: SessionManager,
    pub events: Arc<Mutex<Vec<ObservedEvent>>>,
}

impl Harness {
    pub fn stored_token(&self) -> Option<String> {
        self.manager.context().stored_token().unwrap()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().clone()
    }
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        ..Config::default()
    }
}

pub fn manager_for(config: &Config, token: Option<&str>) -> SessionManager {
    let store = SessionStore::new(Box::new(MemoryStorage::new()));
    if let Some(token) = token {
        store.set(token).unwrap();
    }
    SessionManager::from_config(config, store).unwrap()
}

/// Start a mock backend and a manager pointed at `<server>/api`.
pub async fn harness(token: Option<&str>) -> Harness {
    let server = MockServer::start().await;
    let config = test_config(&format!("{}/api", server.uri()));
    let manager = manager_for(&config, token);

    let events = Arc::new(Mutex::new(Vec::new()));
    let recorded = events.clone();
    let context = manager.context().clone();
    manager.on_session_invalidated(move |event| {
        recorded.lock().push(ObservedEvent {
            event: event.clone(),
            stored_token: context.stored_token().unwrap(),
            state: context.state(),
        });
    });

    Harness {
        server,
        manager,
        events,
    }
}

pub fn user_json() -> Value {
    json!({ "id": "1", "name": "A", "email": "a@b.com" })
}

pub fn auth_response(token: &str) -> Value {
    json!({ "message": "ok", "token": token, "user": user_json() })
}
