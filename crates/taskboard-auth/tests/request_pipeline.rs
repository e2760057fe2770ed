mod common;

use common::{auth_response, harness, manager_for, test_config};
use serde_json::{json, Value};
use std::time::Duration;
use taskboard_auth::{AuthError, InvalidationReason, SessionState};
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_requests_after_login_carry_bearer_token() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("T1")))
        .expect(1)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(2)
        .mount(&h.server)
        .await;

    h.manager.login("a@b.com", "x").await.unwrap();
    assert_eq!(h.stored_token(), Some("T1".to_string()));

    let first: Value = h.manager.pipeline().get("/projects").await.unwrap();
    let second: Value = h.manager.pipeline().get("/projects").await.unwrap();
    assert_eq!(first, json!([]));
    assert_eq!(second, json!([]));
}

#[tokio::test]
async fn test_request_without_token_has_no_authorization_header() {
    let h = harness(None).await;

    // Mounted first so it wins if an Authorization header is ever sent.
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&h.server)
        .await;

    let projects: Value = h.manager.pipeline().get("/projects").await.unwrap();
    assert_eq!(projects, json!([]));
}

#[tokio::test]
async fn test_requests_send_json_content_type() {
    let h = harness(Some("T0")).await;

    Mock::given(method("GET"))
        .and(path("/api/tasks/t1"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "t1" })))
        .expect(1)
        .mount(&h.server)
        .await;

    let task: Value = h.manager.pipeline().get("/tasks/t1").await.unwrap();
    assert_eq!(task["id"], "t1");
}

#[tokio::test]
async fn test_401_clears_session_before_event() {
    let h = harness(None).await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response("T1")))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/project/p1"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Token expired" })))
        .expect(1)
        .mount(&h.server)
        .await;

    h.manager.login("a@b.com", "x").await.unwrap();

    let result: Result<Value, _> = h.manager.pipeline().get("/tasks/project/p1").await;
    assert!(matches!(result, Err(AuthError::AuthorizationDenied)));

    assert_eq!(h.stored_token(), None);
    assert_eq!(h.manager.state(), SessionState::Unauthenticated);

    let events = h.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].event.reason, InvalidationReason::AuthorizationDenied);
    assert_eq!(events[0].event.login_route, "/login");
    assert_eq!(events[0].stored_token, None);
    assert_eq!(events[0].state, SessionState::Unauthenticated);
}

#[tokio::test]
async fn test_each_401_is_handled_once() {
    let h = harness(Some("T0")).await;

    Mock::given(method("DELETE"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&h.server)
        .await;

    let first: Result<Value, _> = h.manager.pipeline().delete("/projects/p1").await;
    let second: Result<Value, _> = h.manager.pipeline().delete("/projects/p1").await;
    assert!(matches!(first, Err(AuthError::AuthorizationDenied)));
    assert!(matches!(second, Err(AuthError::AuthorizationDenied)));

    assert_eq!(h.stored_token(), None);
    assert_eq!(h.events().len(), 2);
}

#[tokio::test]
async fn test_non_401_failures_pass_through() {
    let h = harness(Some("T0")).await;

    Mock::given(method("GET"))
        .and(path("/api/projects/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string(r#"{"message":"Project not found"}"#))
        .mount(&h.server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"message":"Title is required"}"#))
        .mount(&h.server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/projects/p1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&h.server)
        .await;

    let not_found: Result<Value, _> = h.manager.pipeline().get("/projects/missing").await;
    match not_found {
        Err(AuthError::Validation { status, body }) => {
            assert_eq!(status, 404);
            assert!(body.contains("Project not found"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }

    let invalid: Result<Value, _> = h
        .manager
        .pipeline()
        .post("/projects", &json!({ "title": "" }))
        .await;
    assert!(matches!(
        invalid,
        Err(AuthError::Validation { status: 422, .. })
    ));

    let server_error: Result<Value, _> = h
        .manager
        .pipeline()
        .put("/projects/p1", &json!({ "title": "x" }))
        .await;
    match server_error {
        Err(AuthError::Server { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "boom");
        }
        other => panic!("expected server error, got {:?}", other),
    }

    // None of these touch the session.
    assert_eq!(h.stored_token(), Some("T0".to_string()));
    assert!(h.events().is_empty());
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let h = harness(Some("T0")).await;

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&h.server)
        .await;

    let result: Result<Vec<Value>, _> = h.manager.pipeline().get("/projects").await;
    assert!(matches!(result, Err(AuthError::Decode(_))));
    assert_eq!(h.stored_token(), Some("T0".to_string()));
}

#[tokio::test]
async fn test_empty_success_body_decodes_as_null() {
    let h = harness(Some("T0")).await;

    Mock::given(method("DELETE"))
        .and(path("/api/tasks/t1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&h.server)
        .await;

    let result: Option<Value> = h.manager.pipeline().delete("/tasks/t1").await.unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_connection_failure_is_network_error() {
    let config = test_config("http://127.0.0.1:1/api");
    let manager = manager_for(&config, Some("T0"));

    let result: Result<Value, _> = manager.pipeline().get("/projects").await;
    assert!(matches!(result, Err(AuthError::Network(_))));
    assert_eq!(
        manager.context().stored_token().unwrap(),
        Some("T0".to_string())
    );
}

#[tokio::test]
async fn test_timeout_is_network_error() {
    let h = harness(None).await;
    let mut config = test_config(&format!("{}/api", h.server.uri()));
    config.request_timeout_secs = Some(1);
    let manager = manager_for(&config, Some("T0"));

    Mock::given(method("GET"))
        .and(path("/api/projects"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&h.server)
        .await;

    let result: Result<Value, _> = manager.pipeline().get("/projects").await;
    assert!(matches!(result, Err(AuthError::Network(_))));
    assert_eq!(
        manager.context().stored_token().unwrap(),
        Some("T0".to_string())
    );
}
