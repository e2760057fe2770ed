//! HTTP request pipeline.
//!
//! Every backend call goes through [`RequestPipeline::send`], which wraps the
//! transport call in two hooks:
//! - [`RequestPipeline::authorize`] attaches `Authorization: Bearer <token>`
//!   when the session store holds a token.
//! - [`RequestPipeline::inspect`] classifies the response status. A 401 clears
//!   the session and fires the invalidation event before the caller sees
//!   [`AuthError::AuthorizationDenied`].

use crate::context::SessionContext;
use crate::{AuthError, AuthResult};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use taskboard_config::Config;
use tracing::{debug, warn};

/// Outcome class of an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 2xx
    Success,
    /// 401
    AuthorizationDenied,
    /// Any other non-success status below 500
    ClientError,
    /// 5xx
    ServerError,
}

/// Classify a response status.
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200..=299 => StatusClass::Success,
        401 => StatusClass::AuthorizationDenied,
        500..=599 => StatusClass::ServerError,
        _ => StatusClass::ClientError,
    }
}

/// Value of the `Authorization` header for a token.
pub fn bearer_value(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Configured HTTP client shared by every backend consumer.
#[derive(Clone)]
pub struct RequestPipeline {
    http_client: reqwest::Client,
    base_url: String,
    context: Arc<SessionContext>,
}

impl RequestPipeline {
    /// Build the pipeline from configuration.
    pub fn new(config: &Config, context: Arc<SessionContext>) -> AuthResult<Self> {
        let base_url = config.api_base_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            context,
        })
    }

    /// Base URL every path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Session context the hooks read from and clean up.
    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Absolute URL for an API path such as `/projects`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against an API path. Send it with [`Self::send`].
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client.request(method, self.endpoint(path))
    }

    /// Outbound hook: attach the current token, if any.
    ///
    /// Returns the session generation the token belongs to so the response can
    /// be matched against the session that sent it.
    pub fn authorize(&self, builder: RequestBuilder) -> (RequestBuilder, u64) {
        let (token, generation) = self.context.token_for_request();
        match token {
            Some(token) => (builder.header(AUTHORIZATION, bearer_value(&token)), generation),
            None => (builder, generation),
        }
    }

    /// Inbound hook: pass success through, handle 401 centrally, surface the rest.
    pub async fn inspect(&self, response: Response, generation: u64) -> AuthResult<Response> {
        let status = response.status();
        match classify_status(status.as_u16()) {
            StatusClass::Success => Ok(response),
            StatusClass::AuthorizationDenied => {
                warn!(url = %response.url().path(), generation, "Request not authorized");
                self.context.handle_authorization_denied(generation);
                Err(AuthError::AuthorizationDenied)
            }
            StatusClass::ClientError => {
                let body = response.text().await.unwrap_or_default();
                debug!(status = %status, "Request rejected");
                Err(AuthError::Validation {
                    status: status.as_u16(),
                    body,
                })
            }
            StatusClass::ServerError => {
                let body = response.text().await.unwrap_or_default();
                warn!(status = %status, "Server error");
                Err(AuthError::Server {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Send a request through both hooks.
    pub async fn send(&self, builder: RequestBuilder) -> AuthResult<Response> {
        let (builder, generation) = self.authorize(builder);
        let response = builder.send().await.map_err(|e| {
            warn!(error = %e, "Request failed without a response");
            AuthError::Network(e)
        })?;
        self.inspect(response, generation).await
    }

    /// `GET` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        debug!(path, "GET");
        let response = self.send(self.request(Method::GET, path)).await?;
        decode(response).await
    }

    /// `GET` with query parameters and decode the JSON body.
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> AuthResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        debug!(path, "GET");
        let response = self.send(self.request(Method::GET, path).query(query)).await?;
        decode(response).await
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(path, "POST");
        let response = self.send(self.request(Method::POST, path).json(body)).await?;
        decode(response).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> AuthResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!(path, "PUT");
        let response = self.send(self.request(Method::PUT, path).json(body)).await?;
        decode(response).await
    }

    /// `DELETE` and decode the JSON response.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> AuthResult<T> {
        debug!(path, "DELETE");
        let response = self.send(self.request(Method::DELETE, path)).await?;
        decode(response).await
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
async fn decode<T: DeserializeOwned>(response: Response) -> AuthResult<T> {
    let bytes = response.bytes().await?;
    let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
    serde_json::from_slice(bytes).map_err(|e| AuthError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_storage::{MemoryStorage, SessionStore};

    fn make_pipeline(base_url: &str) -> RequestPipeline {
        let config = Config {
            api_base_url: base_url.to_string(),
            ..Config::default()
        };
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        let context = Arc::new(SessionContext::new(store, "/login"));
        RequestPipeline::new(&config, context).unwrap()
    }

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(200), StatusClass::Success);
        assert_eq!(classify_status(201), StatusClass::Success);
        assert_eq!(classify_status(204), StatusClass::Success);
        assert_eq!(classify_status(401), StatusClass::AuthorizationDenied);
        assert_eq!(classify_status(400), StatusClass::ClientError);
        assert_eq!(classify_status(403), StatusClass::ClientError);
        assert_eq!(classify_status(404), StatusClass::ClientError);
        assert_eq!(classify_status(422), StatusClass::ClientError);
        assert_eq!(classify_status(500), StatusClass::ServerError);
        assert_eq!(classify_status(503), StatusClass::ServerError);
    }

    #[test]
    fn test_bearer_value() {
        assert_eq!(bearer_value("T1"), "Bearer T1");
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let pipeline = make_pipeline("http://localhost:5000/api");
        assert_eq!(pipeline.base_url(), "http://localhost:5000/api");
        assert_eq!(
            pipeline.endpoint("/auth/profile"),
            "http://localhost:5000/api/auth/profile"
        );
        assert_eq!(
            pipeline.endpoint("projects"),
            "http://localhost:5000/api/projects"
        );

        let pipeline = make_pipeline("http://localhost:5000/api/");
        assert_eq!(
            pipeline.endpoint("/projects"),
            "http://localhost:5000/api/projects"
        );
    }

    #[test]
    fn test_rejects_non_http_base_url() {
        let config = Config {
            api_base_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        let context = Arc::new(SessionContext::new(store, "/login"));
        assert!(matches!(
            RequestPipeline::new(&config, context),
            Err(AuthError::Config(_))
        ));
    }

    #[test]
    fn test_authorize_without_token_sends_unmodified() {
        let pipeline = make_pipeline("http://localhost:5000/api");
        let (builder, generation) = pipeline.authorize(pipeline.request(Method::GET, "/projects"));
        let request = builder.build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(generation, 0);
    }

    #[test]
    fn test_authorize_attaches_bearer_token() {
        let config = Config {
            api_base_url: "http://localhost:5000/api".to_string(),
            ..Config::default()
        };
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        store.set("T1").unwrap();
        let context = Arc::new(SessionContext::new(store, "/login"));
        let pipeline = RequestPipeline::new(&config, context).unwrap();

        let (builder, _) = pipeline.authorize(pipeline.request(Method::GET, "/projects"));
        let request = builder.build().unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Bearer T1"
        );
    }
}
