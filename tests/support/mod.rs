#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode},
};
use chrono::{Duration, Utc};
use goatmusic::{
    config::{Settings, TokenPolicy},
    management::{MemorySessionStore, SessionId, SessionStore},
    server::{self, AppState},
    types::CredentialRecord,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

pub struct Harness {
    pub provider: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub state: AppState,
}

impl Harness {
    pub async fn start(policy: TokenPolicy) -> Self {
        let provider = MockServer::start().await;
        let mut settings = Settings::new("client-123").with_provider_base(&provider.uri());
        settings.token_policy = policy;

        let store = Arc::new(MemorySessionStore::new());
        let state = AppState::new(settings, store.clone()).expect("http client");

        Harness {
            provider,
            store,
            state,
        }
    }

    pub fn router(&self) -> Router {
        server::router(self.state.clone())
    }

    pub async fn record(&self, session: &SessionId) -> Option<CredentialRecord> {
        self.store.get(session).await.expect("memory store")
    }

    /// A session holding a live access token and a refresh token.
    pub async fn authenticated_session(&self) -> SessionId {
        let session = SessionId::generate();
        self.store
            .put(&session, authenticated_record(Utc::now()))
            .await
            .expect("memory store");
        session
    }

    /// A session whose access token expired an hour ago.
    pub async fn expired_session(&self) -> SessionId {
        let session = SessionId::generate();
        self.store
            .put(&session, authenticated_record(Utc::now() - Duration::hours(2)))
            .await
            .expect("memory store");
        session
    }
}

pub fn authenticated_record(issued_at: chrono::DateTime<Utc>) -> CredentialRecord {
    CredentialRecord {
        access_token: Some("access-1".to_string()),
        refresh_token: Some("refresh-1".to_string()),
        issued_at: Some(issued_at),
        expires_in_seconds: Some(3600),
        ..Default::default()
    }
}

pub fn token_body(access: &str, refresh: Option<&str>) -> Value {
    let mut body = serde_json::json!({
        "access_token": access,
        "token_type": "Bearer",
        "scope": "user-read-private",
        "expires_in": 3600
    });
    if let Some(refresh) = refresh {
        body["refresh_token"] = Value::String(refresh.to_string());
    }
    body
}

pub fn cookie(session: &SessionId) -> String {
    format!("goatmusic_session={session}")
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }

    pub fn location(&self) -> &str {
        self.headers
            .get("location")
            .and_then(|v| v.to_str().ok())
            .expect("location header")
    }

    /// `name=value` of the session cookie set by the relay, if any.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all("set-cookie")
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("goatmusic_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.expect("router");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();

    Reply {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

pub fn request(method: &str, uri: &str, session: Option<&SessionId>, json: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header("cookie", cookie(session));
    }
    let body = match json {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}
