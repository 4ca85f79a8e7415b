use std::sync::Arc;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::{
    config::{Settings, TokenPolicy},
    error::AuthError,
    management::{SessionId, SessionStore, TokenRefresher},
    warning,
};

/// A call against the versioned Web API, relative to `SPOTIFY_API_URL`.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    /// Parsed JSON body; `None` for empty or non-JSON bodies.
    pub body: Option<Value>,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// The authenticated request gate.
///
/// Every protected operation obtains its bearer token through [`authorize`]
/// and reaches the Web API through [`forward`]. How token expiry is handled
/// depends on the configured [`TokenPolicy`].
///
/// [`authorize`]: SpotifyClient::authorize
/// [`forward`]: SpotifyClient::forward
#[derive(Clone)]
pub struct SpotifyClient {
    settings: Arc<Settings>,
    store: Arc<dyn SessionStore>,
    refresher: TokenRefresher,
    http: Client,
}

impl SpotifyClient {
    pub fn new(
        settings: Arc<Settings>,
        store: Arc<dyn SessionStore>,
        refresher: TokenRefresher,
        http: Client,
    ) -> Self {
        Self {
            settings,
            store,
            refresher,
            http,
        }
    }

    /// Returns the session's access token or [`AuthError::Unauthorized`].
    ///
    /// Under [`TokenPolicy::Proactive`] a token close to expiry is refreshed
    /// first; the other policies only check that a token is present.
    pub async fn authorize(&self, session: &SessionId) -> Result<String, AuthError> {
        match self.settings.token_policy {
            TokenPolicy::Proactive => self.refresher.get_valid_token(session).await,
            TokenPolicy::Passthrough | TokenPolicy::Reactive => self.stored_token(session).await,
        }
    }

    /// Fails with [`AuthError::Unauthorized`] unless the session holds an
    /// access token. Never refreshes, whatever the policy.
    pub async fn check_access(&self, session: &SessionId) -> Result<(), AuthError> {
        self.stored_token(session).await.map(|_| ())
    }

    async fn stored_token(&self, session: &SessionId) -> Result<String, AuthError> {
        self.store
            .get(session)
            .await?
            .and_then(|record| record.access_token)
            .ok_or(AuthError::Unauthorized)
    }

    /// Issues `request` with the session's bearer token.
    ///
    /// Upstream error statuses are returned as a normal [`UpstreamResponse`];
    /// only gate rejection and transport failures are errors. Under
    /// [`TokenPolicy::Reactive`] an upstream 401 triggers one refresh and one
    /// retry; if the refresh fails the original 401 is returned.
    pub async fn forward(
        &self,
        session: &SessionId,
        request: &UpstreamRequest,
    ) -> Result<UpstreamResponse, AuthError> {
        let token = self.authorize(session).await?;
        let response = self.send(request, &token).await?;

        if response.status == StatusCode::UNAUTHORIZED
            && self.settings.token_policy == TokenPolicy::Reactive
        {
            match self.refresher.refresh(session).await {
                Ok(fresh) => return self.send(request, &fresh).await,
                Err(AuthError::NoRefreshToken) => {}
                Err(e) => warning!("Token refresh after upstream 401 failed: {}", e),
            }
        }

        Ok(response)
    }

    async fn send(
        &self,
        request: &UpstreamRequest,
        token: &str,
    ) -> Result<UpstreamResponse, AuthError> {
        let url = format!(
            "{base}{path}",
            base = self.settings.api_url.trim_end_matches('/'),
            path = request.path
        );

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .bearer_auth(token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            Some(body) => builder.json(body),
            // the player endpoints expect an explicit zero-length body
            None if request.method != Method::GET => builder.body(""),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AuthError::UpstreamUnreachable(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::UpstreamUnreachable(e.to_string()))?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice(&bytes).ok()
        };

        Ok(UpstreamResponse { status, body })
    }
}
