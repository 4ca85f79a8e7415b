//! Error types for configuration, session storage, the authorization flow and
//! the HTTP boundary.
//!
//! Every failure reaching a request handler is converted into an [`ApiError`],
//! which renders as `{ "error": message }` with a mapped status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },

    #[error("failed to prepare configuration directory: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session backend unavailable: {0}")]
    Backend(String),
}

/// Failures of the PKCE login handshake, the token refresher and the gate.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("authorization code missing from callback")]
    MissingAuthorizationCode,

    #[error("no pending code verifier for this session")]
    MissingVerifier,

    #[error("state parameter does not match the pending login")]
    StateMismatch,

    #[error("token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("token refresh failed with status {status}")]
    RefreshFailed { status: u16 },

    #[error("unauthorized")]
    Unauthorized,

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::InvalidParameter(_)
            | AuthError::AuthorizationDenied(_)
            | AuthError::MissingAuthorizationCode
            | AuthError::MissingVerifier
            | AuthError::StateMismatch
            | AuthError::NoRefreshToken => StatusCode::BAD_REQUEST,
            AuthError::TokenExchangeFailed { status, .. } | AuthError::RefreshFailed { status } => {
                upstream_status(*status)
            }
            AuthError::Unauthorized => StatusCode::UNAUTHORIZED,
            AuthError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            AuthError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Boundary error returned by every JSON handler.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Upstream { status: u16, message: String },

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error(transparent)]
    Auth(AuthError),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthorized => ApiError::Unauthorized,
            AuthError::UpstreamUnreachable(msg) => ApiError::UpstreamUnreachable(msg),
            other => ApiError::Auth(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Auth(AuthError::Store(err))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => upstream_status(*status),
            ApiError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ApiError::Auth(err) => err.status(),
        }
    }

    /// Message placed in the `error` field. Upstream bodies and token values
    /// never appear here.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Upstream { message, .. } => message.clone(),
            ApiError::UpstreamUnreachable(_) => "Upstream service unreachable".to_string(),
            ApiError::Auth(err) => match err {
                AuthError::NoRefreshToken => "No refresh token available".to_string(),
                AuthError::RefreshFailed { .. } => "Failed to refresh token".to_string(),
                AuthError::TokenExchangeFailed { .. } => "Failed to obtain token".to_string(),
                AuthError::Store(_) => "Session storage failure".to_string(),
                other => other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

fn upstream_status(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY)
}
