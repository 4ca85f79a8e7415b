use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    api::session::{found, session_cookie},
    error::AuthError,
    management::SessionId,
    server::AppState,
    types::CallbackParams,
};

pub async fn callback(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    match state.flow.handle_callback(&session, &params).await {
        Ok(authenticated) => {
            let cookie = session_cookie(&authenticated, state.settings.secure_cookie);
            (jar.add(cookie), found(&state.settings.post_login_redirect)).into_response()
        }
        Err(e) => (e.status(), callback_failure_text(&e)).into_response(),
    }
}

// Plain text, so a provider-supplied error string is never rendered as markup.
fn callback_failure_text(err: &AuthError) -> String {
    match err {
        AuthError::AuthorizationDenied(reason) => format!("Authorization failed: {reason}"),
        AuthError::MissingAuthorizationCode => "Authorization code not received".to_string(),
        AuthError::MissingVerifier => {
            "Code verifier not found in session. Please start the login again.".to_string()
        }
        AuthError::StateMismatch => {
            "Login state did not match. Please start the login again.".to_string()
        }
        AuthError::TokenExchangeFailed { status, .. } => {
            format!("Failed to obtain token (upstream status {status})")
        }
        AuthError::UpstreamUnreachable(_) => {
            "Authorization server unreachable. Please try again.".to_string()
        }
        AuthError::Unauthorized => "Session ended during login. Please start the login again.".to_string(),
        other => format!("Login failed: {other}"),
    }
}
