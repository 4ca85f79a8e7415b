use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};

use crate::{
    api::session::found,
    error::ApiError,
    info,
    management::SessionId,
    server::AppState,
    warning,
};

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    match state.flow.begin_login(&session).await {
        Ok(auth_url) => found(&auth_url),
        Err(e) => {
            warning!("Cannot start login: {}", e);
            ApiError::from(e).into_response()
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Response {
    if let Err(e) = state.store.clear(&session).await {
        return ApiError::from(e).into_response();
    }

    info!("Session {} logged out", session);
    found(&state.settings.post_logout_redirect)
}
