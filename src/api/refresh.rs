use axum::{Extension, extract::State, response::Json};
use serde_json::{Value, json};

use crate::{error::ApiError, management::SessionId, server::AppState};

/// The one response that carries an access token back to the browser.
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> Result<Json<Value>, ApiError> {
    let access_token = state.refresher.refresh(&session).await?;

    Ok(Json(json!({
        "success": true,
        "access_token": access_token
    })))
}
