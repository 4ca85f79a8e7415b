use axum::{Extension, body::Bytes, extract::State, response::Json};
use serde_json::{Value, json};

use crate::{
    api::proxy::{Operation, dispatch, json_body},
    error::ApiError,
    management::SessionId,
    server::AppState,
    spotify::UpstreamRequest,
    types::{PlayRequest, RepeatRequest, RepeatState, ShuffleRequest, VolumeRequest},
};

type ApiResult = Result<Json<Value>, ApiError>;

pub async fn currently_playing(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(
        UpstreamRequest::get("/me/player/currently-playing"),
        "Failed to fetch currently playing",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn player_state(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(UpstreamRequest::get("/me/player"), "Failed to fetch player state");
    dispatch(&state.spotify, &session, op).await
}

pub async fn recently_played(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(
        UpstreamRequest::get("/me/player/recently-played").query("limit", 20),
        "Failed to fetch recently played",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn play(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    body: Bytes,
) -> ApiResult {
    let request: PlayRequest = json_body(&body)?;
    let Some(uri) = request.uri.filter(|uri| !uri.is_empty()) else {
        return Err(ApiError::BadRequest("Track URI required".to_string()));
    };

    let op = Operation::command(
        UpstreamRequest::put("/me/player/play").json(json!({ "uris": [uri] })),
        "Failed to play track",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn pause(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::command(UpstreamRequest::put("/me/player/pause"), "Failed to pause");
    dispatch(&state.spotify, &session, op).await
}

pub async fn next(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::command(UpstreamRequest::post("/me/player/next"), "Failed to skip to next");
    dispatch(&state.spotify, &session, op).await
}

pub async fn previous(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::command(
        UpstreamRequest::post("/me/player/previous"),
        "Failed to skip to previous",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn volume(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    body: Bytes,
) -> ApiResult {
    let request: VolumeRequest = json_body(&body)?;
    let volume = match request.volume {
        None => 50,
        Some(value) => value
            .as_i64()
            .filter(|v| (0..=100).contains(v))
            .ok_or_else(|| ApiError::BadRequest("Volume must be between 0 and 100".to_string()))?,
    };

    let op = Operation::command(
        UpstreamRequest::put("/me/player/volume").query("volume_percent", volume),
        "Failed to set volume",
    )
    .echo("volume", json!(volume));
    dispatch(&state.spotify, &session, op).await
}

pub async fn shuffle(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    body: Bytes,
) -> ApiResult {
    let request: ShuffleRequest = json_body(&body)?;
    let shuffle = request.state.unwrap_or(true);

    let op = Operation::command(
        UpstreamRequest::put("/me/player/shuffle").query("state", shuffle),
        "Failed to toggle shuffle",
    )
    .echo("shuffle", json!(shuffle));
    dispatch(&state.spotify, &session, op).await
}

pub async fn repeat(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    body: Bytes,
) -> ApiResult {
    let request: RepeatRequest = json_body(&body)?;
    let repeat = match request.state.as_deref() {
        None => RepeatState::Off,
        Some(value) => RepeatState::parse(value)
            .ok_or_else(|| ApiError::BadRequest("Invalid repeat state".to_string()))?,
    };

    let op = Operation::command(
        UpstreamRequest::put("/me/player/repeat").query("state", repeat.as_str()),
        "Failed to set repeat mode",
    )
    .echo("repeat", json!(repeat.as_str()));
    dispatch(&state.spotify, &session, op).await
}
