use axum::{
    Extension,
    extract::{Path, Query, State},
    response::Json,
};
use serde_json::Value;

use crate::{
    api::proxy::{Operation, dispatch, ensure_success},
    error::ApiError,
    management::SessionId,
    server::AppState,
    spotify::UpstreamRequest,
    types::{SavedTracksResponse, SearchQuery},
};

type ApiResult = Result<Json<Value>, ApiError>;

pub async fn profile(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(UpstreamRequest::get("/me"), "Failed to fetch profile");
    dispatch(&state.spotify, &session, op).await
}

pub async fn playlists(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(UpstreamRequest::get("/me/playlists"), "Failed to fetch playlists");
    dispatch(&state.spotify, &session, op).await
}

pub async fn playlist(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(playlist_id): Path<String>,
) -> ApiResult {
    let playlist_id = resource_id(playlist_id)?;
    let op = Operation::fetch(
        UpstreamRequest::get(format!("/playlists/{playlist_id}")),
        "Failed to fetch playlist",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn search(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Query(query): Query<SearchQuery>,
) -> ApiResult {
    if query.q.is_empty() {
        return Err(ApiError::BadRequest("Query parameter required".to_string()));
    }

    let op = Operation::fetch(
        UpstreamRequest::get("/search")
            .query("q", &query.q)
            .query("type", "track,artist,album")
            .query("limit", 20),
        "Search failed",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn liked_tracks(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let op = Operation::fetch(
        UpstreamRequest::get("/me/tracks").query("limit", 50),
        "Failed to fetch liked tracks",
    );
    dispatch(&state.spotify, &session, op).await
}

/// Seeds recommendations with the user's five most recently saved tracks.
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
) -> ApiResult {
    let liked = state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me/tracks").query("limit", 5))
        .await?;
    let liked = ensure_success(liked, "Failed to fetch liked tracks for recommendations")?;

    let saved: SavedTracksResponse = liked
        .body
        .and_then(|body| serde_json::from_value(body).ok())
        .unwrap_or_default();
    let seeds: Vec<String> = saved.track_ids().into_iter().take(5).collect();
    if seeds.is_empty() {
        return Err(ApiError::BadRequest("No liked tracks found".to_string()));
    }

    let op = Operation::fetch(
        UpstreamRequest::get("/recommendations")
            .query("seed_tracks", seeds.join(","))
            .query("limit", 20)
            .query("market", "from_token"),
        "Failed to fetch recommendations",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn artist(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(artist_id): Path<String>,
) -> ApiResult {
    let artist_id = resource_id(artist_id)?;
    let op = Operation::fetch(
        UpstreamRequest::get(format!("/artists/{artist_id}")),
        "Failed to fetch artist",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn artist_top_tracks(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(artist_id): Path<String>,
) -> ApiResult {
    let artist_id = resource_id(artist_id)?;
    let op = Operation::fetch(
        UpstreamRequest::get(format!("/artists/{artist_id}/top-tracks")).query("market", "from_token"),
        "Failed to fetch artist top tracks",
    );
    dispatch(&state.spotify, &session, op).await
}

pub async fn album(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    Path(album_id): Path<String>,
) -> ApiResult {
    let album_id = resource_id(album_id)?;
    let op = Operation::fetch(
        UpstreamRequest::get(format!("/albums/{album_id}")).query("market", "from_token"),
        "Failed to fetch album",
    );
    dispatch(&state.spotify, &session, op).await
}

// Spotify ids are base62; anything else would let the caller steer the path.
fn resource_id(raw: String) -> Result<String, ApiError> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(raw)
    } else {
        Err(ApiError::BadRequest("Invalid id".to_string()))
    }
}
