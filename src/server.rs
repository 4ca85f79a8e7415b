use std::{net::SocketAddr, str::FromStr, sync::Arc};

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::{
    Res, api,
    config::Settings,
    info,
    management::{MemorySessionStore, SessionStore, TokenRefresher},
    spotify::{self, AuthFlow, SpotifyClient},
};

/// Components shared by all handlers, wired around one session store.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: Arc<dyn SessionStore>,
    pub flow: AuthFlow,
    pub refresher: TokenRefresher,
    pub spotify: SpotifyClient,
}

impl AppState {
    pub fn new(settings: Settings, store: Arc<dyn SessionStore>) -> Result<Self, reqwest::Error> {
        let settings = Arc::new(settings);
        let http = spotify::http_client(&settings)?;

        let flow = AuthFlow::new(Arc::clone(&settings), Arc::clone(&store), http.clone());
        let refresher = TokenRefresher::new(Arc::clone(&settings), Arc::clone(&store), http.clone());
        let spotify = SpotifyClient::new(
            Arc::clone(&settings),
            Arc::clone(&store),
            refresher.clone(),
            http,
        );

        Ok(Self {
            settings,
            store,
            flow,
            refresher,
            spotify,
        })
    }

    /// State backed by a [`MemorySessionStore`] with the configured lifetimes.
    pub fn in_memory(settings: Settings) -> Result<Self, reqwest::Error> {
        let store = MemorySessionStore::with_ttl(settings.session_ttl, settings.login_ttl);
        Self::new(settings, Arc::new(store))
    }
}

pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/profile", get(api::profile))
        .route("/api/playlists", get(api::playlists))
        .route("/api/search", get(api::search))
        .route("/api/currently-playing", get(api::currently_playing))
        .route("/api/play", put(api::play))
        .route("/api/pause", put(api::pause))
        .route("/api/next", post(api::next))
        .route("/api/previous", post(api::previous))
        .route("/api/recently-played", get(api::recently_played))
        .route("/api/liked-tracks", get(api::liked_tracks))
        .route("/api/recommendations", get(api::recommendations))
        .route("/api/playlist/{playlist_id}", get(api::playlist))
        .route("/api/artist/{artist_id}", get(api::artist))
        .route("/api/artist/{artist_id}/top-tracks", get(api::artist_top_tracks))
        .route("/api/album/{album_id}", get(api::album))
        .route("/api/volume", put(api::volume))
        .route("/api/shuffle", put(api::shuffle))
        .route("/api/repeat", put(api::repeat))
        .route("/api/player-state", get(api::player_state))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::require_access,
        ));

    Router::new()
        .route("/health", get(api::health))
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/logout", get(api::logout))
        .route("/api/refresh-token", get(api::refresh_token))
        .merge(protected)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_layer,
        ))
        .with_state(state)
}

pub async fn start_api_server(state: AppState) -> Res<()> {
    let addr = SocketAddr::from_str(&state.settings.server_address)?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        "Listening on http://{} (token policy: {})",
        addr, state.settings.token_policy
    );

    axum::serve(listener, router(state)).await?;
    Ok(())
}
