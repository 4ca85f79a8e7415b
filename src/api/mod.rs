//! # API Module
//!
//! HTTP endpoints exposed to the browser. The module covers the login
//! handshake, session lifecycle, token refresh and the proxied Spotify
//! operations.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Starts the PKCE flow and answers `302` to the provider
//! - [`callback`] - Completes the flow and answers `302` to the dashboard, or
//!   a plain-text error
//! - [`logout`] - Drops the session's credentials and answers `302`
//! - [`refresh_token`] - Refreshes the access token on demand
//!
//! ### Proxied Operations
//!
//! Player, library and catalog endpoints under `/api`. All of them sit behind
//! [`require_access`], which answers `401 {"error": "Unauthorized"}` for
//! sessions without an access token, and forward through
//! [`proxy::dispatch`].
//!
//! ### Monitoring
//!
//! - [`health`] - Status and version for monitoring systems
//!
//! ## Sessions
//!
//! [`session_layer`] wraps every route. It reads the `goatmusic_session`
//! cookie, issues a new id on first contact, and hands the id to handlers
//! as an `Extension<SessionId>`.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use goatmusic::{config::Settings, server::{AppState, router}};
//!
//! let state = AppState::in_memory(Settings::new("client-id"))?;
//! let app = router(state);
//! ```

mod callback;
mod health;
mod library;
mod login;
mod player;
pub mod proxy;
mod refresh;
mod session;

pub use callback::callback;
pub use health::health;
pub use library::{
    album, artist, artist_top_tracks, liked_tracks, playlist, playlists, profile, recommendations,
    search,
};
pub use login::{login, logout};
pub use player::{
    currently_playing, next, pause, play, player_state, previous, recently_played, repeat, shuffle,
    volume,
};
pub use refresh::refresh_token;
pub use session::{require_access, session_layer};
