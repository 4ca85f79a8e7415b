//! # Spotify Integration Module
//!
//! This module is the relay's only point of contact with Spotify. It covers the
//! accounts service (authorization and token endpoints) and the versioned Web
//! API that the proxied operations call.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers (api)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authorization flow (PKCE login, code exchange, refresh grant)
//!     └── Authenticated request gate (bearer attach, token policy)
//!          ↓
//! Session store (management)
//! ```
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - OAuth 2.0 authorization code flow with PKCE:
//! - **Login start**: verifier, S256 challenge and `state` stored per session
//! - **Callback**: single-use verifier, code-for-token exchange
//! - **Refresh grant**: exchanges a stored refresh token for a new access token
//!
//! ### Client Module
//!
//! [`client`] - The gate every protected call goes through:
//! - **Presence check**: no access token means `401 Unauthorized` and no upstream call
//! - **Token policy**: passthrough, reactive refresh on 401, or proactive refresh
//! - **Transport errors**: reported separately from upstream error statuses
//!
//! ## Timeouts
//!
//! All requests share one [`reqwest::Client`] built by [`http_client`] with a
//! bounded timeout. A request that times out is reported as unreachable.

pub mod auth;
pub mod client;

use reqwest::Client;

use crate::config::Settings;

pub use auth::AuthFlow;
pub use client::{SpotifyClient, UpstreamRequest, UpstreamResponse};

/// Builds the HTTP client shared by the flow controller, refresher and gate.
///
/// # Errors
///
/// Fails if the TLS backend cannot be initialised.
pub fn http_client(settings: &Settings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(settings.upstream_timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}
