//! Configuration management for the GoatMusic relay.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. Values are collected once into a [`Settings`]
//! instance which is then handed to every component that needs it.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. `.env` file in the working directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    error::ConfigError,
    management::{DEFAULT_LOGIN_TTL, DEFAULT_SESSION_TTL},
};

pub const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:5000/callback";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:5000";
pub const SESSION_COOKIE: &str = "goatmusic_session";

/// Permission scopes needed by the proxied player and library operations.
pub const DEFAULT_SCOPES: [&str; 11] = [
    "user-read-private",
    "user-read-email",
    "user-read-playback-state",
    "user-modify-playback-state",
    "user-read-currently-playing",
    "user-read-recently-played",
    "user-top-read",
    "playlist-read-private",
    "playlist-read-collaborative",
    "playlist-modify-public",
    "playlist-modify-private",
];

/// How the authenticated request gate treats token expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPolicy {
    /// Presence check only; an upstream 401 is returned to the browser as-is.
    Passthrough,
    /// Presence check only; an upstream 401 triggers one refresh and one retry.
    Reactive,
    /// Compare the stored expiry with the clock and refresh before calling.
    Proactive,
}

impl FromStr for TokenPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "passthrough" => Ok(TokenPolicy::Passthrough),
            "reactive" => Ok(TokenPolicy::Reactive),
            "proactive" => Ok(TokenPolicy::Proactive),
            other => Err(ConfigError::Invalid {
                name: "GOATMUSIC_TOKEN_POLICY",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for TokenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenPolicy::Passthrough => "passthrough",
            TokenPolicy::Reactive => "reactive",
            TokenPolicy::Proactive => "proactive",
        };
        f.write_str(name)
    }
}

/// Runtime settings shared by the flow controller, refresher, gate and server.
#[derive(Debug, Clone)]
pub struct Settings {
    pub client_id: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub scopes: Vec<String>,
    pub server_address: String,
    pub token_policy: TokenPolicy,
    pub refresh_skew: Duration,
    pub upstream_timeout: Duration,
    pub secure_cookie: bool,
    pub verifier_length: usize,
    pub post_login_redirect: String,
    pub post_logout_redirect: String,
    pub session_ttl: Duration,
    pub login_ttl: Duration,
}

impl Settings {
    /// Settings with the public Spotify endpoints and default relay options.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            token_policy: TokenPolicy::Reactive,
            refresh_skew: Duration::from_secs(60),
            upstream_timeout: Duration::from_secs(10),
            secure_cookie: false,
            verifier_length: 128,
            post_login_redirect: "/dashboard".to_string(),
            post_logout_redirect: "/".to_string(),
            session_ttl: DEFAULT_SESSION_TTL,
            login_ttl: DEFAULT_LOGIN_TTL,
        }
    }

    /// Builds settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `SPOTIFY_API_AUTH_CLIENT_ID` is unset
    /// and [`ConfigError::Invalid`] when a numeric, boolean or policy variable
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Settings::new(spotify_client_id()?);

        if let Some(v) = optional("SPOTIFY_API_REDIRECT_URI") {
            settings.redirect_uri = v;
        }
        if let Some(v) = optional("SPOTIFY_API_AUTH_URL") {
            settings.auth_url = v;
        }
        if let Some(v) = optional("SPOTIFY_API_TOKEN_URL") {
            settings.token_url = v;
        }
        if let Some(v) = optional("SPOTIFY_API_URL") {
            settings.api_url = v;
        }
        if let Some(v) = optional("SPOTIFY_API_AUTH_SCOPE") {
            settings.scopes = v.split_whitespace().map(str::to_string).collect();
        }
        if let Some(v) = optional("SERVER_ADDRESS") {
            settings.server_address = v;
        }
        if let Some(v) = optional("GOATMUSIC_TOKEN_POLICY") {
            settings.token_policy = v.parse()?;
        }
        if let Some(secs) = parsed::<u64>("GOATMUSIC_REFRESH_SKEW_SECS")? {
            settings.refresh_skew = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>("GOATMUSIC_UPSTREAM_TIMEOUT_SECS")? {
            settings.upstream_timeout = Duration::from_secs(secs);
        }
        if let Some(secure) = parsed::<bool>("GOATMUSIC_SECURE_COOKIE")? {
            settings.secure_cookie = secure;
        }
        if let Some(length) = parsed::<usize>("GOATMUSIC_VERIFIER_LENGTH")? {
            settings.verifier_length = length;
        }
        if let Some(secs) = parsed::<u64>("GOATMUSIC_SESSION_TTL_SECS")? {
            settings.session_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parsed::<u64>("GOATMUSIC_LOGIN_TTL_SECS")? {
            settings.login_ttl = Duration::from_secs(secs);
        }

        Ok(settings)
    }

    /// Points the authorization, token and resource endpoints at one base URL.
    ///
    /// Used to aim the relay at a local stand-in for the provider.
    pub fn with_provider_base(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.auth_url = format!("{base}/authorize");
        self.token_url = format!("{base}/api/token");
        self.api_url = format!("{base}/v1");
        self
    }

    pub fn scope(&self) -> String {
        self.scopes.join(" ")
    }
}

/// Loads environment variables from `.env` files.
///
/// Looks first in the platform-specific local data directory under
/// `goatmusic/.env` (creating the directory if needed), then in the working
/// directory. Missing files are skipped; variables already present in the
/// process environment are never overwritten.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/goatmusic/.env`
/// - macOS: `~/Library/Application Support/goatmusic/.env`
/// - Windows: `%LOCALAPPDATA%/goatmusic/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created.
pub async fn load_env() -> Result<(), ConfigError> {
    let path = env_path();
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    if path.is_file() {
        let _ = dotenv::from_path(&path);
    }
    let _ = dotenv::dotenv();
    Ok(())
}

pub fn env_path() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("goatmusic/.env");
    path
}

/// Returns the Spotify API client ID registered for this relay.
///
/// # Errors
///
/// Fails if `SPOTIFY_API_AUTH_CLIENT_ID` is unset or empty.
pub fn spotify_client_id() -> Result<String, ConfigError> {
    optional("SPOTIFY_API_AUTH_CLIENT_ID").ok_or(ConfigError::Missing("SPOTIFY_API_AUTH_CLIENT_ID"))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match optional(name) {
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}
