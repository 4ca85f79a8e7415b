//! GoatMusic Relay Library
//!
//! A backend relay between a browser and the Spotify Web API. It performs the
//! OAuth 2.0 authorization code flow with PKCE, keeps the resulting credentials
//! in a server-side session, and forwards authenticated calls to Spotify with a
//! uniform JSON response shape.
//!
//! # Modules
//!
//! - `api` - HTTP endpoints and the session/authorization middleware
//! - `config` - Configuration management and environment variables
//! - `error` - Typed errors and their HTTP mapping
//! - `management` - Session store and token refresher
//! - `server` - Router assembly and the HTTP server
//! - `spotify` - PKCE flow controller and the authenticated request gate
//! - `types` - Data structures and type definitions
//! - `utils` - PKCE verifier, challenge and state generation
//!
//! # Example
//!
//! ```
//! use goatmusic::{config::{self, Settings}, server};
//!
//! #[tokio::main]
//! async fn main() -> goatmusic::Res<()> {
//!     config::load_env().await?;
//!     let state = server::AppState::in_memory(Settings::from_env()?)?;
//!     server::start_api_server(state).await
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod management;
pub mod server;
pub mod spotify;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Used at the binary and server edges where errors of different kinds are
/// only reported, never matched on. Library operations return their own typed
/// errors from [`error`].
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Listening on {}", addr);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Only for unrecoverable startup failures in the binary; request handling
/// never calls this.
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
///
/// Used for recoverable failures such as a rejected token exchange or a
/// refresh that did not go through.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    eprintln!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
