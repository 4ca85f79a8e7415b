mod auth;
mod session;

pub use auth::TokenRefresher;
pub use session::MemorySessionStore;
pub use session::SessionId;
pub use session::SessionStore;
pub use session::{DEFAULT_LOGIN_TTL, DEFAULT_SESSION_TTL};
