use std::{
    collections::HashMap,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::StoreError,
    types::{CredentialRecord, Handshake},
};

/// Opaque identifier the browser presents in its session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        SessionId(Uuid::new_v4().to_string())
    }

    /// Accepts only identifiers this relay could have issued.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(|id| SessionId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Idle lifetime of a session holding credentials.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Idle lifetime of a session without credentials, typically one that
/// started a login and never came back.
pub const DEFAULT_LOGIN_TTL: Duration = Duration::from_secs(10 * 60);

/// Per-session credential storage.
///
/// Implementations must scope records to their session id; one session can
/// never observe another session's record.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &SessionId) -> Result<Option<CredentialRecord>, StoreError>;

    async fn put(&self, id: &SessionId, record: CredentialRecord) -> Result<(), StoreError>;

    async fn clear(&self, id: &SessionId) -> Result<(), StoreError>;

    /// Atomically removes the pending handshake from the session's record.
    ///
    /// Of two concurrent calls for the same session at most one receives the
    /// handshake.
    async fn take_handshake(&self, id: &SessionId) -> Result<Option<Handshake>, StoreError>;
}

#[derive(Debug, Clone)]
struct Entry {
    record: CredentialRecord,
    touched: Instant,
}

/// In-process store with idle expiry.
///
/// Records with an access token live for `session_ttl` after their last use,
/// all others for `login_ttl`. Expired records are dropped on access and swept
/// on every write.
#[derive(Debug, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Entry>>>,
    session_ttl: Duration,
    login_ttl: Duration,
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::with_ttl(DEFAULT_SESSION_TTL, DEFAULT_LOGIN_TTL)
    }
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(session_ttl: Duration, login_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ttl,
            login_ttl,
        }
    }

    /// Number of records held, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn is_live(&self, entry: &Entry, now: Instant) -> bool {
        let ttl = if entry.record.access_token.is_some() {
            self.session_ttl
        } else {
            self.login_ttl
        };
        now.duration_since(entry.touched) < ttl
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, id: &SessionId) -> Result<Option<CredentialRecord>, StoreError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        let live = match sessions.get(id) {
            Some(entry) => self.is_live(entry, now),
            None => return Ok(None),
        };
        if !live {
            sessions.remove(id);
            return Ok(None);
        }

        Ok(sessions.get_mut(id).map(|entry| {
            entry.touched = now;
            entry.record.clone()
        }))
    }

    async fn put(&self, id: &SessionId, record: CredentialRecord) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        sessions.retain(|_, entry| self.is_live(entry, now));
        sessions.insert(
            id.clone(),
            Entry {
                record,
                touched: now,
            },
        );
        Ok(())
    }

    async fn clear(&self, id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn take_handshake(&self, id: &SessionId) -> Result<Option<Handshake>, StoreError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;

        match sessions.get_mut(id) {
            Some(entry) if self.is_live(entry, now) => {
                entry.touched = now;
                Ok(entry.record.take_handshake())
            }
            _ => Ok(None),
        }
    }
}
