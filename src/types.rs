use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Successful reply of the provider's token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// The verifier and `state` token of a login that is waiting for its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub verifier: String,
    pub state: Option<String>,
}

/// Credentials held server-side for one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub issued_at: Option<DateTime<Utc>>,
    pub expires_in_seconds: Option<u64>,
    pub pending_verifier: Option<String>,
    pub pending_state: Option<String>,
}

impl CredentialRecord {
    /// Starts a new handshake, abandoning any earlier one.
    pub fn begin_handshake(&mut self, verifier: String, state: String) {
        self.pending_verifier = Some(verifier);
        self.pending_state = Some(state);
    }

    /// Removes and returns the pending handshake, if one was started.
    pub fn take_handshake(&mut self) -> Option<Handshake> {
        let verifier = self.pending_verifier.take()?;
        Some(Handshake {
            verifier,
            state: self.pending_state.take(),
        })
    }

    /// Stores a freshly issued token. The refresh token is only replaced when
    /// the provider sends a new one.
    pub fn apply_token(&mut self, token: &Token, now: DateTime<Utc>) {
        self.access_token = Some(token.access_token.clone());
        if let Some(refresh) = &token.refresh_token {
            self.refresh_token = Some(refresh.clone());
        }
        self.issued_at = Some(now);
        self.expires_in_seconds = Some(token.expires_in);
    }

    /// `None` without expiry metadata or when the instant is out of range.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let issued_at = self.issued_at?;
        let secs = i64::try_from(self.expires_in_seconds?).ok()?;
        issued_at.checked_add_signed(TimeDelta::try_seconds(secs)?)
    }

    /// True when the token expires within `skew` of `now`. Records without
    /// expiry metadata, or with an expiry too far out to represent, are never
    /// considered stale.
    pub fn is_stale(&self, now: DateTime<Utc>, skew: std::time::Duration) -> bool {
        let Some(expires_at) = self.expires_at() else {
            return false;
        };
        match TimeDelta::from_std(skew).ok().and_then(|skew| now.checked_add_signed(skew)) {
            Some(horizon) => horizon >= expires_at,
            // a skew past the end of time covers every expiry
            None => true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CredentialRecord::default()
    }
}

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayRequest {
    pub uri: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VolumeRequest {
    pub volume: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShuffleRequest {
    pub state: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepeatRequest {
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatState {
    Off,
    Track,
    Context,
}

impl RepeatState {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "off" => Some(RepeatState::Off),
            "track" => Some(RepeatState::Track),
            "context" => Some(RepeatState::Context),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RepeatState::Off => "off",
            RepeatState::Track => "track",
            RepeatState::Context => "context",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SavedTracksResponse {
    #[serde(default)]
    pub items: Vec<SavedTrack>,
}

impl SavedTracksResponse {
    /// Ids of the saved tracks, skipping local files that carry none.
    pub fn track_ids(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.track.as_ref().and_then(|t| t.id.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SavedTrack {
    pub track: Option<TrackRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackRef {
    pub id: Option<String>,
}
