use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;

use crate::{
    config::Settings,
    error::AuthError,
    management::{SessionId, SessionStore},
    spotify, warning,
};

#[derive(Clone)]
pub struct TokenRefresher {
    settings: Arc<Settings>,
    store: Arc<dyn SessionStore>,
    client: Client,
}

impl TokenRefresher {
    pub fn new(settings: Arc<Settings>, store: Arc<dyn SessionStore>, client: Client) -> Self {
        TokenRefresher {
            settings,
            store,
            client,
        }
    }

    /// Replaces the session's access token using its refresh token and
    /// returns the new access token.
    ///
    /// The record is only written after the provider answered with a token,
    /// and the update is applied to the record as it is at that moment so a
    /// concurrent write is not rolled back. A session cleared while the
    /// refresh was in flight stays cleared.
    pub async fn refresh(&self, session: &SessionId) -> Result<String, AuthError> {
        let record = self.store.get(session).await?.unwrap_or_default();
        let Some(refresh_token) = record.refresh_token else {
            return Err(AuthError::NoRefreshToken);
        };

        let token = spotify::auth::refresh_token(&self.client, &self.settings, &refresh_token).await?;

        let Some(mut latest) = self.store.get(session).await? else {
            return Err(AuthError::Unauthorized);
        };
        latest.apply_token(&token, Utc::now());
        self.store.put(session, latest).await?;

        Ok(token.access_token)
    }

    /// Returns an access token for the session, refreshing first when the
    /// stored one expires within the configured skew.
    ///
    /// A failed refresh is not fatal here: the stored token is returned and
    /// the upstream decides whether it is still accepted.
    pub async fn get_valid_token(&self, session: &SessionId) -> Result<String, AuthError> {
        let record = self.store.get(session).await?.unwrap_or_default();
        let Some(access_token) = record.access_token.clone() else {
            return Err(AuthError::Unauthorized);
        };

        if record.refresh_token.is_some() && record.is_stale(Utc::now(), self.settings.refresh_skew)
        {
            match self.refresh(session).await {
                Ok(fresh) => return Ok(fresh),
                Err(e) => warning!("Proactive token refresh failed: {}", e),
            }
        }

        Ok(access_token)
    }
}
