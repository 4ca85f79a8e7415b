use std::sync::Arc;

use chrono::Utc;
use reqwest::Client;
use url::Url;

use crate::{
    config::Settings,
    error::AuthError,
    management::{SessionId, SessionStore},
    success,
    types::{CallbackParams, Token},
    utils, warning,
};

/// Drives the PKCE login handshake for browser sessions.
///
/// The controller moves a session through three states:
///
/// ```text
/// Unauthenticated --begin_login--> PendingAuthorization --handle_callback--> Authenticated
/// ```
///
/// The pending verifier and `state` token are kept in the session record
/// between the two steps and are single-use: any callback that reaches the
/// verifier consumes it, whether the exchange succeeds or not. The session id
/// is replaced once the session holds credentials.
#[derive(Clone)]
pub struct AuthFlow {
    settings: Arc<Settings>,
    store: Arc<dyn SessionStore>,
    client: Client,
}

impl AuthFlow {
    pub fn new(settings: Arc<Settings>, store: Arc<dyn SessionStore>, client: Client) -> Self {
        Self {
            settings,
            store,
            client,
        }
    }

    /// Starts a login for `session` and returns the provider URL to redirect to.
    ///
    /// Generates a fresh verifier, challenge and anti-forgery `state`, then
    /// stores the verifier and state in the session record. A handshake that
    /// was already pending for the session is overwritten.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidParameter`] if the configured verifier length is
    ///   outside 43..=128 or the authorization endpoint is not a valid URL
    /// - [`AuthError::Store`] if the session record cannot be written
    pub async fn begin_login(&self, session: &SessionId) -> Result<String, AuthError> {
        let code_verifier = utils::generate_code_verifier(self.settings.verifier_length)?;
        let code_challenge = utils::generate_code_challenge(&code_verifier);
        let state = utils::generate_state();

        let auth_url = self.authorization_url(&code_challenge, &state)?;

        let mut record = self.store.get(session).await?.unwrap_or_default();
        record.begin_handshake(code_verifier, state);
        self.store.put(session, record).await?;

        Ok(auth_url)
    }

    /// Builds the authorization endpoint URL for a challenge and state token.
    pub fn authorization_url(&self, code_challenge: &str, state: &str) -> Result<String, AuthError> {
        let scope = self.settings.scope();
        let url = Url::parse_with_params(
            &self.settings.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.settings.client_id.as_str()),
                ("scope", scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", code_challenge),
                ("redirect_uri", self.settings.redirect_uri.as_str()),
                ("state", state),
            ],
        )
        .map_err(|e| AuthError::InvalidParameter(format!("authorization endpoint: {e}")))?;

        Ok(url.into())
    }

    /// Completes the handshake with the parameters the provider redirected with.
    ///
    /// Checks run in order and stop at the first failure:
    /// 1. a non-empty `error` parameter fails with [`AuthError::AuthorizationDenied`]
    /// 2. a missing `code` fails with [`AuthError::MissingAuthorizationCode`]
    /// 3. no pending verifier fails with [`AuthError::MissingVerifier`]
    /// 4. a `state` that differs from the pending one fails with
    ///    [`AuthError::StateMismatch`]
    /// 5. the code and verifier are exchanged at the token endpoint
    ///
    /// Steps 1 and 2 leave the record untouched and never reach the network.
    /// Step 3 takes the pending handshake out of the store atomically, so the
    /// verifier is gone before any exchange starts and a concurrent callback
    /// for the same session fails with `MissingVerifier`.
    ///
    /// On success the credentials move to a newly generated session id, which
    /// is returned, and the old id is cleared. A session that was cleared while
    /// the exchange was in flight stays cleared and the call fails with
    /// [`AuthError::Unauthorized`].
    pub async fn handle_callback(
        &self,
        session: &SessionId,
        params: &CallbackParams,
    ) -> Result<SessionId, AuthError> {
        if let Some(error) = params.error.as_deref().filter(|e| !e.is_empty()) {
            return Err(AuthError::AuthorizationDenied(error.to_string()));
        }

        let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
            return Err(AuthError::MissingAuthorizationCode);
        };

        let Some(handshake) = self.store.take_handshake(session).await? else {
            return Err(AuthError::MissingVerifier);
        };

        if let Some(expected) = &handshake.state {
            if params.state.as_deref() != Some(expected.as_str()) {
                return Err(AuthError::StateMismatch);
            }
        }

        let token =
            match exchange_code_pkce(&self.client, &self.settings, code, &handshake.verifier).await
            {
                Ok(token) => token,
                Err(e) => {
                    warning!("Token exchange failed: {}", e);
                    return Err(e);
                }
            };

        let Some(mut record) = self.store.get(session).await? else {
            return Err(AuthError::Unauthorized);
        };
        record.apply_token(&token, Utc::now());

        let authenticated = SessionId::generate();
        self.store.put(&authenticated, record).await?;
        self.store.clear(session).await?;

        success!("Session {} authenticated", authenticated);
        Ok(authenticated)
    }
}

/// Exchanges an authorization code and its PKCE verifier for tokens.
///
/// Posts a form-encoded `authorization_code` grant to the token endpoint.
///
/// # Errors
///
/// - [`AuthError::UpstreamUnreachable`] on transport failure or timeout
/// - [`AuthError::TokenExchangeFailed`] on a non-2xx reply or a reply that is
///   not a token document
pub async fn exchange_code_pkce(
    client: &Client,
    settings: &Settings,
    code: &str,
    verifier: &str,
) -> Result<Token, AuthError> {
    let res = client
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", settings.client_id.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", settings.redirect_uri.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError::UpstreamUnreachable(e.to_string()))?;

    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|e| AuthError::UpstreamUnreachable(e.to_string()))?;

    if !status.is_success() {
        return Err(AuthError::TokenExchangeFailed {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str::<Token>(&body).map_err(|e| AuthError::TokenExchangeFailed {
        status: status.as_u16(),
        body: format!("malformed token response: {e}"),
    })
}

/// Trades a refresh token for a new access token.
///
/// # Errors
///
/// - [`AuthError::UpstreamUnreachable`] on transport failure or timeout
/// - [`AuthError::RefreshFailed`] carrying the upstream status on a non-2xx
///   reply, or `502` when the reply cannot be read as a token
pub async fn refresh_token(
    client: &Client,
    settings: &Settings,
    refresh_token: &str,
) -> Result<Token, AuthError> {
    let res = client
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", settings.client_id.as_str()),
        ])
        .send()
        .await
        .map_err(|e| AuthError::UpstreamUnreachable(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
        return Err(AuthError::RefreshFailed {
            status: status.as_u16(),
        });
    }

    res.json::<Token>()
        .await
        .map_err(|_| AuthError::RefreshFailed { status: 502 })
}
