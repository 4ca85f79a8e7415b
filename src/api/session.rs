use axum::{
    Extension,
    extract::{Request, State},
    http::{
        StatusCode,
        header::{LOCATION, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    config::SESSION_COOKIE,
    error::ApiError,
    management::SessionId,
    server::AppState,
};

/// Resolves the browser's session id from its cookie, issuing a new one on
/// first contact. Handlers read it as `Extension<SessionId>`.
pub async fn session_layer(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()));

    let (session, issued) = match existing {
        Some(session) => (session, false),
        None => (SessionId::generate(), true),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    // the handler may already have moved the session to a new id
    if !issued || sets_session_cookie(&response) {
        return response;
    }

    (jar.add(session_cookie(&session, state.settings.secure_cookie)), response).into_response()
}

/// The cookie carrying `session` to the browser.
pub fn session_cookie(session: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{SESSION_COOKIE}=");
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .any(|value| value.starts_with(&prefix))
}

/// Rejects protected calls from sessions without an access token before the
/// handler runs, so no upstream request is made for them. Expiry is left to
/// the gate in the handler so a stale token is refreshed at most once.
pub async fn require_access(
    State(state): State<AppState>,
    Extension(session): Extension<SessionId>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.spotify.check_access(&session).await?;
    Ok(next.run(request).await)
}

/// `302 Found` to `location`.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.to_string())]).into_response()
}
