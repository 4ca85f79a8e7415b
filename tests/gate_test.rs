mod support;

use goatmusic::{
    config::TokenPolicy,
    error::AuthError,
    management::SessionId,
    server::AppState,
    spotify::UpstreamRequest,
};
use reqwest::StatusCode;
use serde_json::json;
use support::{Harness, token_body};
use wiremock::{
    Mock, ResponseTemplate,
    matchers::{any, header, method, path, query_param},
};

#[tokio::test]
async fn test_authorize_requires_access_token() {
    let h = Harness::start(TokenPolicy::Reactive).await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.provider)
        .await;

    let session = SessionId::generate();
    let err = h.state.spotify.authorize(&session).await.unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));

    let err = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me"))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Unauthorized));
}

#[tokio::test]
async fn test_forward_attaches_bearer_token() {
    let h = Harness::start(TokenPolicy::Reactive).await;
    Mock::given(method("GET"))
        .and(path("/v1/me/tracks"))
        .and(header("authorization", "Bearer access-1"))
        .and(query_param("limit", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(1)
        .mount(&h.provider)
        .await;

    let session = h.authenticated_session().await;
    let response = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me/tracks").query("limit", 50))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, Some(json!({ "items": [] })));
}

#[tokio::test]
async fn test_forward_returns_upstream_error_status() {
    let h = Harness::start(TokenPolicy::Reactive).await;
    Mock::given(method("PUT"))
        .and(path("/v1/me/player/pause"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": { "status": 404, "message": "Player command failed: No active device found" } })),
        )
        .mount(&h.provider)
        .await;

    let session = h.authenticated_session().await;
    let response = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::put("/me/player/pause"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(!response.is_success());
}

#[tokio::test]
async fn test_reactive_policy_refreshes_once_on_401() {
    let h = Harness::start(TokenPolicy::Reactive).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", None)))
        .expect(1)
        .mount(&h.provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "goat" })))
        .expect(1)
        .mount(&h.provider)
        .await;

    let session = h.authenticated_session().await;
    let response = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        h.record(&session).await.unwrap().access_token.as_deref(),
        Some("access-2")
    );
}

#[tokio::test]
async fn test_passthrough_policy_returns_401() {
    let h = Harness::start(TokenPolicy::Passthrough).await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&h.provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", None)))
        .expect(0)
        .mount(&h.provider)
        .await;

    // an expired token is still sent as-is
    let session = h.expired_session().await;
    let response = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_proactive_policy_refreshes_before_calling() {
    let h = Harness::start(TokenPolicy::Proactive).await;
    Mock::given(method("POST"))
        .and(path("/api/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", None)))
        .expect(1)
        .mount(&h.provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/me"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "goat" })))
        .expect(1)
        .mount(&h.provider)
        .await;

    let session = h.expired_session().await;
    let response = h
        .state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me"))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_unreachable_upstream() {
    let h = Harness::start(TokenPolicy::Reactive).await;
    let mut settings = (*h.state.settings).clone();
    settings.api_url = "http://127.0.0.1:1/v1".to_string();
    let state = AppState::new(settings, h.store.clone()).unwrap();

    let session = h.authenticated_session().await;
    let err = state
        .spotify
        .forward(&session, &UpstreamRequest::get("/me"))
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::UpstreamUnreachable(_)));
}
