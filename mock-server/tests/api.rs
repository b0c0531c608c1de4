use std::sync::Arc;

use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, AppState, Issue, RATE_LIMIT, SEEDED_ISSUES};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<String> {
    Request::builder()
        .uri(uri)
        .header(http::header::HOST, "api.test")
        .body(String::new())
        .unwrap()
}

fn header<'a>(response: &'a axum::response::Response, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

// --- issues ---

#[tokio::test]
async fn list_issues_default_page_returns_everything() {
    let resp = app().oneshot(get("/repos/o/r/issues")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "x-ratelimit-limit"), Some("60"));
    assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("59"));
    assert!(header(&resp, "link").is_none());
    assert!(header(&resp, "x-github-request-id").is_some());
    let issues: Vec<Issue> = body_json(resp).await;
    assert_eq!(issues.len() as u32, SEEDED_ISSUES);
}

#[tokio::test]
async fn list_issues_first_page_links_forward() {
    let resp = app()
        .oneshot(get("/repos/o/r/issues?page=1&per_page=10"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        header(&resp, "link"),
        Some(
            "<http://api.test/repos/o/r/issues?page=2&per_page=10>; rel=\"next\", \
             <http://api.test/repos/o/r/issues?page=3&per_page=10>; rel=\"last\""
        )
    );
    let issues: Vec<Issue> = body_json(resp).await;
    assert_eq!(issues.len(), 10);
    assert_eq!(issues[0].number, 1);
}

#[tokio::test]
async fn list_issues_last_page_is_partial() {
    let resp = app()
        .oneshot(get("/repos/o/r/issues?page=3&per_page=10"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let link = header(&resp, "link").unwrap().to_string();
    assert!(link.contains("rel=\"first\""));
    assert!(link.contains("rel=\"prev\""));
    assert!(!link.contains("rel=\"next\""));
    let issues: Vec<Issue> = body_json(resp).await;
    assert_eq!(issues.len(), 5);
    assert_eq!(issues[0].number, 21);
}

#[tokio::test]
async fn list_issues_past_the_end_is_empty() {
    let resp = app()
        .oneshot(get("/repos/o/r/issues?page=9&per_page=10"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let issues: Vec<Issue> = body_json(resp).await;
    assert!(issues.is_empty());
}

#[tokio::test]
async fn list_issues_bad_page_returns_400() {
    let resp = app()
        .oneshot(get("/repos/o/r/issues?page=abc"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- user ---

#[tokio::test]
async fn user_without_token_returns_401() {
    let resp = app().oneshot(get("/user")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "Requires authentication");
}

#[tokio::test]
async fn user_with_bearer_token() {
    let req = Request::builder()
        .uri("/user")
        .header(http::header::AUTHORIZATION, "Bearer abc")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["login"], "octocat");
}

#[tokio::test]
async fn user_with_query_token() {
    let resp = app().oneshot(get("/user?access_token=abc")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- legacy ---

#[tokio::test]
async fn legacy_has_no_rate_limit_headers() {
    let resp = app().oneshot(get("/legacy")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert!(header(&resp, "x-ratelimit-limit").is_none());
    assert!(header(&resp, "x-ratelimit-remaining").is_none());
}

// --- rate limit ---

#[tokio::test]
async fn rate_limit_exhaustion_returns_403() {
    let state = Arc::new(AppState::seeded());
    let app = app_with_state(state.clone());

    for _ in 0..RATE_LIMIT {
        let resp = app.clone().oneshot(get("/repos/o/r/issues")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }
    assert_eq!(state.request_count(), RATE_LIMIT);

    let resp = app.clone().oneshot(get("/repos/o/r/issues")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("0"));

    let resp = app.oneshot(get("/rate_limit")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["rate"]["remaining"], 0);
}
