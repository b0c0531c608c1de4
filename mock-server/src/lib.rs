//! In-process imitation of the paged, rate-limited REST API.
//!
//! Serves issue listings with `Link` pagination and `X-RateLimit-*` headers,
//! a `/user` endpoint that needs a token, and a `/legacy` endpoint that
//! omits the rate-limit headers. Every request counts against the shared
//! rate limit so tests can tell network calls from cache hits.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

pub const RATE_LIMIT: u32 = 60;
pub const DEFAULT_PER_PAGE: u32 = 30;
pub const SEEDED_ISSUES: u32 = 25;

const RATE_LIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const REQUEST_ID: HeaderName = HeaderName::from_static("x-github-request-id");

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Issue {
    pub number: u32,
    pub title: String,
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub access_token: Option<String>,
}

#[derive(Debug)]
pub struct AppState {
    issues: Vec<Issue>,
    requests: AtomicU32,
}

impl AppState {
    pub fn seeded() -> Self {
        let issues = (1..=SEEDED_ISSUES)
            .map(|number| Issue {
                number,
                title: format!("Issue #{number}"),
                state: if number % 3 == 0 { "closed" } else { "open" }.to_string(),
            })
            .collect();
        Self {
            issues,
            requests: AtomicU32::new(0),
        }
    }

    /// Requests served so far.
    pub fn request_count(&self) -> u32 {
        self.requests.load(Ordering::SeqCst)
    }

    /// Count one request and return the remaining quota, or `None` when
    /// the limit is exhausted.
    fn consume(&self) -> Option<u32> {
        let used = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        RATE_LIMIT.checked_sub(used)
    }
}

pub type Db = Arc<AppState>;

pub fn app() -> Router {
    app_with_state(Arc::new(AppState::seeded()))
}

pub fn app_with_state(state: Db) -> Router {
    Router::new()
        .route("/repos/{owner}/{repo}/issues", get(list_issues))
        .route("/user", get(current_user))
        .route("/rate_limit", get(rate_limit))
        .route("/legacy", get(legacy))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

fn rate_limit_headers(remaining: u32) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(RATE_LIMIT_LIMIT, HeaderValue::from(RATE_LIMIT));
    headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(remaining));
    if let Ok(id) = HeaderValue::from_str(&Uuid::new_v4().to_string()) {
        headers.insert(REQUEST_ID, id);
    }
    headers
}

fn error_body(status: StatusCode, message: &str, headers: HeaderMap) -> Response {
    (status, headers, Json(json!({ "message": message }))).into_response()
}

fn rate_limited(db: &AppState) -> Result<u32, Response> {
    db.consume().ok_or_else(|| {
        error_body(
            StatusCode::FORBIDDEN,
            "API rate limit exceeded",
            rate_limit_headers(0),
        )
    })
}

/// `Link` header value for `page` out of `last_page`, or `None` for a
/// single page.
pub fn link_header(base: &str, page: u32, per_page: u32, last_page: u32) -> Option<String> {
    let link = |p: u32, rel: &str| format!("<{base}?page={p}&per_page={per_page}>; rel=\"{rel}\"");
    let mut entries = Vec::new();
    if page > 1 {
        entries.push(link(1, "first"));
        entries.push(link(page - 1, "prev"));
    }
    if page < last_page {
        entries.push(link(page + 1, "next"));
        entries.push(link(last_page, "last"));
    }
    if entries.is_empty() {
        None
    } else {
        Some(entries.join(", "))
    }
}

async fn list_issues(
    State(db): State<Db>,
    Path((owner, repo)): Path<(String, String)>,
    Query(params): Query<PageParams>,
    request_headers: HeaderMap,
) -> Response {
    let remaining = match rate_limited(&db) {
        Ok(remaining) => remaining,
        Err(response) => return response,
    };

    let issues = &db.issues;
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, 100);
    let page = params.page.unwrap_or(1).max(1);
    let total = issues.len() as u32;
    let last_page = total.div_ceil(per_page).max(1);

    let start = (page - 1).saturating_mul(per_page) as usize;
    let items: Vec<Issue> = issues.iter().skip(start).take(per_page as usize).cloned().collect();

    let mut headers = rate_limit_headers(remaining);
    let host = request_headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let base = format!("http://{host}/repos/{owner}/{repo}/issues");
    if let Some(value) = link_header(&base, page, per_page, last_page) {
        if let Ok(value) = HeaderValue::from_str(&value) {
            headers.insert(header::LINK, value);
        }
    }

    (StatusCode::OK, headers, Json(items)).into_response()
}

async fn current_user(
    State(db): State<Db>,
    Query(params): Query<PageParams>,
    request_headers: HeaderMap,
) -> Response {
    let remaining = match rate_limited(&db) {
        Ok(remaining) => remaining,
        Err(response) => return response,
    };

    let bearer = request_headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|t| !t.is_empty());
    let query_token = params.access_token.as_deref().filter(|t| !t.is_empty());

    if bearer.or(query_token).is_none() {
        return error_body(
            StatusCode::UNAUTHORIZED,
            "Requires authentication",
            rate_limit_headers(remaining),
        );
    }

    (
        StatusCode::OK,
        rate_limit_headers(remaining),
        Json(json!({ "login": "octocat", "id": 1 })),
    )
        .into_response()
}

async fn rate_limit(State(db): State<Db>) -> Response {
    let used = db.request_count();
    let remaining = RATE_LIMIT.saturating_sub(used);
    (
        StatusCode::OK,
        rate_limit_headers(remaining),
        Json(json!({ "rate": { "limit": RATE_LIMIT, "remaining": remaining, "used": used } })),
    )
        .into_response()
}

async fn legacy(State(db): State<Db>) -> Response {
    db.requests.fetch_add(1, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({ "legacy": true }))).into_response()
}
