//! Request execution pipeline.
//!
//! # Design
//! `ApiClient::get_response` is the single path from a logical `Request` to
//! an `ApiResponse`. The order is fixed:
//!
//! 1. base URL + path, then paging parameters
//! 2. auth URI rewrite (the result is the cache key)
//! 3. cache lookup; a hit returns without touching the network
//! 4. pending request with the versioned `Accept` header
//! 5. auth pre-authentication, then final header preparation
//! 6. one transport round trip
//! 7. rate-limit and `Link` header parsing, cache store
//!
//! Authentication, HTTP and transport failures are resolved by the log/policy
//! gateway. Malformed rate-limit or link headers always propagate.
//!
//! The stages are also exposed on their own (`resolve_uri`, `build_request`,
//! `parse_response`) for callers that run the I/O themselves.

use std::collections::HashSet;
use std::sync::Arc;

use crate::auth::{AuthGateway, NoAuth};
use crate::cache::{CacheGateway, NoCache};
use crate::config::{ClientConfig, ConfigError};
use crate::error::ClientError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::links::parse_link_header;
use crate::policy::{LogGateway, TracingLog};
use crate::transport::UreqTransport;
use crate::types::{ApiResponse, FailedResponse, Request, Response};
use crate::uri::{add_paging, build_uri};

/// Versioned media type sent as `Accept` on every request.
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github+json";

pub const RATE_LIMIT_LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const LINK_HEADER: &str = "Link";

/// Synchronous client for the paged API.
///
/// Holds no per-call state. The gateways are shared and owned elsewhere;
/// the client only calls their trait methods.
#[derive(Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    auth: Arc<dyn AuthGateway>,
    cache: Arc<dyn CacheGateway>,
    log: Arc<dyn LogGateway>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Anonymous, uncached client that propagates every failure.
    ///
    /// `config` is taken as is; call `ClientConfig::validate` first when it
    /// was not loaded through `ClientConfig::from_toml_str` or `load`.
    pub fn new(mut config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Self {
            config,
            transport,
            auth: Arc::new(NoAuth),
            cache: Arc::new(NoCache),
            log: Arc::new(TracingLog::propagate_all()),
        }
    }

    /// Client over a `ureq` transport built from a validated `config`.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let transport = Arc::new(UreqTransport::new(&config));
        Ok(Self::new(config, transport))
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthGateway>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn CacheGateway>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_log(mut self, log: Arc<dyn LogGateway>) -> Self {
        self.log = log;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Base URL + path, paging parameters, then the auth rewrite.
    pub fn resolve_uri(&self, request: &Request) -> String {
        let uri = build_uri(&self.config.base_url, &request.path);
        let uri = add_paging(&uri, request.page, request.per_page);
        self.auth.prepare_uri(&uri)
    }

    /// The pending request handed to the auth gateway.
    pub fn build_request(&self, request: &Request, uri: &str) -> HttpRequest {
        let mut pending = HttpRequest::new(request.method, uri);
        pending.set_header("Accept", ACCEPT_MEDIA_TYPE);
        pending
    }

    /// Turn a 2xx response into a `Response`.
    ///
    /// Both rate-limit headers must be present and numeric. A present,
    /// non-empty `Link` header must parse.
    pub fn parse_response(&self, response: HttpResponse, uri: &str) -> Result<Response, ClientError> {
        let rate_limit_limit = rate_limit_header(&response, RATE_LIMIT_LIMIT_HEADER, uri)?;
        let rate_limit_remaining = rate_limit_header(&response, RATE_LIMIT_REMAINING_HEADER, uri)?;

        let link_header = response
            .header(LINK_HEADER)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string);

        let mut parsed = Response {
            status_code: response.status,
            status_text: response.status_text,
            body: response.body,
            rate_limit_limit,
            rate_limit_remaining,
            link_next: None,
            link_previous: None,
            link_first: None,
            link_last: None,
        };

        if let Some(value) = link_header {
            let links = parse_link_header(&value).map_err(|e| ClientError::MalformedResponse {
                uri: uri.to_string(),
                reason: e.to_string(),
            })?;
            parsed.set_links(links);
        }

        Ok(parsed)
    }

    /// Execute one logical request.
    pub fn get_response(&self, request: &Request) -> Result<ApiResponse, ClientError> {
        let uri = self.resolve_uri(request);
        self.execute(request, uri)
    }

    /// Fetch an absolute URI taken from a `Link` header.
    ///
    /// Base URL and paging are already baked into the link; the auth
    /// rewrite, cache and policy still apply.
    pub fn get_link(&self, request: &Request, link: &str) -> Result<ApiResponse, ClientError> {
        let uri = self.auth.prepare_uri(link);
        let followed = Request::new(request.method, link);
        self.execute(&followed, uri)
    }

    /// Fetch `request` and then every page reachable through `link_next`.
    ///
    /// Stops after the first page without a next link, the first `Failed`
    /// outcome, or a next link whose resolved URI was already fetched
    /// (the first page included).
    pub fn get_all_pages(&self, request: &Request) -> Result<Vec<ApiResponse>, ClientError> {
        let mut pages = Vec::new();
        let mut visited = HashSet::from([self.resolve_uri(request)]);
        let mut current = self.get_response(request)?;

        loop {
            let next = match &current {
                ApiResponse::Success(response) => response.link_next.clone(),
                ApiResponse::Failed(_) => None,
            };
            pages.push(current);

            let Some(link) = next else { break };
            if !visited.insert(self.auth.prepare_uri(&link)) {
                tracing::warn!(link = %link, "pagination loop detected, stopping");
                break;
            }
            current = self.get_link(request, &link)?;
        }

        Ok(pages)
    }

    fn execute(&self, request: &Request, uri: String) -> Result<ApiResponse, ClientError> {
        if self.cache.has(&uri) {
            if let Some(cached) = self.cache.get(&uri) {
                self.log.log(format_args!("Returning cached result for {uri}"));
                return Ok(ApiResponse::Success(cached));
            }
            tracing::debug!(uri = %uri, "cache reported entry but returned none, fetching");
        }

        let pending = self.build_request(request, &uri);
        let auth = self.auth.pre_authenticate(request, pending);
        if !auth.success {
            return self.resolve_failure(ClientError::Authentication { uri });
        }
        let outgoing = self.finish_request(auth.prepared_request);

        tracing::debug!(method = %outgoing.method, uri = %uri, "sending request");
        let response = match self.transport.execute(&outgoing) {
            Ok(response) => response,
            Err(source) => return self.resolve_failure(ClientError::Transport { uri, source }),
        };
        tracing::debug!(status = response.status, uri = %uri, "received response");

        if !response.is_success() {
            return self.resolve_failure(ClientError::Api {
                status: response.status,
                status_text: response.status_text,
                body: response.body,
                uri,
            });
        }

        let parsed = self.parse_response(response, &uri)?;
        self.cache.set(parsed.clone(), &uri);
        Ok(ApiResponse::Success(parsed))
    }

    fn finish_request(&self, mut request: HttpRequest) -> HttpRequest {
        request.set_header("Accept", ACCEPT_MEDIA_TYPE);
        if request.header("User-Agent").is_none() {
            request.set_header("User-Agent", self.config.user_agent.clone());
        }
        request
    }

    fn resolve_failure(&self, error: ClientError) -> Result<ApiResponse, ClientError> {
        if self.log.should_propagate(&error) {
            return Err(error);
        }
        Ok(ApiResponse::Failed(FailedResponse {
            request_uri: error.uri().to_string(),
        }))
    }
}

fn rate_limit_header(response: &HttpResponse, name: &str, uri: &str) -> Result<u32, ClientError> {
    let value = response.header(name).ok_or_else(|| ClientError::MalformedResponse {
        uri: uri.to_string(),
        reason: format!("missing {name} header"),
    })?;
    value.trim().parse().map_err(|_| ClientError::MalformedResponse {
        uri: uri.to_string(),
        reason: format!("{name} header is not an integer: {value:?}"),
    })
}
