//! Authentication capability consumed by the pipeline.
//!
//! An auth gateway gets two chances to act: `prepare_uri` rewrites the URI
//! for query-string schemes and runs before the cache lookup (the rewritten
//! URI is the cache key), and `pre_authenticate` decorates the outgoing
//! request for header schemes. The rewrite must be deterministic for a
//! given input or cached responses will never be found again.

use crate::http::HttpRequest;
use crate::types::{AuthResult, Request};
use crate::uri::{append_query_param, has_query_param};

pub trait AuthGateway: Send + Sync {
    fn prepare_uri(&self, uri: &str) -> String;

    fn pre_authenticate(&self, request: &Request, pending: HttpRequest) -> AuthResult;
}

/// Anonymous access: no rewrite, always succeeds.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoAuth;

impl AuthGateway for NoAuth {
    fn prepare_uri(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn pre_authenticate(&self, _request: &Request, pending: HttpRequest) -> AuthResult {
        AuthResult::ok(pending)
    }
}

/// `Authorization: Bearer <token>` header authentication.
#[derive(Clone)]
pub struct BearerToken {
    token: String,
}

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken").field("token", &"<redacted>").finish()
    }
}

impl AuthGateway for BearerToken {
    fn prepare_uri(&self, uri: &str) -> String {
        uri.to_string()
    }

    fn pre_authenticate(&self, _request: &Request, mut pending: HttpRequest) -> AuthResult {
        if self.token.trim().is_empty() {
            return AuthResult::failed(pending);
        }
        pending.set_header("Authorization", format!("Bearer {}", self.token));
        AuthResult::ok(pending)
    }
}

/// Token passed as a query parameter, e.g. `access_token=...`.
#[derive(Clone)]
pub struct QueryToken {
    param: String,
    token: String,
}

impl QueryToken {
    pub fn new(param: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for QueryToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryToken")
            .field("param", &self.param)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl AuthGateway for QueryToken {
    /// Links handed out by the server may already carry the token; those
    /// are returned unchanged so the parameter is never doubled.
    fn prepare_uri(&self, uri: &str) -> String {
        if has_query_param(uri, &self.param) {
            return uri.to_string();
        }
        append_query_param(uri, &self.param, &self.token)
    }

    fn pre_authenticate(&self, _request: &Request, pending: HttpRequest) -> AuthResult {
        if self.token.trim().is_empty() {
            AuthResult::failed(pending)
        } else {
            AuthResult::ok(pending)
        }
    }
}
