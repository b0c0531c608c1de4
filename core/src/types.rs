//! Request and response model for the paged API.
//!
//! # Design
//! A pipeline call ends in one of two values: a `Response` from a real round
//! trip (or the cache), or a `FailedResponse` when the log/policy gateway
//! chose to swallow an error. `ApiResponse` makes that a tagged union so the
//! caller has to look before reading payload fields.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::http::{HttpMethod, HttpRequest};
use crate::links::PageLinks;

/// One logical API call: verb, resource path (no base URL) and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: HttpMethod,
    pub path: String,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Request {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            page: None,
            per_page: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = Some(per_page);
        self
    }
}

/// A successful API response, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status_code: u16,
    pub status_text: String,
    pub body: String,
    pub rate_limit_limit: u32,
    pub rate_limit_remaining: u32,
    pub link_next: Option<String>,
    pub link_previous: Option<String>,
    pub link_first: Option<String>,
    pub link_last: Option<String>,
}

impl Response {
    /// Deserialize the raw body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    pub fn links(&self) -> PageLinks {
        PageLinks {
            next: self.link_next.clone(),
            previous: self.link_previous.clone(),
            first: self.link_first.clone(),
            last: self.link_last.clone(),
        }
    }

    pub(crate) fn set_links(&mut self, links: PageLinks) {
        self.link_next = links.next;
        self.link_previous = links.previous;
        self.link_first = links.first;
        self.link_last = links.last;
    }
}

/// Stand-in for a failure the policy gateway decided not to raise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedResponse {
    pub request_uri: String,
}

/// Result of one pipeline call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse {
    Success(Response),
    Failed(FailedResponse),
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    pub fn success(&self) -> Option<&Response> {
        match self {
            ApiResponse::Success(response) => Some(response),
            ApiResponse::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<Response, FailedResponse> {
        match self {
            ApiResponse::Success(response) => Ok(response),
            ApiResponse::Failed(failed) => Err(failed),
        }
    }
}

/// Outcome of `AuthGateway::pre_authenticate`.
#[derive(Debug, Clone)]
pub struct AuthResult {
    pub success: bool,
    pub prepared_request: HttpRequest,
}

impl AuthResult {
    pub fn ok(prepared_request: HttpRequest) -> Self {
        Self {
            success: true,
            prepared_request,
        }
    }

    pub fn failed(prepared_request: HttpRequest) -> Self {
        Self {
            success: false,
            prepared_request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> Response {
        Response {
            status_code: 200,
            status_text: "OK".to_string(),
            body: body.to_string(),
            rate_limit_limit: 60,
            rate_limit_remaining: 59,
            link_next: None,
            link_previous: None,
            link_first: None,
            link_last: None,
        }
    }

    #[test]
    fn request_builder_sets_paging() {
        let req = Request::get("repos/o/r/issues").with_page(2).with_per_page(30);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.page, Some(2));
        assert_eq!(req.per_page, Some(30));
    }

    #[test]
    fn response_body_deserializes() {
        let value: serde_json::Value = response(r#"{"login":"octocat"}"#).json().unwrap();
        assert_eq!(value["login"], "octocat");
    }

    #[test]
    fn response_bad_json_is_an_error() {
        assert!(response("not json").json::<serde_json::Value>().is_err());
    }

    #[test]
    fn set_links_fills_all_four_fields() {
        let mut r = response("[]");
        r.set_links(PageLinks {
            next: Some("n".to_string()),
            previous: None,
            first: Some("f".to_string()),
            last: Some("l".to_string()),
        });
        assert_eq!(r.link_next.as_deref(), Some("n"));
        assert_eq!(r.link_previous, None);
        assert_eq!(r.links().first.as_deref(), Some("f"));
    }

    #[test]
    fn failed_variant_has_no_payload() {
        let outcome = ApiResponse::Failed(FailedResponse {
            request_uri: "http://h/x".to_string(),
        });
        assert!(!outcome.is_success());
        assert!(outcome.success().is_none());
        assert_eq!(outcome.into_result().unwrap_err().request_uri, "http://h/x");
    }
}
