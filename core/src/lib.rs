//! Synchronous request pipeline for a paged, rate-limited REST API.
//!
//! # Overview
//! `ApiClient::get_response` turns a logical `Request` (verb, resource path,
//! paging) into one HTTP round trip and a normalized `ApiResponse`: payload,
//! rate-limit counters and pagination links, or a `FailedResponse` when the
//! policy gateway suppresses an error.
//!
//! # Design
//! - Authentication, caching and logging/error policy are narrow traits
//!   (`AuthGateway`, `CacheGateway`, `LogGateway`) injected into the client.
//! - The network sits behind `Transport`; `UreqTransport` is the blocking
//!   implementation, tests substitute their own.
//! - Every step of the pipeline is also available on its own so a host can
//!   perform the I/O itself.

pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod links;
pub mod policy;
pub mod transport;
pub mod types;
pub mod uri;

pub use auth::{AuthGateway, BearerToken, NoAuth, QueryToken};
pub use cache::{CacheGateway, InMemoryCache, NoCache};
pub use client::{ApiClient, ACCEPT_MEDIA_TYPE};
pub use config::{ClientConfig, ConfigError, TlsConfig};
pub use error::ClientError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use links::{parse_link_header, LinkParseError, PageLinks};
pub use policy::{LogGateway, TracingLog};
pub use transport::UreqTransport;
pub use types::{ApiResponse, AuthResult, FailedResponse, Request, Response};
