//! Error types for the request pipeline.
//!
//! # Design
//! `Authentication`, `Api` and `Transport` are expected failure modes: the
//! pipeline reports each one to the log/policy gateway, which decides
//! whether it reaches the caller. `MalformedResponse` means the server broke
//! its contract (rate-limit or link headers unusable) and is always raised.

use thiserror::Error;

use crate::http::TransportError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The auth gateway refused to authenticate the request.
    #[error("authentication failed for {uri}")]
    Authentication { uri: String },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status} {status_text} for {uri}: {body}")]
    Api {
        status: u16,
        status_text: String,
        body: String,
        uri: String,
    },

    /// No HTTP response was received.
    #[error("transport error for {uri}: {source}")]
    Transport {
        uri: String,
        #[source]
        source: TransportError,
    },

    #[error("malformed response from {uri}: {reason}")]
    MalformedResponse { uri: String, reason: String },
}

impl ClientError {
    /// The resolved URI of the request that failed.
    pub fn uri(&self) -> &str {
        match self {
            ClientError::Authentication { uri }
            | ClientError::Api { uri, .. }
            | ClientError::Transport { uri, .. }
            | ClientError::MalformedResponse { uri, .. } => uri,
        }
    }

    /// Whether the log/policy gateway gets a say before this is raised.
    pub fn is_policy_gated(&self) -> bool {
        !matches!(self, ClientError::MalformedResponse { .. })
    }
}
