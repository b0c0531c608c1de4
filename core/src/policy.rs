//! Log sink and error-propagation policy.
//!
//! # Design
//! Every policy-gated failure in the pipeline is passed to
//! `LogGateway::should_propagate` exactly once. `true` raises the error to
//! the caller; `false` turns it into `ApiResponse::Failed`. The gateway is
//! the only place that decision is made.

use std::fmt;
use std::sync::Arc;

use crate::error::ClientError;

pub trait LogGateway: Send + Sync {
    fn log(&self, message: fmt::Arguments<'_>);

    fn should_propagate(&self, error: &ClientError) -> bool;
}

type Policy = Arc<dyn Fn(&ClientError) -> bool + Send + Sync>;

/// Writes through `tracing` and applies a propagation policy function.
#[derive(Clone)]
pub struct TracingLog {
    policy: Policy,
}

impl TracingLog {
    pub fn with_policy<F>(policy: F) -> Self
    where
        F: Fn(&ClientError) -> bool + Send + Sync + 'static,
    {
        Self {
            policy: Arc::new(policy),
        }
    }

    pub fn propagate_all() -> Self {
        Self::with_policy(|_| true)
    }

    pub fn suppress_all() -> Self {
        Self::with_policy(|_| false)
    }
}

impl Default for TracingLog {
    fn default() -> Self {
        Self::propagate_all()
    }
}

impl fmt::Debug for TracingLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracingLog").finish_non_exhaustive()
    }
}

impl LogGateway for TracingLog {
    fn log(&self, message: fmt::Arguments<'_>) {
        tracing::info!("{}", message);
    }

    fn should_propagate(&self, error: &ClientError) -> bool {
        let propagate = (self.policy)(error);
        if propagate {
            tracing::warn!(uri = error.uri(), error = %error, "request failed");
        } else {
            tracing::warn!(uri = error.uri(), error = %error, "request failed, suppressed by policy");
        }
        propagate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_error() -> ClientError {
        ClientError::Authentication {
            uri: "http://h/user".to_string(),
        }
    }

    fn api_error(status: u16) -> ClientError {
        ClientError::Api {
            status,
            status_text: String::new(),
            body: String::new(),
            uri: "http://h/x".to_string(),
        }
    }

    #[test]
    fn fixed_policies() {
        assert!(TracingLog::propagate_all().should_propagate(&auth_error()));
        assert!(!TracingLog::suppress_all().should_propagate(&auth_error()));
        assert!(TracingLog::default().should_propagate(&api_error(500)));
    }

    #[test]
    fn custom_policy_sees_the_error() {
        let log = TracingLog::with_policy(|e| !matches!(e, ClientError::Api { status: 404, .. }));
        assert!(!log.should_propagate(&api_error(404)));
        assert!(log.should_propagate(&api_error(500)));
        assert!(log.should_propagate(&auth_error()));
    }

    #[test]
    fn log_accepts_format_arguments() {
        TracingLog::default().log(format_args!("Returning cached result for {}", "http://h/x"));
    }
}
