use thiserror::Error;

/// Errors that can occur while talking to a bill-payment provider or persisting its catalog.
///
/// Only configuration, authentication, unsupported-operation, request-shape and
/// storage failures are meant to reach the caller. Transport and business failures
/// are folded into `failure` results at the adapter boundary.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Missing credentials, secrets or endpoints
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Token grant rejected, or still unauthorized after one token refresh
    #[error("Authentication failed: {0}")]
    AuthFailure(String),
    /// Network failure or timeout
    #[error("Transport error: {0}")]
    Transport(String),
    /// Body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// A root catalog listing could not be fetched
    #[error("Upstream error: {0}")]
    Upstream(String),
    /// Adapter does not support this operation
    #[error("{provider} does not implement {operation}")]
    NotImplemented {
        provider: &'static str,
        operation: &'static str,
    },
    #[error("Unsupported billing provider [{0}]")]
    UnknownProvider(String),
    /// Transaction reference already recorded
    #[error("Duplicate transaction reference: {0}")]
    DuplicateReference(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BillingError {
    pub fn not_implemented(provider: &'static str, operation: &'static str) -> Self {
        Self::NotImplemented {
            provider,
            operation,
        }
    }

    /// Failures that adapters recover into typed `failure` results.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidResponse(_))
    }
}

impl From<reqwest::Error> for BillingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Transport(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            Self::Transport(format!("Connection failed: {}", err))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
