//! Error types for the CNAME source
//!
//! This module defines all error types used throughout the crate.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for endpoint source operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the CNAME source
#[derive(Error, Debug)]
pub enum Error {
    /// Wrapped endpoint source failed to produce endpoints
    #[error("Endpoint source error: {0}")]
    Source(String),

    /// Reverse lookup of a single target failed
    #[error("PTR lookup for {target} failed: {message}")]
    Lookup {
        /// The address that was looked up
        target: String,
        /// Resolver failure detail
        message: String,
    },

    /// Reverse lookup of a single target exceeded the configured timeout
    #[error("PTR lookup for {target} timed out after {timeout:?}")]
    LookupTimeout {
        /// The address that was looked up
        target: String,
        /// The configured lookup timeout
        timeout: Duration,
    },

    /// A collaborator broke its contract (e.g. an endpoint without targets)
    #[error("Contract violation: {0}")]
    Contract(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an endpoint source error
    pub fn endpoint_source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create a lookup error for `target`
    pub fn lookup(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Lookup {
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a lookup timeout error for `target`
    pub fn lookup_timeout(target: impl Into<String>, timeout: Duration) -> Self {
        Self::LookupTimeout {
            target: target.into(),
            timeout,
        }
    }

    /// Create a contract violation error
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error came from a per-endpoint lookup rather than the source
    pub fn is_lookup_failure(&self) -> bool {
        matches!(
            self,
            Self::Lookup { .. } | Self::LookupTimeout { .. } | Self::InvalidInput(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
