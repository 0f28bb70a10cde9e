//! Error types for catalog lookups.

use thiserror::Error;

/// Result type alias for discovery operations.
pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// Errors that can occur while resolving a service endpoint.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The catalog answered with an empty list.
    #[error("no instance of service {service:?} is registered")]
    NotFound { service: String },

    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),

    /// The agent could not be reached, timed out, or answered non-2xx.
    #[error("discovery agent unavailable: {0}")]
    Unavailable(String),

    #[error("invalid discovery agent address {0:?}")]
    InvalidAgentAddress(String),

    /// The catalog request could not be built (bad token, bad timeout).
    #[error("invalid catalog request: {0}")]
    InvalidRequest(String),
}
