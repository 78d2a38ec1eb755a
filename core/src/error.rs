//! Error types for the Topsy API client.
//!
//! # Design
//! Non-2xx statuses are not errors here: the client hands every response back
//! to the caller as data. Errors cover only the cases where no response could
//! be produced at all, plus the one lookup (rate limit) that can come back
//! empty-handed.

use thiserror::Error;

/// Errors returned by `TopsyClient`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The client has no HTTP transport to execute requests with.
    #[error("no HTTP transport is configured; enable the `ureq` feature or supply one")]
    TransportUnavailable,

    /// The transport failed before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// A method string did not name a supported HTTP verb.
    #[error("unsupported HTTP method: {0}")]
    InvalidMethod(String),

    /// The credit endpoint responded without any `X-RateLimit-*` headers.
    #[error("rate limit headers missing from API response")]
    RateLimitUnavailable,
}
