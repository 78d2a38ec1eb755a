//! Synchronous client for the Topsy search API.
//!
//! # Overview
//! Builds requests against `http://otter.topsy.com/<endpoint>.json`, parses
//! responses into status, headers and JSON body, and tracks the
//! `X-RateLimit-*` quota the API reports.
//!
//! # Design
//! - `TopsyClient` holds the API key, user agent, base URL and the last seen
//!   rate limit. Nothing else survives between calls.
//! - Request building and response parsing are pure; the network lives
//!   behind the `Transport` trait (ureq by default, `ureq` feature), so the
//!   core stays deterministic under test.
//! - Non-2xx responses are data, not errors. A body that is not JSON parses
//!   to `None`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod rate_limit;
pub mod transport;

pub use client::{TopsyClient, TopsyResponse, CREDIT_ENDPOINT};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, ResponseHeaders};
pub use rate_limit::RateLimit;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
