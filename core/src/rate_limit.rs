//! Rate-limit bookkeeping from `X-RateLimit-*` response headers.

use serde::{Deserialize, Serialize};

use crate::http::ResponseHeaders;

pub const LIMIT_HEADER: &str = "X-RateLimit-Limit";
pub const REMAINING_HEADER: &str = "X-RateLimit-Remaining";
pub const RESET_HEADER: &str = "X-RateLimit-Reset";

/// Quota reported by the API on its most recent response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    /// Requests allowed per window.
    pub limit: u64,
    /// Requests left in the current window.
    pub remaining: u64,
    /// When the window resets, as a UNIX timestamp in seconds.
    pub reset: u64,
}

impl RateLimit {
    /// Read the quota from `headers`.
    ///
    /// Returns `None` unless `X-RateLimit-Limit` is present. Once it is, the
    /// other two headers are read leniently and fall back to 0.
    pub fn from_headers(headers: &ResponseHeaders) -> Option<Self> {
        let limit = headers.get(LIMIT_HEADER)?;
        Some(Self {
            limit: lenient_u64(limit),
            remaining: headers.get(REMAINING_HEADER).map_or(0, lenient_u64),
            reset: headers.get(RESET_HEADER).map_or(0, lenient_u64),
        })
    }
}

/// Parse the leading decimal digits of `value`; anything else reads as 0.
fn lenient_u64(value: &str) -> u64 {
    let trimmed = value.trim_start();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().unwrap_or(0)
}
