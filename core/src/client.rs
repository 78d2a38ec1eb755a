//! Request builder, response parser and rate-limit cache for the Topsy API.
//!
//! # Design
//! `TopsyClient` keeps the host-does-IO split: `build_request` produces an
//! `HttpRequest` and `parse_response` consumes an `HttpResponse`, neither
//! touching the network. `request` and `get` stitch the two together through
//! the configured `Transport` for callers that just want an answer.
//!
//! The only state carried between calls is the configuration and the most
//! recent rate-limit quota, refreshed from every response that reports one.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};
use url::form_urlencoded;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseHeaders};
use crate::rate_limit::RateLimit;
use crate::transport::{default_transport, Transport};

/// Endpoint queried to populate rate-limit data on demand.
pub const CREDIT_ENDPOINT: &str = "credit";

const API_KEY_PARAM: &str = "apikey";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A parsed API response.
#[derive(Debug, Clone, PartialEq)]
pub struct TopsyResponse {
    pub status: u16,
    pub headers: ResponseHeaders,
    /// `None` when the body was empty or not valid JSON.
    pub body: Option<Value>,
}

/// Synchronous client for the Topsy "otter" API.
#[derive(Clone)]
pub struct TopsyClient {
    base_url: String,
    api_key: Option<String>,
    user_agent: Option<String>,
    rate_limit: Option<RateLimit>,
    transport: Option<Arc<dyn Transport>>,
}

impl TopsyClient {
    /// Client for the public API using the built-in transport, if compiled in.
    pub fn new(api_key: Option<String>, user_agent: Option<String>) -> Self {
        Self::from_config(ClientConfig {
            api_key,
            user_agent,
            ..ClientConfig::default()
        })
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            user_agent: config.user_agent,
            rate_limit: None,
            transport: default_transport(),
        }
    }

    /// Replace the base URL, e.g. to point at a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Drop the transport. `request` then fails with `TransportUnavailable`;
    /// `build_request` / `parse_response` keep working.
    pub fn without_transport(mut self) -> Self {
        self.transport = None;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn set_api_key(&mut self, value: impl Into<String>) {
        self.api_key = Some(value.into());
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn set_user_agent(&mut self, value: impl Into<String>) {
        self.user_agent = Some(value.into());
    }

    /// Cached quota, without any I/O.
    pub fn rate_limit_state(&self) -> Option<RateLimit> {
        self.rate_limit
    }

    /// Requests allowed per window. Queries the credit endpoint first if no
    /// response has reported a quota yet.
    pub fn rate_limit(&mut self) -> Result<u64, ApiError> {
        Ok(self.ensure_rate_limit()?.limit)
    }

    /// Requests left in the current window, fetched as for `rate_limit`.
    pub fn rate_limit_remaining(&mut self) -> Result<u64, ApiError> {
        Ok(self.ensure_rate_limit()?.remaining)
    }

    /// UNIX timestamp of the next window, fetched as for `rate_limit`.
    pub fn rate_limit_reset(&mut self) -> Result<u64, ApiError> {
        Ok(self.ensure_rate_limit()?.reset)
    }

    fn ensure_rate_limit(&mut self) -> Result<RateLimit, ApiError> {
        if let Some(rate_limit) = self.rate_limit {
            return Ok(rate_limit);
        }
        self.get(CREDIT_ENDPOINT, &[])?;
        self.rate_limit.ok_or(ApiError::RateLimitUnavailable)
    }

    /// `<base>/<endpoint>.json`, with slashes trimmed from both ends of
    /// `endpoint`.
    pub fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}.json", self.base_url, endpoint.trim_matches('/'))
    }

    /// Build the request for `endpoint` without sending it.
    ///
    /// The API key, when set, is appended as `apikey` and replaces any
    /// caller-supplied `apikey`. GET parameters go in the query string; other
    /// verbs send them as a form-encoded body.
    pub fn build_request(
        &self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> HttpRequest {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in params {
            if self.api_key.is_some() && *name == API_KEY_PARAM {
                continue;
            }
            serializer.append_pair(name, value);
        }
        if let Some(key) = &self.api_key {
            serializer.append_pair(API_KEY_PARAM, key);
        }
        let encoded = serializer.finish();

        let mut url = self.build_url(endpoint);
        let mut headers = Vec::new();
        if let Some(user_agent) = &self.user_agent {
            headers.push(("User-Agent".to_string(), user_agent.clone()));
        }

        let body = match method {
            HttpMethod::Get => {
                if !encoded.is_empty() {
                    url.push('?');
                    url.push_str(&encoded);
                }
                None
            }
            _ => {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                Some(encoded)
            }
        };

        HttpRequest {
            method,
            url,
            headers,
            body,
        }
    }

    /// Parse a response and record any rate-limit quota it reports.
    pub fn parse_response(&mut self, response: HttpResponse) -> TopsyResponse {
        if let Some(rate_limit) = RateLimit::from_headers(&response.headers) {
            debug!(
                limit = rate_limit.limit,
                remaining = rate_limit.remaining,
                reset = rate_limit.reset,
                "rate limit updated"
            );
            self.rate_limit = Some(rate_limit);
        }

        let body = match serde_json::from_str::<Value>(&response.body) {
            Ok(value) => Some(value),
            Err(e) => {
                if !response.body.trim().is_empty() {
                    warn!(status = response.status, error = %e, "response body is not valid JSON");
                }
                None
            }
        };

        TopsyResponse {
            status: response.status,
            headers: response.headers,
            body,
        }
    }

    /// Send one request through the transport and parse the response.
    pub fn request(
        &mut self,
        method: HttpMethod,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<TopsyResponse, ApiError> {
        let transport = Arc::clone(
            self.transport
                .as_ref()
                .ok_or(ApiError::TransportUnavailable)?,
        );
        let request = self.build_request(method, endpoint, params);
        debug!(method = %request.method, endpoint, "topsy request");
        let response = transport.execute(request)?;
        debug!(status = response.status, "topsy response");
        Ok(self.parse_response(response))
    }

    pub fn get(
        &mut self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<TopsyResponse, ApiError> {
        self.request(HttpMethod::Get, endpoint, params)
    }
}

impl fmt::Debug for TopsyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopsyClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .field("rate_limit", &self.rate_limit)
            .field("has_transport", &self.transport.is_some())
            .finish()
    }
}
