//! Executes `HttpRequest` values over the network.
//!
//! # Design
//! The client only needs "request in, response out", so the network sits
//! behind the `Transport` trait. The default implementation uses ureq and is
//! compiled only with the `ureq` feature; without it a client has no transport
//! until the caller supplies one, and requests fail with
//! `ApiError::TransportUnavailable`.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};

/// Performs one blocking HTTP round-trip.
///
/// Implementations must return 4xx/5xx responses as `Ok` data; `Err` is
/// reserved for failures where no response was received.
pub trait Transport: Send + Sync {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

/// The transport compiled into the crate, if any.
pub fn default_transport() -> Option<std::sync::Arc<dyn Transport>> {
    #[cfg(feature = "ureq")]
    {
        Some(std::sync::Arc::new(UreqTransport::new()))
    }
    #[cfg(not(feature = "ureq"))]
    {
        None
    }
}

#[cfg(feature = "ureq")]
pub use self::ureq_transport::UreqTransport;

#[cfg(feature = "ureq")]
mod ureq_transport {
    use tracing::debug;

    use super::Transport;
    use crate::error::ApiError;
    use crate::http::{HttpMethod, HttpRequest, HttpResponse, ResponseHeaders};

    /// Blocking transport backed by a `ureq::Agent`.
    #[derive(Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        /// Agent with ureq's status-code-as-error behavior disabled, so every
        /// response reaches the client as data.
        pub fn new() -> Self {
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        /// Use a preconfigured agent (timeouts, proxy). It should have
        /// `http_status_as_error(false)` set.
        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }

    impl Transport for UreqTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;
            debug!(method = %method, url = %url, "sending request");

            let result = match (method, body) {
                (HttpMethod::Get, _) => with_headers(self.agent.get(&url), &headers).call(),
                (HttpMethod::Delete, None) => {
                    with_headers(self.agent.delete(&url), &headers).call()
                }
                (HttpMethod::Delete, Some(body)) => with_headers(self.agent.delete(&url), &headers)
                    .force_send_body()
                    .send(body.as_bytes()),
                (HttpMethod::Post, Some(body)) => {
                    with_headers(self.agent.post(&url), &headers).send(body.as_bytes())
                }
                (HttpMethod::Post, None) => with_headers(self.agent.post(&url), &headers).send_empty(),
                (HttpMethod::Put, Some(body)) => {
                    with_headers(self.agent.put(&url), &headers).send(body.as_bytes())
                }
                (HttpMethod::Put, None) => with_headers(self.agent.put(&url), &headers).send_empty(),
                (HttpMethod::Patch, Some(body)) => {
                    with_headers(self.agent.patch(&url), &headers).send(body.as_bytes())
                }
                (HttpMethod::Patch, None) => {
                    with_headers(self.agent.patch(&url), &headers).send_empty()
                }
            };
            let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect::<Vec<_>>();
            let body = response
                .body_mut()
                .read_to_string()
                .map_err(|e| ApiError::Transport(e.to_string()))?;

            Ok(HttpResponse {
                status,
                headers: ResponseHeaders::new(headers),
                body,
            })
        }
    }
}
