use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use axum::{
    extract::{Query, Request, State},
    http::{header::USER_AGENT, HeaderMap, HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

pub const RATE_LIMIT: u64 = 3000;
/// Fixed reset timestamp so tests can assert on it.
pub const RATE_LIMIT_RESET: u64 = 1_325_376_000;

/// Quota shared by all routes; each request spends one unit.
#[derive(Debug)]
pub struct Quota {
    remaining: AtomicU64,
}

impl Quota {
    pub fn new(limit: u64) -> Self {
        Self {
            remaining: AtomicU64::new(limit),
        }
    }

    /// Spend one unit and return what is left, saturating at zero.
    fn spend(&self) -> u64 {
        let previous = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| Some(r.saturating_sub(1)))
            .unwrap_or(0);
        previous.saturating_sub(1)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Credit {
    pub response: CreditBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreditBody {
    pub limit: u64,
    pub reset: u64,
}

/// Echo of a search request: what the server received.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchEcho {
    pub request: EchoedRequest,
    pub response: SearchBody,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoedRequest {
    pub method: String,
    pub parameters: HashMap<String, String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchBody {
    pub list: Vec<SearchHit>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
}

pub type SharedQuota = Arc<Quota>;

pub fn app() -> Router {
    let quota: SharedQuota = Arc::new(Quota::new(RATE_LIMIT));
    Router::new()
        .route("/credit.json", get(credit))
        .route("/search.json", get(search_query).post(search_form))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(quota.clone(), rate_limit_headers))
        .with_state(quota)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn rate_limit_headers(State(quota): State<SharedQuota>, req: Request, next: Next) -> Response {
    let remaining = quota.spend();
    let mut response = next.run(req).await;
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(RATE_LIMIT));
    headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
    headers.insert("X-RateLimit-Reset", HeaderValue::from(RATE_LIMIT_RESET));
    response
}

async fn credit() -> Json<Credit> {
    Json(Credit {
        response: CreditBody {
            limit: RATE_LIMIT,
            reset: RATE_LIMIT_RESET,
        },
    })
}

async fn search_query(
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Json<SearchEcho> {
    Json(echo("GET", &headers, params))
}

async fn search_form(
    headers: HeaderMap,
    Form(params): Form<HashMap<String, String>>,
) -> Json<SearchEcho> {
    Json(echo("POST", &headers, params))
}

fn echo(method: &str, headers: &HeaderMap, parameters: HashMap<String, String>) -> SearchEcho {
    let list = parameters
        .get("q")
        .map(|q| {
            vec![SearchHit {
                title: format!("Result for {q}"),
                url: format!("http://example.com/{}", q.replace(' ', "-")),
            }]
        })
        .unwrap_or_default();
    SearchEcho {
        request: EchoedRequest {
            method: method.to_string(),
            user_agent: headers
                .get(USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string),
            parameters,
        },
        response: SearchBody { list },
    }
}

/// Plain-text body, so clients see a non-JSON payload.
async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "no such endpoint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_counts_down_and_saturates() {
        let quota = Quota::new(2);
        assert_eq!(quota.spend(), 1);
        assert_eq!(quota.spend(), 0);
        assert_eq!(quota.spend(), 0);
    }

    #[test]
    fn echo_builds_hit_from_query() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("http://example.com"));
        let params = HashMap::from([("q".to_string(), "rust lang".to_string())]);
        let echoed = echo("GET", &headers, params);
        assert_eq!(echoed.request.user_agent.as_deref(), Some("http://example.com"));
        assert_eq!(echoed.response.list.len(), 1);
        assert_eq!(echoed.response.list[0].url, "http://example.com/rust-lang");
    }

    #[test]
    fn echo_without_query_has_no_hits() {
        let echoed = echo("POST", &HeaderMap::new(), HashMap::new());
        assert!(echoed.request.user_agent.is_none());
        assert!(echoed.response.list.is_empty());
    }

    #[test]
    fn credit_serializes_under_response_key() {
        let json = serde_json::to_value(Credit {
            response: CreditBody { limit: 1, reset: 2 },
        })
        .unwrap();
        assert_eq!(json["response"]["limit"], 1);
        assert_eq!(json["response"]["reset"], 2);
    }
}
