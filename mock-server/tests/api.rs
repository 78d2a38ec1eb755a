use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Credit, SearchEcho, RATE_LIMIT, RATE_LIMIT_RESET};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get_request(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

fn header(response: &axum::response::Response, name: &str) -> String {
    response.headers()[name].to_str().unwrap().to_string()
}

// --- credit ---

#[tokio::test]
async fn credit_reports_quota_in_body_and_headers() {
    let resp = app().oneshot(get_request("/credit.json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header(&resp, "x-ratelimit-limit"), RATE_LIMIT.to_string());
    assert_eq!(header(&resp, "x-ratelimit-remaining"), (RATE_LIMIT - 1).to_string());
    assert_eq!(header(&resp, "x-ratelimit-reset"), RATE_LIMIT_RESET.to_string());

    let credit: Credit = body_json(resp).await;
    assert_eq!(credit.response.limit, RATE_LIMIT);
    assert_eq!(credit.response.reset, RATE_LIMIT_RESET);
}

// --- search ---

#[tokio::test]
async fn search_echoes_query_and_user_agent() {
    let req = Request::builder()
        .uri("/search.json?q=rust+lang&apikey=secret")
        .header(http::header::USER_AGENT, "http://example.com")
        .body(String::new())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: SearchEcho = body_json(resp).await;
    assert_eq!(echo.request.method, "GET");
    assert_eq!(echo.request.parameters["q"], "rust lang");
    assert_eq!(echo.request.parameters["apikey"], "secret");
    assert_eq!(echo.request.user_agent.as_deref(), Some("http://example.com"));
    assert_eq!(echo.response.list.len(), 1);
}

#[tokio::test]
async fn search_accepts_form_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/search.json")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body("q=topsy&apikey=k".to_string())
        .unwrap();
    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: SearchEcho = body_json(resp).await;
    assert_eq!(echo.request.method, "POST");
    assert_eq!(echo.request.parameters["q"], "topsy");
    assert!(echo.request.user_agent.is_none());
}

// --- fallback ---

#[tokio::test]
async fn unknown_endpoint_is_plain_text_404_with_quota() {
    let resp = app().oneshot(get_request("/nope.json")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&resp, "X-RateLimit-Limit"), RATE_LIMIT.to_string());
    let body = body_bytes(resp).await;
    assert_eq!(&body[..], b"no such endpoint");
    assert!(serde_json::from_slice::<serde_json::Value>(&body).is_err());
}

// --- quota across requests ---

#[tokio::test]
async fn remaining_decrements_per_request() {
    use tower::Service;

    let mut app = app().into_service();

    for expected in [RATE_LIMIT - 1, RATE_LIMIT - 2, RATE_LIMIT - 3] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(get_request("/credit.json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "X-RateLimit-Remaining"), expected.to_string());
    }

    // 404s spend quota too
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(get_request("/missing.json"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(header(&resp, "X-RateLimit-Remaining"), (RATE_LIMIT - 4).to_string());
}
