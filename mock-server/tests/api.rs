use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, Hits, JSON_FIXTURE, QUERY_FIXTURE, XML_FIXTURE};
use tower::{Service, ServiceExt};

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(String::new())
        .unwrap()
}

// --- status ---

#[tokio::test]
async fn status_route_returns_requested_code() {
    let resp = app().oneshot(request("GET", "/status/503")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_bytes(resp).await, "status 503");
}

#[tokio::test]
async fn status_route_accepts_any_method() {
    for method in ["POST", "PUT", "PATCH", "DELETE", "OPTIONS"] {
        let resp = app().oneshot(request(method, "/status/404")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method}");
    }
}

#[tokio::test]
async fn status_route_rejects_invalid_code() {
    let resp = app().oneshot(request("GET", "/status/42")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- flaky ---

#[tokio::test]
async fn flaky_fails_then_recovers_and_counts_hits() {
    let mut app = app().into_service();

    for expected in [StatusCode::SERVICE_UNAVAILABLE, StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(request("GET", "/flaky/job/2"))
            .await
            .unwrap();
        assert_eq!(resp.status(), expected);
    }

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/hits/job"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let hits: Hits = body_json(resp).await;
    assert_eq!(hits, Hits { key: "job".to_string(), count: 3 });
}

#[tokio::test]
async fn flaky_keys_are_independent() {
    let mut app = app().into_service();

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/flaky/a/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(request("GET", "/flaky/b/1"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn hits_for_unknown_key_is_zero() {
    let resp = app().oneshot(request("GET", "/hits/nobody")).await.unwrap();
    let hits: Hits = body_json(resp).await;
    assert_eq!(hits.count, 0);
}

// --- echo ---

#[tokio::test]
async fn echo_reflects_method_query_headers_and_body() {
    let req = Request::builder()
        .method("PUT")
        .uri("/echo?a=1&b=two")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header("X-Trace", "abc")
        .header("Accept", "*/*")
        .body("k=v".to_string())
        .unwrap();

    let resp = app().oneshot(req).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PUT");
    assert_eq!(echo.query.as_deref(), Some("a=1&b=two"));
    assert_eq!(echo.content_type.as_deref(), Some("application/x-www-form-urlencoded"));
    assert_eq!(echo.custom_headers.get("x-trace").map(String::as_str), Some("abc"));
    assert!(!echo.custom_headers.contains_key("accept"));
    assert_eq!(echo.body, "k=v");
}

#[tokio::test]
async fn echo_without_query_reports_none() {
    let resp = app().oneshot(request("GET", "/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert!(echo.query.is_none());
    assert!(echo.body.is_empty());
}

// --- fixtures ---

#[tokio::test]
async fn fixtures_serve_expected_bodies() {
    let resp = app().oneshot(request("GET", "/json")).await.unwrap();
    assert_eq!(resp.headers()[http::header::CONTENT_TYPE], "application/json");
    assert_eq!(body_bytes(resp).await, JSON_FIXTURE);

    let resp = app().oneshot(request("GET", "/xml")).await.unwrap();
    assert_eq!(body_bytes(resp).await, XML_FIXTURE);

    let resp = app().oneshot(request("GET", "/query")).await.unwrap();
    assert_eq!(body_bytes(resp).await, QUERY_FIXTURE);

    let resp = app().oneshot(request("GET", "/text")).await.unwrap();
    assert_eq!(body_bytes(resp).await, "hello, failover");
}

#[tokio::test]
async fn empty_returns_no_content() {
    let resp = app().oneshot(request("GET", "/empty")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn slow_eventually_answers() {
    let resp = app().oneshot(request("GET", "/slow/10")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await, "finally");
}
