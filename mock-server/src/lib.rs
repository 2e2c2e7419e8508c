use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

/// What `/echo` saw of the incoming request.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Echo {
    pub method: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    /// Headers whose name starts with `x-`, lowercased.
    pub custom_headers: HashMap<String, String>,
    pub body: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Hits {
    pub key: String,
    pub count: u32,
}

pub type HitCounter = Arc<RwLock<HashMap<String, u32>>>;

pub const JSON_FIXTURE: &str = r#"{"name":"widget","count":3}"#;
pub const XML_FIXTURE: &str = "<item><name>widget</name><count>3</count></item>";
pub const QUERY_FIXTURE: &str = "name=widget&count=3&tag=a+b";

pub fn app() -> Router {
    let hits: HitCounter = Arc::new(RwLock::new(HashMap::new()));
    Router::new()
        .route("/status/{code}", any(status))
        .route("/flaky/{key}/{failures}", any(flaky))
        .route("/hits/{key}", get(hit_count))
        .route("/echo", any(echo))
        .route("/slow/{ms}", any(slow))
        .route("/text", get(|| async { "hello, failover" }))
        .route("/query", get(|| async { QUERY_FIXTURE }))
        .route("/json", get(|| async { ([(header::CONTENT_TYPE, "application/json")], JSON_FIXTURE) }))
        .route("/xml", get(|| async { ([(header::CONTENT_TYPE, "application/xml")], XML_FIXTURE) }))
        .route("/empty", get(|| async { StatusCode::NO_CONTENT }))
        .with_state(hits)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn status(Path(code): Path<u16>) -> Result<(StatusCode, String), StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    Ok((status, format!("status {code}")))
}

/// Fails with 503 for the first `failures` hits on `key`, then succeeds.
async fn flaky(
    State(hits): State<HitCounter>,
    Path((key, failures)): Path<(String, u32)>,
) -> (StatusCode, &'static str) {
    let mut hits = hits.write().await;
    let count = hits.entry(key).or_insert(0);
    *count += 1;
    if *count <= failures {
        tracing::info!(attempt = *count, failures, "flaky endpoint failing");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    } else {
        (StatusCode::OK, "recovered")
    }
}

async fn hit_count(State(hits): State<HitCounter>, Path(key): Path<String>) -> Json<Hits> {
    let count = hits.read().await.get(&key).copied().unwrap_or(0);
    Json(Hits { key, count })
}

async fn echo(method: Method, RawQuery(query): RawQuery, headers: HeaderMap, body: Bytes) -> Json<Echo> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let custom_headers = headers
        .iter()
        .filter(|(name, _)| name.as_str().starts_with("x-"))
        .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
        .collect();
    Json(Echo {
        method: method.to_string(),
        query,
        content_type,
        custom_headers,
        body: String::from_utf8_lossy(&body).into_owned(),
    })
}

async fn slow(Path(ms): Path<u64>) -> impl IntoResponse {
    tokio::time::sleep(Duration::from_millis(ms)).await;
    (StatusCode::OK, "finally")
}
