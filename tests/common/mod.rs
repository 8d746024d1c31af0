// Each integration test file is a separate binary; helpers not used in every
// binary would otherwise trigger dead_code warnings from clippy.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use link_preview_proxy::{
    error::{StoreError, StoreResult},
    handlers,
    preview::{build_http_client, BatchResolver, PreviewFetcher, CACHE_TTL},
    state::AppState,
    store::{ArcStore, InMemoryStore, KvStore},
};

pub const TEST_ALLOWED_ORIGIN: &str = "cloudbs.dev";

/// Fetcher wired to the given store with a short origin timeout.
pub fn test_fetcher(store: ArcStore) -> PreviewFetcher {
    let client = build_http_client(Duration::from_secs(5)).expect("Failed to build HTTP client");
    PreviewFetcher::new(store, client).with_store_timeout(Duration::from_millis(200))
}

pub fn test_resolver(store: ArcStore) -> BatchResolver {
    BatchResolver::new(test_fetcher(store))
}

/// Build the full application router over the given store.
pub fn create_test_app(store: ArcStore) -> Router {
    let state = AppState {
        resolver: test_resolver(store),
        allowed_origin: HeaderValue::from_static(TEST_ALLOWED_ORIGIN),
    };
    handlers::router(state)
}

/// A fresh in-memory store, returned both concretely and as a trait object.
pub fn memory_store() -> (InMemoryStore, ArcStore) {
    let store = InMemoryStore::new(1_000);
    let shared: ArcStore = Arc::new(store.clone());
    (store, shared)
}

/// Write `record` into the store the way a previous resolution would have.
pub async fn seed(store: &InMemoryStore, url: &str, record: Value) {
    store
        .put(url, &record.to_string(), CACHE_TTL)
        .await
        .expect("Failed to seed store");
}

/// Minimal HTML page with the given `<head>` content.
pub fn html_page(head: &str) -> String {
    format!("<!DOCTYPE html><html><head>{head}</head><body><p>content</p></body></html>")
}

// ── Failing stores ───────────────────────────────────────────────────────────

/// Store whose every call fails.
pub struct UnavailableStore;

#[async_trait]
impl KvStore for UnavailableStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Store that never answers within the test store timeout.
pub struct StalledStore;

#[async_trait]
impl KvStore for StalledStore {
    async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Duration) -> StoreResult<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

// ── Request helpers ──────────────────────────────────────────────────────────

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

pub async fn request(app: Router, method: Method, uri: &str) -> TestResponse {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    TestResponse {
        status,
        headers,
        text: String::from_utf8(bytes.to_vec()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> TestResponse {
    request(app, Method::GET, uri).await
}

/// Request previews for `urls` and return the record array.
pub async fn get_previews(app: Router, urls: &[&str]) -> Vec<Value> {
    let uri = format!("/?url={}", urls.join(","));
    let response = get(app, &uri).await;
    assert_eq!(response.status, StatusCode::OK, "body: {}", response.text);
    match response.json() {
        Value::Array(records) => records,
        other => panic!("expected an array of records, got {other}"),
    }
}

/// The single record for `url`; panics if there is not exactly one.
pub fn record_for<'a>(records: &'a [Value], url: &str) -> &'a Value {
    let matching: Vec<&Value> = records.iter().filter(|r| r["url"] == url).collect();
    assert_eq!(matching.len(), 1, "expected one record for {url}: {records:?}");
    matching[0]
}

/// Keys present on a record object.
pub fn keys(record: &Value) -> Vec<String> {
    let mut keys: Vec<String> = record
        .as_object()
        .expect("record is an object")
        .keys()
        .cloned()
        .collect();
    keys.sort();
    keys
}
