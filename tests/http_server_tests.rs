//! End-to-end HTTP Tests
//!
//! Serves the router on a real socket and talks to it with reqwest.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use zencache::{api::create_router, AppState, Cache, CacheOptions, Metrics};

// == Helper Functions ==

async fn spawn_server(options: CacheOptions) -> (SocketAddr, AppState) {
    let state = AppState::new(Arc::new(Cache::new(options)), Arc::new(Metrics::new()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = create_router(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

#[tokio::test]
async fn test_full_key_lifecycle() {
    let (addr, _state) = spawn_server(CacheOptions::new(1024 * 1024)).await;
    let client = reqwest::Client::new();

    let response = client
        .put(url(addr, "/v1/cache/session:42"))
        .json(&json!({"value": {"user": "ada", "roles": ["admin"]}}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(
        response.headers()["location"].to_str().unwrap(),
        "/v1/cache/session%3A42"
    );

    let response = client
        .get(url(addr, "/v1/cache/session:42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-cache-hit"], "true");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"user": "ada", "roles": ["admin"]}));

    let response = client
        .delete(url(addr, "/v1/cache/session:42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(url(addr, "/v1/cache/session:42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"error": "not found"}));
}

#[tokio::test]
async fn test_ttl_header_and_expiry() {
    let (addr, _state) = spawn_server(CacheOptions::new(1024).with_sweep_interval_ms(10)).await;
    let client = reqwest::Client::new();

    let response = client
        .post(url(addr, "/v1/cache/short?ttl=100"))
        .body("ephemeral")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client.get(url(addr, "/v1/cache/short")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let remaining: u64 = response.headers()["x-ttl-remaining"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(remaining <= 100);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    // reclaimed by the sweeper, so the miss count stays at zero
    let stats: Value = client
        .get(url(addr, "/v1/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["items"], 0);
    assert_eq!(stats["misses"], 0);
}

#[tokio::test]
async fn test_byte_capacity_eviction() {
    let (addr, state) = spawn_server(CacheOptions::new(24)).await;
    let client = reqwest::Client::new();

    for (key, value) in [("a", 1), ("b", 2), ("c", 3), ("d", 4)] {
        let response = client
            .put(url(addr, &format!("/v1/cache/{}", key)))
            .json(&json!({ "value": value }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = client.get(url(addr, "/v1/cache/a")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    for key in ["b", "c", "d"] {
        assert!(state.cache.has(key), "{} should survive", key);
    }

    let stats: Value = client
        .get(url(addr, "/v1/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["evictions"], 1);
    assert_eq!(stats["totalSizeBytes"], 24);
}

#[tokio::test]
async fn test_health_and_metrics() {
    let (addr, _state) = spawn_server(CacheOptions::new(1024).with_tiny_lfu(true)).await;
    let client = reqwest::Client::new();

    let health: Value = client
        .get(url(addr, "/health"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["ok"], true);

    let response = client.get(url(addr, "/metrics")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = response.text().await.unwrap();
    assert!(text.contains("zencache_lfu_enabled 1"));
    assert!(text.contains("zencache_capacity_bytes 1024"));
    assert!(text.contains("zencache_http_seconds_bucket{method=\"GET\",route=\"/health\",le=\"+Inf\"} 1"));
}
