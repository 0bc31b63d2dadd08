//! Proxy log output tests
//!
//! Kept in their own binary so the installed subscriber only ever sees
//! this file's requests.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{scripted_fetcher, success_body, Reply, ScriptedTransport};
use std::io::Write;
use std::sync::{Arc, Mutex};
use tour_proxy::cache::create_cache;
use tour_proxy::config::ProxyConfig;
use tour_proxy::proxy::{router, ProxyState};
use tower::ServiceExt;

const KEY: &str = "ABCD1234";

/// In-memory log sink shared with the subscriber
#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_retried_miss_logs_without_credential() {
    let logs = LogBuffer::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let transport = ScriptedTransport::new(vec![
        Reply::status(503, format!("busy, key {} throttled", KEY)),
        Reply::ok(success_body(serde_json::json!([{"contentid": "1"}]))),
    ]);
    let config = ProxyConfig {
        upstream_base: "http://upstream.test/B551011".to_string(),
        service_key: Some(KEY.to_string()),
        ..ProxyConfig::default()
    };
    let cache = create_cache(config.cache.clone());
    let state = Arc::new(ProxyState::with_parts(config, cache, scripted_fetcher(&transport, 2)));

    let request = Request::builder()
        .method("GET")
        .uri("/KorService2/areaBasedList2?areaCode=1")
        .body(Body::empty())
        .unwrap();
    let response = router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    state.flush_cache_writes().await;

    // The upstream really was asked with the key
    assert_eq!(transport.calls(), 2);
    assert!(transport.urls()[0].contains("serviceKey=ABCD1234"));

    let output = logs.contents();
    assert!(output.contains("Fetched"), "missing fetch log: {}", output);
    assert!(output.contains("Attempt 1/3"), "missing retry log: {}", output);
    assert!(output.contains("serviceKey=[REDACTED]"), "got {}", output);
    assert!(!output.contains(KEY), "credential leaked into logs: {}", output);
}
