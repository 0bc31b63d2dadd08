//! End-to-end tests over real sockets
//!
//! client → proxy (bound on an ephemeral port) → mockito upstream.
//!
//! mockito's blocking server runs its own runtime, so these tests build
//! the tokio runtime by hand instead of using `#[tokio::test]`.

use mockito::Matcher;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tour_proxy::cache::CacheConfig;
use tour_proxy::client::{ApiClient, Endpoint, Locale, QueryParams};
use tour_proxy::config::{ClientConfig, ProxyConfig};
use tour_proxy::proxy::{serve_on, ProxyState};

const KEY: &str = "ABCD1234";

const AREA_LIST_BODY: &str = r#"{
  "response": {
    "header": {"resultCode": "0000", "resultMsg": "OK"},
    "body": {
      "items": {"item": [{"contentid": "126508", "title": "Gyeongbokgung", "areacode": "1"}]},
      "numOfRows": 12,
      "pageNo": 1,
      "totalCount": 1
    }
  }
}"#;

fn proxy_config(upstream_url: &str) -> ProxyConfig {
    ProxyConfig {
        upstream_base: format!("{}/B551011", upstream_url),
        service_key: Some(KEY.to_string()),
        max_retries: 2,
        ..ProxyConfig::default()
    }
}

fn client_config(proxy_addr: std::net::SocketAddr) -> ClientConfig {
    ClientConfig {
        proxy_url: format!("http://{}", proxy_addr),
        max_retries: 0,
        // Off, so every client call reaches the proxy
        cache: CacheConfig {
            enabled: false,
            ..CacheConfig::client_default()
        },
        ..ClientConfig::default()
    }
}

#[test]
fn test_second_call_is_served_from_edge_cache() {
    let mut upstream = mockito::Server::new();
    let mock = upstream
        .mock(
            "GET",
            Matcher::Regex(r"^/B551011/KorService2/areaBasedList2".to_string()),
        )
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("serviceKey".into(), KEY.into()),
            Matcher::UrlEncoded("areaCode".into(), "1".into()),
            Matcher::UrlEncoded("MobileOS".into(), "WEB".into()),
            Matcher::UrlEncoded("MobileApp".into(), "SoraMiro".into()),
            Matcher::UrlEncoded("_type".into(), "json".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(AREA_LIST_BODY)
        .expect(1)
        .create();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let state = Arc::new(ProxyState::new(proxy_config(&upstream.url())).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_on(listener, state.clone(), async move {
            let _ = shutdown_rx.await;
        }));

        let client = ApiClient::new(client_config(addr)).unwrap();
        let params = QueryParams::new().with("areaCode", "1");

        let first = client.search_by_area(Locale::Ko, &params).await.unwrap();
        assert_eq!(first.items().len(), 1);
        assert_eq!(first.items()[0]["title"], "Gyeongbokgung");

        state.flush_cache_writes().await;

        let second = client.search_by_area(Locale::Ko, &params).await.unwrap();
        assert_eq!(first, second);

        let url = client.request_url(Locale::Ko, Endpoint::AreaBasedList, &params);
        let raw = reqwest::get(&url).await.unwrap();
        assert_eq!(raw.status().as_u16(), 200);
        assert_eq!(raw.headers()["x-cache"], "HIT");
        assert_eq!(raw.headers()["access-control-allow-origin"], "*");
        assert!(!raw.text().await.unwrap().contains(KEY));

        assert_eq!(state.cache().stats().hits, 2);

        drop(client);
        shutdown_tx.send(()).unwrap();
        server.await.unwrap().unwrap();

        // Shutdown tears the edge cache down
        assert_eq!(state.cache().stats().entries, 0);
    });

    mock.assert();
}

#[test]
fn test_upstream_failure_reaches_client_redacted() {
    let mut upstream = mockito::Server::new();
    let mock = upstream
        .mock(
            "GET",
            Matcher::Regex(r"^/B551011/KorService2/detailCommon2".to_string()),
        )
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("bad gateway for serviceKey=ABCD1234")
        .expect(3)
        .create();

    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let state = Arc::new(ProxyState::new(proxy_config(&upstream.url())).unwrap());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(serve_on(listener, state.clone(), async move {
            let _ = shutdown_rx.await;
        }));

        let client = ApiClient::new(client_config(addr)).unwrap();
        let err = client
            .get_detail_common(Locale::Ko, "126508", None)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "UPSTREAM_ERROR");
        assert!(err.message.contains("API request failed (500)"), "got {}", err.message);
        assert!(err.message.contains("API request failed (502)"), "got {}", err.message);
        assert!(!err.message.contains(KEY), "credential leaked: {}", err.message);

        drop(client);
        shutdown_tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    });

    mock.assert();
}
