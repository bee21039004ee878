//! End-to-end forwarding tests for the proxy.

use std::net::SocketAddr;
use std::time::Duration;

use forwarding_proxy::config::resolver::{
    resolve_transport, DependencyRegistry, FactoryFn, OptionsSource,
};
use forwarding_proxy::config::{ConfigError, ProxyConfig, TransportOptions};
use forwarding_proxy::http::HttpServer;
use forwarding_proxy::proxy::ForwardingEngine;

mod common;

/// Spin up the proxy on `proxy_addr`, forwarding to `backend_addr`.
async fn start_proxy(backend_addr: SocketAddr, proxy_addr: SocketAddr) {
    let transport = TransportOptions {
        target: format!("http://{backend_addr}"),
        ..Default::default()
    };
    let engine = ForwardingEngine::new(transport).unwrap();

    let mut config = ProxyConfig::default();
    config.listener.bind_address = proxy_addr.to_string();

    let server = HttpServer::new(engine, &config);
    let listener = tokio::net::TcpListener::bind(proxy_addr).await.unwrap();
    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
}

fn test_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_json_body_is_reserialized() {
    let backend_addr: SocketAddr = "127.0.0.1:28211".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28212".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    // Extra whitespace proves the body was re-serialized, not copied
    let res = test_client()
        .post(format!("http://{proxy_addr}/api/x"))
        .header("content-type", "application/json")
        .body("{ \"a\" : 1 }")
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200);

    let request = captured.recv().await.unwrap();
    assert_eq!(request.body, br#"{"a":1}"#);
    assert_eq!(request.header("content-length").as_deref(), Some("7"));
    assert!(request.head.starts_with("POST /api/x "));
}

#[tokio::test]
async fn test_json_round_trips_to_original_value() {
    let backend_addr: SocketAddr = "127.0.0.1:28213".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28214".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    let original = serde_json::json!({"user": "ada", "roles": ["admin", "dev"], "active": true});
    let res = test_client()
        .post(format!("http://{proxy_addr}/api/users"))
        .json(&original)
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200);

    let request = captured.recv().await.unwrap();
    let reparsed: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(reparsed, original);
    assert_eq!(
        request.header("content-length").as_deref(),
        Some(request.body.len().to_string().as_str())
    );
}

#[tokio::test]
async fn test_form_body_is_reserialized_in_order() {
    let backend_addr: SocketAddr = "127.0.0.1:28215".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28216".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    // Percent-encoded digit decodes to "1"; re-serialization normalizes it
    let res = test_client()
        .post(format!("http://{proxy_addr}/form"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body("a=%31&b=2")
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200);

    let request = captured.recv().await.unwrap();
    assert_eq!(request.body, b"a=1&b=2");
    assert_eq!(request.header("content-length").as_deref(), Some("7"));
}

#[tokio::test]
async fn test_unknown_content_type_passes_through_unmodified() {
    let backend_addr: SocketAddr = "127.0.0.1:28217".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28218".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    let payload = "col1,col2\r\nval with spaces,2\r\n";
    let res = test_client()
        .post(format!("http://{proxy_addr}/upload"))
        .header("content-type", "text/csv")
        .body(payload)
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200);

    let request = captured.recv().await.unwrap();
    assert_eq!(request.body, payload.as_bytes());
    assert_eq!(
        request.header("content-length").as_deref(),
        Some(payload.len().to_string().as_str())
    );
}

#[tokio::test]
async fn test_empty_body_writes_no_payload() {
    let backend_addr: SocketAddr = "127.0.0.1:28219".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28220".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    let res = test_client()
        .get(format!("http://{proxy_addr}/health"))
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 200);

    let request = captured.recv().await.unwrap();
    assert!(request.body.is_empty());
    assert!(request.head.starts_with("GET /health "));
    // No rewrite happened, so no content-length override either.
    assert!(request
        .header("content-length")
        .map_or(true, |v| v == "0"));
}

#[tokio::test]
async fn test_host_header_rewritten_to_upstream() {
    let backend_addr: SocketAddr = "127.0.0.1:28221".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28222".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    test_client()
        .get(format!("http://{proxy_addr}/"))
        .send()
        .await
        .expect("proxy unreachable");

    let request = captured.recv().await.unwrap();
    assert_eq!(
        request.header("host").as_deref(),
        Some(backend_addr.to_string().as_str())
    );
}

#[tokio::test]
async fn test_concurrent_requests_do_not_cross_contaminate() {
    let backend_addr: SocketAddr = "127.0.0.1:28223".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28224".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    let client = test_client();
    let mut handles = Vec::new();
    for i in 0..10 {
        let client = client.clone();
        let url = format!("http://{proxy_addr}/item/{i}");
        handles.push(tokio::spawn(async move {
            client
                .post(url)
                .header("content-type", "application/json")
                .body(format!("{{\"i\": {i}}}"))
                .send()
                .await
                .expect("proxy unreachable")
                .status()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let mut seen = Vec::new();
    for _ in 0..10 {
        let request = captured.recv().await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        seen.push(value["i"].as_i64().unwrap());
    }
    seen.sort_unstable();
    assert_eq!(seen, (0..10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_malformed_json_is_rejected_not_forwarded() {
    let backend_addr: SocketAddr = "127.0.0.1:28225".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28226".parse().unwrap();
    let mut captured = common::start_capture_backend(backend_addr).await;
    start_proxy(backend_addr, proxy_addr).await;

    let res = test_client()
        .post(format!("http://{proxy_addr}/api/x"))
        .header("content-type", "application/json")
        .body("{definitely not json")
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 400);

    // Nothing reached the upstream
    let nothing = tokio::time::timeout(Duration::from_millis(300), captured.recv()).await;
    assert!(nothing.is_err());
}

#[tokio::test]
async fn test_unreachable_upstream_maps_to_bad_gateway() {
    // No backend listening on this port
    let backend_addr: SocketAddr = "127.0.0.1:28227".parse().unwrap();
    let proxy_addr: SocketAddr = "127.0.0.1:28228".parse().unwrap();
    start_proxy(backend_addr, proxy_addr).await;

    let res = test_client()
        .get(format!("http://{proxy_addr}/"))
        .send()
        .await
        .expect("proxy unreachable");
    assert_eq!(res.status(), 502);
}

#[tokio::test]
async fn test_rejecting_factory_fails_construction() {
    let factory: FactoryFn = std::sync::Arc::new(|_| {
        Box::pin(async { Err(ConfigError::Factory("config service down".into())) })
    });
    let source = OptionsSource::Factory {
        factory,
        inject: vec![],
    };

    let result = resolve_transport(source, &DependencyRegistry::new()).await;
    let err = result.expect_err("construction must fail");
    assert!(matches!(err, ConfigError::Factory(_)));
    // No transport options were produced, so no engine can be built
}
