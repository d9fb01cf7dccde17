//! Failure injection tests for the upstream client.

use askgate::client::{ApiClient, ClientError, Upstream};
use askgate::config::{GatewayConfig, HealthConfig};
use askgate::health::{HealthMonitor, HealthStatus};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod common;

fn client(config: &GatewayConfig) -> ApiClient {
    ApiClient::new(&config.api, &config.rate_limit, &config.proxy, common::TEST_COOKIE).unwrap()
}

fn with_proxies(mut config: GatewayConfig, proxies: &[std::net::SocketAddr]) -> GatewayConfig {
    config.proxy.enabled = true;
    config.proxy.rotation = true;
    config.proxy.proxies = proxies.iter().map(|a| a.to_string()).collect();
    config
}

#[tokio::test]
async fn test_retry_on_failure() {
    let upstream = common::start_programmable_upstream(|n| {
        if n < 2 {
            (503, "Service Unavailable".into())
        } else {
            (200, r#"{"answer":"4"}"#.into())
        }
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(&upstream.url(), dir.path());

    let answer = client(&config).request("2+2").await;

    assert_eq!(answer.unwrap(), "4", "should eventually succeed after retries");
    assert_eq!(upstream.calls(), 3);
}

#[tokio::test]
async fn test_retries_exhausted() {
    let upstream = common::start_programmable_upstream(|_| (500, "boom".into())).await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(&upstream.url(), dir.path());

    let err = client(&config).request("2+2").await.unwrap_err();

    assert_eq!(err, ClientError::Status(500));
    assert_eq!(upstream.calls() as u32, config.api.max_retries + 1);
}

#[tokio::test]
async fn test_malformed_responses_are_distinct() {
    let html = common::start_programmable_upstream(|_| (200, "<html>blocked</html>".into())).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(&html.url(), dir.path());
    config.api.max_retries = 1;

    let err = client(&config).request("q").await.unwrap_err();
    assert!(matches!(err, ClientError::MalformedBody(_)), "got {err:?}");
    assert!(err.is_malformed_response());
    assert_eq!(html.calls(), 2, "malformed bodies are retried too");

    let wrong_field = common::start_programmable_upstream(|_| (200, r#"{"text":"4"}"#.into())).await;
    config.api.base_url = wrong_field.url();
    let err = client(&config).request("q").await.unwrap_err();
    assert_eq!(err, ClientError::MissingField("answer".into()));
}

#[tokio::test]
async fn test_suspect_status_blacklists_proxy() {
    let good = common::start_answering_upstream("4").await;
    let bad = common::start_programmable_upstream(|_| (403, "denied".into())).await;
    let dir = tempfile::tempdir().unwrap();
    let config = with_proxies(common::test_config(&good.url(), dir.path()), &[bad.addr, good.addr]);

    let client = client(&config);
    assert_eq!(client.request("2+2").await.unwrap(), "4");

    let pool = client.proxies().unwrap();
    assert!(pool.is_blacklisted(&format!("http://{}", bad.addr)));
    assert!(!pool.is_blacklisted(&format!("http://{}", good.addr)));
    assert_eq!((bad.calls(), good.calls()), (1, 1));

    // The blacklisted proxy is skipped from now on
    client.request("3+3").await.unwrap();
    assert_eq!(bad.calls(), 1);

    // Proxied requests carry the absolute target URL
    let proxied = &good.requests()[0];
    assert!(proxied.request_line.contains(&format!("http://{}/chat/async", good.addr)));
}

#[tokio::test]
async fn test_connection_failure_blacklists_proxy() {
    let good = common::start_answering_upstream("4").await;
    let dead = common::refusing_addr().await;
    let dir = tempfile::tempdir().unwrap();
    let config = with_proxies(common::test_config(&good.url(), dir.path()), &[dead, good.addr]);

    let client = client(&config);
    assert_eq!(client.request("2+2").await.unwrap(), "4");
    assert!(client.proxies().unwrap().is_blacklisted(&format!("http://{}", dead)));
}

#[tokio::test]
async fn test_malformed_body_does_not_blame_proxy() {
    let garbage = common::start_programmable_upstream(|_| (200, "not json".into())).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_proxies(common::test_config(&garbage.url(), dir.path()), &[garbage.addr]);
    config.api.max_retries = 1;

    let client = client(&config);
    assert!(client.request("q").await.unwrap_err().is_malformed_response());
    assert_eq!(client.proxies().unwrap().available(), 1);
}

#[tokio::test]
async fn test_blacklist_self_heals() {
    let bad = common::start_programmable_upstream(|_| (502, "bad gateway".into())).await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = with_proxies(common::test_config(&bad.url(), dir.path()), &[bad.addr]);
    config.api.max_retries = 2;

    let err = client(&config).request("q").await.unwrap_err();

    // The only proxy keeps being re-admitted instead of leaving no route at all
    assert_eq!(err, ClientError::Status(502));
    assert_eq!(bad.calls(), 3);
}

#[tokio::test]
async fn test_timeout() {
    let hole = common::start_black_hole().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::test_config(&format!("http://{}", hole), dir.path());
    config.api.timeout_secs = 1;
    config.api.max_retries = 1;

    let start = Instant::now();
    let err = client(&config).request("q").await.unwrap_err();

    assert_eq!(err, ClientError::Timeout);
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test]
async fn test_hung_upstream_does_not_stall_probe_cycle() {
    let hole = common::start_black_hole().await;
    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(&format!("http://{}", hole), dir.path());

    let upstream: Arc<dyn Upstream> = Arc::new(client(&config));
    let health = HealthConfig {
        probe_timeout_secs: 1,
        ..HealthConfig::default()
    };
    let monitor = HealthMonitor::new(upstream, &health).unwrap();

    let start = Instant::now();
    let report = monitor.probe_now().await;

    assert_eq!(report.status, HealthStatus::Down);
    assert_eq!(report.failure_count, 3);
    assert!(start.elapsed() < Duration::from_secs(3), "probe waited for client retries");
}
