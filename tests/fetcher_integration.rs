//! Integration tests for the retrying fetcher against a mock upstream

use badge_aggregator::refresh::{FetchError, Fetcher, RetryPolicy};
use core::time::Duration;
use std::time::Instant;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fetcher(max_retries: u32, base_delay: Duration, timeout: Duration) -> Fetcher {
    Fetcher::new(
        "badge-aggregator-tests",
        RetryPolicy {
            timeout,
            max_retries,
            base_delay,
        },
    )
    .expect("Failed to create fetcher")
}

fn url(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{route}", server.uri())).expect("Failed to build mock URL")
}

#[tokio::test]
async fn test_success_returns_document() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/badges.json"))
        .and(header("user-agent", "badge-aggregator-tests"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"1": []})))
        .expect(1)
        .mount(&server)
        .await;

    let value = fetcher(3, Duration::from_millis(10), Duration::from_secs(5))
        .fetch_json(&url(&server, "/badges.json"))
        .await
        .expect("Fetch should succeed");

    assert_eq!(value, serde_json::json!({"1": []}));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(3, Duration::from_millis(10), Duration::from_secs(5))
        .fetch_json(&url(&server, "/gone.json"))
        .await;

    match result {
        Err(FetchError::Terminal { status, .. }) => assert_eq!(status.as_u16(), 404),
        other => panic!("Expected a terminal error, got {other:?}"),
    }
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(1));
}

#[tokio::test]
async fn test_server_error_exhausts_retries_with_backoff() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let base_delay = Duration::from_millis(50);
    let started = Instant::now();
    let result = fetcher(2, base_delay, Duration::from_secs(5))
        .fetch_json(&url(&server, "/flaky.json"))
        .await;

    match result {
        Err(FetchError::Exhausted { attempts, .. }) => assert_eq!(attempts, 3),
        other => panic!("Expected exhausted retries, got {other:?}"),
    }

    // 50ms before the first retry, 100ms before the second
    assert!(started.elapsed() >= Duration::from_millis(150));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/badges.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/badges.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;

    let value = fetcher(3, Duration::from_millis(10), Duration::from_secs(5))
        .fetch_json(&url(&server, "/badges.json"))
        .await
        .expect("Second attempt should succeed");

    assert_eq!(value, serde_json::json!([]));
    assert_eq!(server.received_requests().await.map(|r| r.len()), Some(2));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}").set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let result = fetcher(1, Duration::from_millis(10), Duration::from_millis(100))
        .fetch_json(&url(&server, "/slow.json"))
        .await;

    match result {
        Err(FetchError::Exhausted { attempts, last, .. }) => {
            assert_eq!(attempts, 2);
            assert!(last.contains("timed out"), "unexpected cause: {last}");
        }
        other => panic!("Expected a timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1)
        .mount(&server)
        .await;

    let result = fetcher(3, Duration::from_millis(10), Duration::from_secs(5))
        .fetch_json(&url(&server, "/broken.json"))
        .await;

    assert!(matches!(result, Err(FetchError::Malformed { .. })), "got {result:?}");
}
