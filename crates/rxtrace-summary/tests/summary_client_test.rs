//! Contract tests for SummaryClient against a mock summarization service.
//!
//! ## Endpoints Tested
//!
//! | Method | Path | Test |
//! |--------|------|------|
//! | POST   | `/v1/summaries` | `summarize_*`, `retry_*` |

use rxtrace_core::{Alert, AlertId, BatchId, Severity, Timestamp};
use std::time::Duration;

use rxtrace_summary::{RetryPolicy, SummaryClient, SummaryConfig, SummaryError};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(mock_server: &MockServer, token: Option<&str>) -> SummaryClient {
    let mut config = SummaryConfig::new(&mock_server.uri()).unwrap();
    config.api_token = token.map(str::to_string);
    config.timeout_secs = 5;
    SummaryClient::new(config)
        .unwrap()
        .with_retry_policy(fast_retries(2))
}

fn fast_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        base_delay: Duration::from_millis(5),
        max_delay: Duration::from_millis(20),
    }
}

fn alert(id: &str, details: &str) -> Alert {
    Alert {
        alert_id: AlertId::new(id).unwrap(),
        batch_id: BatchId::new("B-1").unwrap(),
        timestamp: Timestamp::parse("2026-03-01T08:00:00Z").unwrap(),
        alert_type: "Temperature Excursion".into(),
        severity: Severity::High,
        details: details.into(),
    }
}

#[tokio::test]
async fn summarize_posts_alerts_and_returns_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .and(header("authorization", "Bearer sum-token"))
        .and(body_json(serde_json::json!({
            "alerts": [{
                "alertId": "A-1",
                "batchId": "B-1",
                "timestamp": "2026-03-01T08:00:00Z",
                "type": "Temperature Excursion",
                "details": "8.4C for 40 minutes"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": "One high-severity cold-chain breach."
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let a = alert("A-1", "8.4C for 40 minutes");
    let summary = client(&mock_server, Some("sum-token"))
        .summarize(&[&a])
        .await
        .unwrap();
    assert_eq!(summary, "One high-severity cold-chain breach.");
}

#[tokio::test]
async fn summarize_surfaces_service_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
        .expect(3)
        .mount(&mock_server)
        .await;

    let a = alert("A-1", "");
    match client(&mock_server, None).summarize(&[&a]).await.unwrap_err() {
        SummaryError::Api { status, body, .. } => {
            assert_eq!(status, 503);
            assert_eq!(body, "model overloaded");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn summarize_rejects_malformed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "x"})))
        .mount(&mock_server)
        .await;

    let a = alert("A-1", "");
    let err = client(&mock_server, None).summarize(&[&a]).await.unwrap_err();
    assert!(matches!(err, SummaryError::Deserialization { .. }));
}

#[tokio::test]
async fn summarize_empty_list_makes_no_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = client(&mock_server, None).summarize(&[]).await.unwrap_err();
    assert!(matches!(err, SummaryError::NoAlerts));
}

#[tokio::test]
async fn base_path_is_preserved() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/summarizer/v1/summaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"summary": "ok"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SummaryConfig::new(&format!("{}/summarizer", mock_server.uri())).unwrap();
    let a = alert("A-1", "");
    let summary = SummaryClient::new(config).unwrap().summarize(&[&a]).await.unwrap();
    assert_eq!(summary, "ok");
}

#[tokio::test]
async fn retry_recovers_after_transient_unavailability() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "summary": "recovered"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let a = alert("A-1", "");
    let summary = client(&mock_server, None).summarize(&[&a]).await.unwrap();
    assert_eq!(summary, "recovered");
}

#[tokio::test]
async fn retry_stops_on_final_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let a = alert("A-1", "");
    let err = client(&mock_server, None).summarize(&[&a]).await.unwrap_err();
    assert!(matches!(err, SummaryError::Api { status: 500, .. }));
}

#[tokio::test]
async fn retry_budget_is_configurable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/summaries"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = SummaryConfig::new(&mock_server.uri()).unwrap();
    let client = SummaryClient::new(config)
        .unwrap()
        .with_retry_policy(RetryPolicy::none());
    let a = alert("A-1", "");
    let err = client.summarize(&[&a]).await.unwrap_err();
    assert!(matches!(err, SummaryError::Api { status: 502, .. }));
}

#[tokio::test]
async fn retry_gives_up_on_refused_connection() {
    let config = SummaryConfig::new("http://127.0.0.1:1/").unwrap();
    let client = SummaryClient::new(config)
        .unwrap()
        .with_retry_policy(fast_retries(1));
    let a = alert("A-1", "");
    let err = client.summarize(&[&a]).await.unwrap_err();
    assert!(matches!(err, SummaryError::Http { .. }));
}
