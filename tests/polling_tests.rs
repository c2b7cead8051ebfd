//! End-to-end job polling tests against a mock HTTP server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use watsonx_client::{
    BatchService, BatchStatus, ExtractionService, ExtractionStatus, PollConfig, WatsonxClient,
    WatsonxConfig, WatsonxError,
};

async fn test_client() -> (WatsonxClient, MockServer) {
    let server = MockServer::start().await;
    let config = WatsonxConfig::builder()
        .api_key("test-key")
        .base_url(server.uri())
        .build()
        .unwrap();
    (WatsonxClient::new(config).unwrap(), server)
}

fn fast_config() -> PollConfig {
    PollConfig {
        initial_delay: Duration::from_millis(1),
        growth_factor: 2,
        max_delay: Duration::from_millis(5),
        deadline: Duration::from_secs(10),
    }
}

#[tokio::test]
async fn batch_job_polls_until_completed() {
    let (client, server) = test_client().await;

    for status in ["queued", "running"] {
        Mock::given(method("GET"))
            .and(path("/ml/v1/batches/batch-1"))
            .and(query_param("version", "2024-05-31"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                format!(r#"{{"id":"batch-1","status":"{status}"}}"#),
                "application/json",
            ))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/ml/v1/batches/batch-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"batch-1","status":"completed","completed_at":"2025-01-01T00:03:00Z"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let job = client
        .batches()
        .wait_for_completion("batch-1", &fast_config())
        .await
        .unwrap();

    assert_eq!(job.status, BatchStatus::Completed);
    assert!(job.is_terminal());
    // Two pending fetches plus the terminal one.
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn batch_job_failure_carries_remote_detail() {
    let (client, server) = test_client().await;

    Mock::given(method("GET"))
        .and(path("/ml/v1/batches/batch-2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"batch-2","status":"failed","error":{"code":"oom","message":"out of memory"}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let result = client
        .batches()
        .wait_for_completion("batch-2", &fast_config())
        .await;

    match result {
        Err(WatsonxError::JobFailed { message, job_id }) => {
            assert_eq!(message, "out of memory");
            assert_eq!(job_id.as_deref(), Some("batch-2"));
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn polling_deadline_yields_typed_timeout() {
    let (client, server) = test_client().await;

    Mock::given(method("GET"))
        .and(path("/ml/v1/batches/batch-3"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"batch-3","status":"running"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let config = PollConfig {
        initial_delay: Duration::from_millis(5),
        growth_factor: 2,
        max_delay: Duration::from_millis(10),
        deadline: Duration::from_millis(50),
    };
    let result = client.batches().wait_for_completion("batch-3", &config).await;

    match result {
        Err(WatsonxError::PollTimeout { operation, elapsed }) => {
            assert_eq!(operation, "batch job");
            assert!(elapsed >= Duration::from_millis(50));
        }
        other => panic!("expected PollTimeout, got {other:?}"),
    }
}

#[tokio::test]
async fn extraction_job_polls_until_completed() {
    let (client, server) = test_client().await;

    Mock::given(method("GET"))
        .and(path("/ml/v1/text/extractions/ext-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"metadata":{"id":"ext-1"},"entity":{"results":{"status":"running","number_pages_processed":2}}}"#,
            "application/json",
        ))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ml/v1/text/extractions/ext-1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"metadata":{"id":"ext-1"},"entity":{"results":{"status":"completed","number_pages_processed":9}}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let job = client
        .extractions()
        .wait_for_completion("ext-1", &fast_config())
        .await
        .unwrap();

    assert_eq!(job.status(), ExtractionStatus::Completed);
    assert_eq!(job.entity.results.number_pages_processed, Some(9));
}

#[tokio::test]
async fn batch_create_then_wait_round_trip() {
    let (client, server) = test_client().await;

    Mock::given(method("POST"))
        .and(path("/ml/v1/batches"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"batch-9","status":"queued","created_at":"2025-01-01T00:00:00Z"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/ml/v1/batches/batch-9"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"id":"batch-9","status":"completed"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let batches = client.batches();
    let request = watsonx_client::BatchRequest::new(
        "ibm/granite-3-8b-instruct",
        watsonx_client::DataReference::connection_asset("conn-1", "input.jsonl"),
        watsonx_client::DataReference::connection_asset("conn-1", "output/"),
    );
    let created = batches.create(request).await.unwrap();
    assert_eq!(created.status, BatchStatus::Queued);

    let done = batches
        .wait_for_completion(&created.id, &fast_config())
        .await
        .unwrap();
    assert_eq!(done.status, BatchStatus::Completed);
}
