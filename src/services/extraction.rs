//! Text extraction job service.

use async_trait::async_trait;

use crate::errors::{WatsonxError, WatsonxResult};
use crate::polling::{poll_until_done, PollConfig, PollState, PollableResource};
use crate::types::extraction::{ExtractionJob, ExtractionRequest, ExtractionStatus};

const EXTRACTIONS_PATH: &str = "/ml/v1/text/extractions";

impl PollableResource for ExtractionJob {
    fn job_id(&self) -> Option<String> {
        Some(self.metadata.id.clone())
    }

    fn poll_state(&self) -> PollState {
        match self.status() {
            ExtractionStatus::Completed => PollState::Succeeded,
            ExtractionStatus::Failed => PollState::Failed(
                self.entity
                    .results
                    .error
                    .as_ref()
                    .map_or_else(|| "extraction failed".to_string(), |e| e.message.clone()),
            ),
            ExtractionStatus::Submitted | ExtractionStatus::Running => PollState::Pending,
        }
    }
}

/// Text extraction job service.
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Starts an extraction job.
    async fn create(&self, request: ExtractionRequest) -> WatsonxResult<ExtractionJob>;

    /// Fetches an extraction job by id.
    async fn get(&self, id: &str) -> WatsonxResult<ExtractionJob>;

    /// Deletes an extraction job and its stored results.
    async fn delete(&self, id: &str) -> WatsonxResult<()>;

    /// Polls an extraction job until it reaches a terminal state.
    async fn wait_for_completion(
        &self,
        id: &str,
        config: &PollConfig,
    ) -> WatsonxResult<ExtractionJob>;
}

/// Default implementation of the extraction service.
pub struct DefaultExtractionService<T> {
    transport: T,
}

impl<T> DefaultExtractionService<T> {
    /// Creates a new extraction service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> ExtractionService for DefaultExtractionService<T>
where
    T: crate::transport::HttpTransport + Send + Sync,
{
    async fn create(&self, request: ExtractionRequest) -> WatsonxResult<ExtractionJob> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let response = self.transport.post(EXTRACTIONS_PATH, body).await?;
        serde_json::from_slice(&response).map_err(|e| WatsonxError::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response).to_string(),
        })
    }

    async fn get(&self, id: &str) -> WatsonxResult<ExtractionJob> {
        let response = self
            .transport
            .get(&format!("{EXTRACTIONS_PATH}/{id}"))
            .await?;
        serde_json::from_slice(&response).map_err(|e| WatsonxError::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response).to_string(),
        })
    }

    async fn delete(&self, id: &str) -> WatsonxResult<()> {
        self.transport
            .delete(&format!("{EXTRACTIONS_PATH}/{id}"))
            .await?;
        Ok(())
    }

    async fn wait_for_completion(
        &self,
        id: &str,
        config: &PollConfig,
    ) -> WatsonxResult<ExtractionJob> {
        poll_until_done("text extraction", config, || self.get(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockTransport;
    use std::time::Duration;

    fn job_body(status: &str) -> String {
        format!(
            r#"{{"metadata":{{"id":"ext-1"}},"entity":{{"results":{{"status":"{status}"}}}}}}"#
        )
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            initial_delay: Duration::from_millis(1),
            growth_factor: 2,
            max_delay: Duration::from_millis(2),
            deadline: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn test_wait_for_completion() {
        let transport = MockTransport::new();
        transport.enqueue_response(&job_body("submitted"));
        transport.enqueue_response(&job_body("running"));
        transport.enqueue_response(&job_body("completed"));
        let service = DefaultExtractionService::new(transport);

        let job = service
            .wait_for_completion("ext-1", &fast_config())
            .await
            .unwrap();

        assert_eq!(job.status(), ExtractionStatus::Completed);
    }

    #[tokio::test]
    async fn test_failed_extraction_reports_detail() {
        let transport = MockTransport::new();
        transport.enqueue_response(
            r#"{"metadata":{"id":"ext-1"},"entity":{"results":{"status":"failed","error":{"code":"bad_doc","message":"document corrupted"}}}}"#,
        );
        let service = DefaultExtractionService::new(transport);

        let result = service.wait_for_completion("ext-1", &fast_config()).await;

        match result {
            Err(WatsonxError::JobFailed { message, .. }) => {
                assert_eq!(message, "document corrupted");
            }
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }
}
