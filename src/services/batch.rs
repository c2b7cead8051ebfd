//! Batch inference job service.

use async_trait::async_trait;

use crate::errors::{WatsonxError, WatsonxResult};
use crate::polling::{poll_until_done, PollConfig, PollState, PollableResource};
use crate::types::batch::{BatchJob, BatchJobList, BatchRequest, BatchStatus};

const BATCHES_PATH: &str = "/ml/v1/batches";

impl PollableResource for BatchJob {
    fn job_id(&self) -> Option<String> {
        Some(self.id.clone())
    }

    fn poll_state(&self) -> PollState {
        match self.status {
            BatchStatus::Completed => PollState::Succeeded,
            BatchStatus::Failed => PollState::Failed(
                self.error
                    .as_ref()
                    .map_or_else(|| "batch job failed".to_string(), |e| e.message.clone()),
            ),
            BatchStatus::Cancelled => PollState::Failed("batch job was cancelled".to_string()),
            BatchStatus::Queued | BatchStatus::Running => PollState::Pending,
        }
    }
}

/// Batch inference job service.
#[async_trait]
pub trait BatchService: Send + Sync {
    /// Creates a batch job.
    async fn create(&self, request: BatchRequest) -> WatsonxResult<BatchJob>;

    /// Fetches a batch job by id.
    async fn get(&self, id: &str) -> WatsonxResult<BatchJob>;

    /// Lists batch jobs.
    async fn list(&self) -> WatsonxResult<BatchJobList>;

    /// Requests cancellation of a batch job.
    async fn cancel(&self, id: &str) -> WatsonxResult<BatchJob>;

    /// Polls a batch job until it reaches a terminal state.
    ///
    /// Returns the completed job, [`WatsonxError::JobFailed`] if the job
    /// failed or was cancelled remotely, or [`WatsonxError::PollTimeout`]
    /// once the configured deadline passes.
    async fn wait_for_completion(&self, id: &str, config: &PollConfig) -> WatsonxResult<BatchJob>;
}

/// Default implementation of the batch service.
pub struct DefaultBatchService<T> {
    transport: T,
}

impl<T> DefaultBatchService<T> {
    /// Creates a new batch service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T> DefaultBatchService<T>
where
    T: crate::transport::HttpTransport + Send + Sync,
{
    fn decode<R: serde::de::DeserializeOwned>(response: &[u8]) -> WatsonxResult<R> {
        serde_json::from_slice(response).map_err(|e| WatsonxError::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(response).to_string(),
        })
    }
}

#[async_trait]
impl<T> BatchService for DefaultBatchService<T>
where
    T: crate::transport::HttpTransport + Send + Sync,
{
    async fn create(&self, request: BatchRequest) -> WatsonxResult<BatchJob> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let response = self.transport.post(BATCHES_PATH, body).await?;
        Self::decode(&response)
    }

    async fn get(&self, id: &str) -> WatsonxResult<BatchJob> {
        let response = self.transport.get(&format!("{BATCHES_PATH}/{id}")).await?;
        Self::decode(&response)
    }

    async fn list(&self) -> WatsonxResult<BatchJobList> {
        let response = self.transport.get(BATCHES_PATH).await?;
        Self::decode(&response)
    }

    async fn cancel(&self, id: &str) -> WatsonxResult<BatchJob> {
        let response = self
            .transport
            .post(&format!("{BATCHES_PATH}/{id}/cancel"), Vec::new())
            .await?;
        Self::decode(&response)
    }

    async fn wait_for_completion(&self, id: &str, config: &PollConfig) -> WatsonxResult<BatchJob> {
        poll_until_done("batch job", config, || self.get(id)).await
    }
}
