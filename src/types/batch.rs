//! Batch inference job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Request to create a batch inference job.
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest {
    /// Model ID to run the batch against.
    pub model_id: String,
    /// Project to scope the job to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Deployment space to scope the job to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Connection reference for the input file.
    pub input_reference: DataReference,
    /// Connection reference for the output location.
    pub output_reference: DataReference,
}

impl BatchRequest {
    /// Creates a batch request.
    pub fn new(
        model_id: impl Into<String>,
        input_reference: DataReference,
        output_reference: DataReference,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            project_id: None,
            space_id: None,
            input_reference,
            output_reference,
        }
    }

    /// Sets the project id.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// Reference to a data asset or connection location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataReference {
    /// Reference type, e.g. "connection_asset".
    #[serde(rename = "type")]
    pub reference_type: String,
    /// Location details.
    pub location: serde_json::Value,
}

impl DataReference {
    /// Creates a connection-asset reference pointing at a file path.
    pub fn connection_asset(connection_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            reference_type: "connection_asset".to_string(),
            location: serde_json::json!({
                "id": connection_id.into(),
                "file_name": file_name.into(),
            }),
        }
    }
}

/// A batch inference job.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchJob {
    /// Job ID.
    pub id: String,
    /// Model the job runs against.
    pub model_id: Option<String>,
    /// Current status.
    pub status: BatchStatus,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Completion timestamp, once terminal.
    pub completed_at: Option<DateTime<Utc>>,
    /// Failure details, when the job failed.
    pub error: Option<BatchError>,
}

impl BatchJob {
    /// Returns true once the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Batch job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Waiting to be scheduled.
    Queued,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Cancelled,
}

impl BatchStatus {
    /// Returns true for states the job will never leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// Failure details attached to a failed batch job.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchError {
    /// Error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

/// Paginated list of batch jobs.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchJobList {
    /// Jobs in this page.
    #[serde(default)]
    pub resources: Vec<BatchJob>,
    /// Total number of jobs.
    pub total_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!BatchStatus::Queued.is_terminal());
        assert!(!BatchStatus::Running.is_terminal());
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(BatchStatus::Cancelled.is_terminal());
    }

    #[test]
    fn test_job_deserialization() {
        let json = r#"{
            "id": "batch-1",
            "model_id": "ibm/granite-3-8b-instruct",
            "status": "running",
            "created_at": "2025-01-01T00:00:00Z",
            "completed_at": null,
            "error": null
        }"#;

        let job: BatchJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.id, "batch-1");
        assert_eq!(job.status, BatchStatus::Running);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_failed_job_carries_error() {
        let json = r#"{
            "id": "batch-2",
            "status": "failed",
            "error": {"code": "quota_exceeded", "message": "Out of capacity"}
        }"#;

        let job: BatchJob = serde_json::from_str(json).unwrap();
        assert!(job.is_terminal());
        assert_eq!(job.error.unwrap().message, "Out of capacity");
    }
}
