//! Text extraction job types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::batch::DataReference;

/// Request to start a text extraction job.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRequest {
    /// Project to scope the job to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Deployment space to scope the job to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Document to extract from.
    pub document_reference: DataReference,
    /// Where to write extracted output.
    pub results_reference: DataReference,
}

impl ExtractionRequest {
    /// Creates an extraction request.
    pub fn new(document_reference: DataReference, results_reference: DataReference) -> Self {
        Self {
            project_id: None,
            space_id: None,
            document_reference,
            results_reference,
        }
    }

    /// Sets the project id.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }
}

/// A text extraction job.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionJob {
    /// Job metadata.
    pub metadata: ExtractionMetadata,
    /// Job entity with status.
    pub entity: ExtractionEntity,
}

impl ExtractionJob {
    /// Job ID.
    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    /// Current status.
    pub fn status(&self) -> ExtractionStatus {
        self.entity.results.status
    }

    /// Returns true once the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }
}

/// Extraction job metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionMetadata {
    /// Job ID.
    pub id: String,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Project the job belongs to.
    pub project_id: Option<String>,
}

/// Extraction job entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionEntity {
    /// Results block with status.
    pub results: ExtractionResults,
}

/// Status block of an extraction job.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionResults {
    /// Current status.
    pub status: ExtractionStatus,
    /// Pages processed so far.
    pub number_pages_processed: Option<u32>,
    /// Failure details, when the job failed.
    pub error: Option<ExtractionError>,
}

/// Extraction job lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    /// Waiting to be scheduled.
    Submitted,
    /// Currently executing.
    Running,
    /// Finished successfully.
    Completed,
    /// Finished with an error.
    Failed,
}

impl ExtractionStatus {
    /// Returns true for states the job will never leave.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Failure details attached to a failed extraction job.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionError {
    /// Error code.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_deserialization() {
        let json = r#"{
            "metadata": {"id": "ext-1", "created_at": "2025-01-01T00:00:00Z", "project_id": "p1"},
            "entity": {"results": {"status": "running", "number_pages_processed": 3, "error": null}}
        }"#;

        let job: ExtractionJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.id(), "ext-1");
        assert_eq!(job.status(), ExtractionStatus::Running);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_terminal_states() {
        assert!(!ExtractionStatus::Submitted.is_terminal());
        assert!(ExtractionStatus::Completed.is_terminal());
        assert!(ExtractionStatus::Failed.is_terminal());
    }
}
