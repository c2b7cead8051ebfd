//! Text generation types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::StopReason;

/// Text generation request.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    /// Model ID to use.
    pub model_id: String,
    /// Prompt text.
    pub input: String,
    /// Project to scope the request to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Deployment space to scope the request to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space_id: Option<String>,
    /// Generation parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<GenerationParameters>,
}

impl GenerationRequest {
    /// Creates a request with model and prompt.
    pub fn new(model_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            input: input.into(),
            project_id: None,
            space_id: None,
            parameters: None,
        }
    }

    /// Sets the project id.
    #[must_use]
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets generation parameters.
    #[must_use]
    pub fn with_parameters(mut self, parameters: GenerationParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// Parameters controlling text generation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationParameters {
    /// Decoding method ("greedy" or "sample").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decoding_method: Option<String>,
    /// Maximum new tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_new_tokens: Option<u32>,
    /// Minimum new tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_new_tokens: Option<u32>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Top-p (nucleus) sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Top-k sampling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Repetition penalty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f64>,
    /// Stop sequences.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Overall time limit in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u64>,
}

/// Response envelope for text generation, streaming and non-streaming alike.
///
/// A streaming response arrives as a sequence of these, each carrying one
/// incremental result per requested completion.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResponse {
    /// Model used.
    pub model_id: Option<String>,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Generation results.
    #[serde(default)]
    pub results: Vec<GenerationResult>,
}

/// One generated result (or one incremental slice of it when streaming).
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationResult {
    /// Generated text, possibly partial.
    #[serde(default)]
    pub generated_text: String,
    /// Tokens generated so far in this slice.
    #[serde(default)]
    pub generated_token_count: u32,
    /// Input tokens consumed by this slice.
    #[serde(default)]
    pub input_token_count: u32,
    /// Reason generation stopped, present on the final slice.
    pub stop_reason: Option<StopReason>,
}
