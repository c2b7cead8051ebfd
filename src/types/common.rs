//! Common types shared across the API.

use serde::{Deserialize, Serialize};

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System message.
    System,
    /// User message.
    User,
    /// Assistant message.
    Assistant,
    /// Tool message.
    Tool,
}

/// Token usage information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    /// Number of tokens in the prompt.
    pub prompt_tokens: u32,
    /// Number of tokens in the completion.
    pub completion_tokens: u32,
    /// Total number of tokens.
    pub total_tokens: u32,
}

impl Usage {
    /// Creates a new usage instance.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }
}

/// Reason a chat completion stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    /// Natural stop.
    Stop,
    /// Max tokens reached.
    Length,
    /// Tool calls required.
    ToolCalls,
    /// The request time limit was hit.
    TimeLimit,
    /// The request was cancelled.
    Cancelled,
    /// Error occurred.
    Error,
}

/// Reason a text generation stopped.
///
/// Text generation reports a different vocabulary than chat; in particular
/// a natural stop arrives as `eos_token` rather than `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Generation is still in progress.
    NotFinished,
    /// Max tokens reached.
    MaxTokens,
    /// End-of-sequence token produced.
    EosToken,
    /// The request time limit was hit.
    TimeLimit,
    /// A stop sequence matched.
    StopSequence,
    /// The request was cancelled.
    Cancelled,
    /// Error occurred.
    Error,
}
