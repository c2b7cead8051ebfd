//! Caller-facing stream handler contracts.
//!
//! A handler is the only thing a caller must implement to consume a stream.
//! Partial callbacks fire as chunks arrive, a single completion (or error)
//! callback follows, and tool calls get an optional interception hook that
//! can transform or reject a call before delivery.
//!
//! Handlers may be shared across simultaneous streams, so implementations
//! must be `Send + Sync` and keep any mutable state behind their own
//! synchronization.

use crate::errors::{WatsonxError, WatsonxResult};
use crate::types::common::{FinishReason, StopReason, Usage};
use crate::types::tools::ToolCall;

use super::aggregator::ToolCallFragment;

/// Handler for streaming chat completions.
pub trait ChatEventHandler: Send + Sync {
    /// Called for each non-empty content delta, in arrival order.
    fn on_text(&self, delta: &str) -> WatsonxResult<()>;

    /// Called for each non-empty reasoning delta, in arrival order.
    fn on_thinking(&self, _delta: &str) -> WatsonxResult<()> {
        Ok(())
    }

    /// Called each time a chunk touches an in-flight tool call fragment.
    fn on_tool_call_delta(&self, _fragment: &ToolCallFragment) -> WatsonxResult<()> {
        Ok(())
    }

    /// Intercepts a completed tool call before delivery.
    ///
    /// Runs once per tool call, concurrently with other callbacks. May
    /// rewrite the call or fail it; a failure is routed to [`Self::on_error`]
    /// and the call is recorded undelivered.
    fn intercept_tool_call(&self, call: ToolCall) -> WatsonxResult<ToolCall> {
        Ok(call)
    }

    /// Called once per completed tool call, after interception.
    ///
    /// Delivery order across tool calls is not guaranteed.
    fn on_tool_call(&self, _call: &ToolCall) -> WatsonxResult<()> {
        Ok(())
    }

    /// Called exactly once when the stream ends without a fatal error.
    fn on_complete(&self, response: ChatStreamResult) -> WatsonxResult<()>;

    /// Called for protocol, decode, callback, and interception errors.
    fn on_error(&self, error: &WatsonxError);

    /// When true (the default), the first error stops the stream.
    fn fail_on_first_error(&self) -> bool {
        true
    }
}

/// Handler for streaming text generation.
pub trait GenerationEventHandler: Send + Sync {
    /// Called for each non-empty generated-text delta, in arrival order.
    fn on_text(&self, delta: &str) -> WatsonxResult<()>;

    /// Called exactly once when the stream ends without a fatal error.
    fn on_complete(&self, result: GenerationStreamResult) -> WatsonxResult<()>;

    /// Called for protocol, decode, and callback errors.
    fn on_error(&self, error: &WatsonxError);

    /// When true (the default), the first error stops the stream.
    fn fail_on_first_error(&self) -> bool {
        true
    }
}

/// Final accumulated result of a chat stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatStreamResult {
    /// Model that produced the response.
    pub model_id: Option<String>,
    /// Full accumulated content.
    pub content: String,
    /// Full accumulated reasoning text.
    pub thinking: String,
    /// Tool calls completed during the stream, in index order.
    pub tool_calls: Vec<ToolCall>,
    /// Final finish reason.
    pub finish_reason: Option<FinishReason>,
    /// Final token usage, when the backend reported it.
    pub usage: Option<Usage>,
}

/// Final accumulated result of a text generation stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStreamResult {
    /// Model that produced the response.
    pub model_id: Option<String>,
    /// Full accumulated generated text.
    pub generated_text: String,
    /// Final stop reason.
    pub stop_reason: Option<StopReason>,
    /// Total input tokens across all chunks.
    pub input_token_count: u32,
    /// Total generated tokens across all chunks.
    pub generated_token_count: u32,
}
