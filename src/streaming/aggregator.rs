//! Chunk aggregation state machines.
//!
//! One aggregator instance owns the accumulated state of exactly one
//! stream. The SSE adapter feeds it one event at a time and only pulls the
//! next after [`process`](GenerationAggregator::process) returns, so no
//! internal synchronization is needed here; all cross-thread concerns live
//! in the [`CallbackOrchestrator`].

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::WatsonxError;
use crate::types::chat::{ChatChunk, ToolCallDelta};
use crate::types::common::FinishReason;
use crate::types::generation::GenerationResponse;
use crate::types::tools::{FunctionCall, ToolCall};

use super::handler::{
    ChatEventHandler, ChatStreamResult, GenerationEventHandler, GenerationStreamResult,
};
use super::orchestrator::CallbackOrchestrator;
use super::sse::StreamEvent;

/// Partial tool invocation data accumulated across chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCallFragment {
    /// Index of this tool call within the response.
    pub index: u32,
    /// Tool call ID, once seen.
    pub id: String,
    /// Function name, accumulated piecewise.
    pub name: String,
    /// Argument text, accumulated piecewise.
    pub arguments: String,
}

impl ToolCallFragment {
    fn new(index: u32) -> Self {
        Self {
            index,
            id: String::new(),
            name: String::new(),
            arguments: String::new(),
        }
    }

    fn apply(&mut self, delta: &ToolCallDelta) {
        if let Some(id) = &delta.id {
            self.id = id.clone();
        }
        if let Some(function) = &delta.function {
            if let Some(name) = &function.name {
                self.name.push_str(name);
            }
            if let Some(arguments) = &function.arguments {
                self.arguments.push_str(arguments);
            }
        }
    }

    fn into_tool_call(self) -> ToolCall {
        ToolCall {
            id: self.id,
            tool_type: "function".to_string(),
            function: FunctionCall {
                name: self.name,
                arguments: self.arguments,
            },
        }
    }
}

/// Accumulator for streaming text generation.
pub struct GenerationAggregator<H> {
    handler: Arc<H>,
    result: GenerationStreamResult,
    failed: bool,
}

impl<H: GenerationEventHandler + 'static> GenerationAggregator<H> {
    /// Creates an aggregator delivering to `handler`.
    pub fn new(handler: Arc<H>) -> Self {
        Self {
            handler,
            result: GenerationStreamResult {
                model_id: None,
                generated_text: String::new(),
                stop_reason: None,
                input_token_count: 0,
                generated_token_count: 0,
            },
            failed: false,
        }
    }

    /// Folds one stream event into the accumulated state.
    ///
    /// Returns false once the stream should stop pulling input.
    pub fn process(&mut self, event: StreamEvent, orchestrator: &CallbackOrchestrator) -> bool {
        let payload = match event {
            StreamEvent::Data(payload) => payload,
            StreamEvent::Error(message) => {
                return self.report_error(WatsonxError::stream(message), orchestrator);
            }
        };

        let response: GenerationResponse = match serde_json::from_str(&payload) {
            Ok(response) => response,
            Err(e) => {
                return self.report_error(
                    WatsonxError::Deserialization {
                        message: e.to_string(),
                        body: payload,
                    },
                    orchestrator,
                );
            }
        };

        // Chunks with no results are backend keep-alives.
        if response.results.is_empty() {
            return true;
        }

        if response.model_id.is_some() {
            self.result.model_id = response.model_id;
        }
        for result in response.results {
            self.result.input_token_count += result.input_token_count;
            self.result.generated_token_count += result.generated_token_count;
            if result.stop_reason.is_some() {
                self.result.stop_reason = result.stop_reason;
            }
            if !result.generated_text.is_empty() {
                self.result.generated_text.push_str(&result.generated_text);
                let handler = Arc::clone(&self.handler);
                let delta = result.generated_text;
                orchestrator.schedule(move || handler.on_text(&delta));
            }
        }
        true
    }

    /// Emits the final completion event, unless the stream already failed.
    pub fn finish(self, orchestrator: &CallbackOrchestrator) {
        if self.failed {
            return;
        }
        let handler = self.handler;
        let result = self.result;
        orchestrator.schedule(move || handler.on_complete(result));
    }

    /// Routes an error to the handler's ordered error callback.
    ///
    /// Returns false when the fail-on-first-error policy makes the error
    /// non-recoverable, in which case the completion event is suppressed.
    pub fn report_error(
        &mut self,
        error: WatsonxError,
        orchestrator: &CallbackOrchestrator,
    ) -> bool {
        let handler = Arc::clone(&self.handler);
        orchestrator.schedule(move || {
            handler.on_error(&error);
            Ok(())
        });
        if self.handler.fail_on_first_error() {
            self.failed = true;
            return false;
        }
        true
    }
}

/// Accumulator for streaming chat completions.
///
/// Tracks content and thinking buffers separately, plus per-index tool-call
/// fragments. A fragment becomes a completed tool call on the chunk that
/// carries a finish reason; completed calls are dispatched through the
/// orchestrator's concurrent tool-call path.
pub struct ChatAggregator<H> {
    handler: Arc<H>,
    tool_choice_required: bool,
    result: ChatStreamResult,
    fragments: BTreeMap<u32, ToolCallFragment>,
    failed: bool,
}

impl<H: ChatEventHandler + 'static> ChatAggregator<H> {
    /// Creates an aggregator delivering to `handler`.
    ///
    /// `tool_choice_required` marks requests that forced a tool call; see
    /// [`reconcile_tool_choice_finish_reason`].
    pub fn new(handler: Arc<H>, tool_choice_required: bool) -> Self {
        Self {
            handler,
            tool_choice_required,
            result: ChatStreamResult {
                model_id: None,
                content: String::new(),
                thinking: String::new(),
                tool_calls: Vec::new(),
                finish_reason: None,
                usage: None,
            },
            fragments: BTreeMap::new(),
            failed: false,
        }
    }

    /// Folds one stream event into the accumulated state.
    ///
    /// Returns false once the stream should stop pulling input.
    pub fn process(&mut self, event: StreamEvent, orchestrator: &CallbackOrchestrator) -> bool {
        let payload = match event {
            StreamEvent::Data(payload) => payload,
            StreamEvent::Error(message) => {
                return self.report_error(WatsonxError::stream(message), orchestrator);
            }
        };

        let chunk: ChatChunk = match serde_json::from_str(&payload) {
            Ok(chunk) => chunk,
            Err(e) => {
                return self.report_error(
                    WatsonxError::Deserialization {
                        message: e.to_string(),
                        body: payload,
                    },
                    orchestrator,
                );
            }
        };

        // Chunks with no choices are backend keep-alives.
        if chunk.choices.is_empty() {
            return true;
        }

        if chunk.model_id.is_some() {
            self.result.model_id = chunk.model_id;
        }
        if chunk.usage.is_some() {
            // Chat usage is cumulative per chunk, so the latest wins.
            self.result.usage = chunk.usage;
        }

        for choice in chunk.choices {
            if let Some(content) = choice.delta.content {
                if !content.is_empty() {
                    self.result.content.push_str(&content);
                    let handler = Arc::clone(&self.handler);
                    orchestrator.schedule(move || handler.on_text(&content));
                }
            }
            if let Some(thinking) = choice.delta.thinking {
                if !thinking.is_empty() {
                    self.result.thinking.push_str(&thinking);
                    let handler = Arc::clone(&self.handler);
                    orchestrator.schedule(move || handler.on_thinking(&thinking));
                }
            }
            if let Some(deltas) = choice.delta.tool_calls {
                for delta in &deltas {
                    let fragment = self
                        .fragments
                        .entry(delta.index)
                        .or_insert_with(|| ToolCallFragment::new(delta.index));
                    fragment.apply(delta);

                    let snapshot = fragment.clone();
                    let handler = Arc::clone(&self.handler);
                    orchestrator.schedule(move || handler.on_tool_call_delta(&snapshot));
                }
            }
            if let Some(finish_reason) = choice.finish_reason {
                self.result.finish_reason = Some(finish_reason);
                self.complete_fragments(orchestrator);
            }
        }
        true
    }

    /// Emits the final completion event, unless the stream already failed.
    pub fn finish(mut self, orchestrator: &CallbackOrchestrator) {
        if self.failed {
            return;
        }
        if !self.fragments.is_empty() {
            warn!(
                open_fragments = self.fragments.len(),
                "stream ended with unfinished tool call fragments"
            );
            self.fragments.clear();
        }

        self.result.finish_reason = reconcile_tool_choice_finish_reason(
            self.tool_choice_required,
            self.result.finish_reason,
            &self.result.tool_calls,
        );

        let handler = self.handler;
        let result = self.result;
        orchestrator.schedule(move || handler.on_complete(result));
    }

    fn complete_fragments(&mut self, orchestrator: &CallbackOrchestrator) {
        let fragments = std::mem::take(&mut self.fragments);
        for (index, fragment) in fragments {
            debug!(index, id = %fragment.id, "tool call complete");
            let call = fragment.into_tool_call();
            self.result.tool_calls.push(call.clone());

            let intercept_handler = Arc::clone(&self.handler);
            let deliver_handler = Arc::clone(&self.handler);
            orchestrator.schedule_tool_call(
                call,
                move |call| intercept_handler.intercept_tool_call(call),
                move |call| deliver_handler.on_tool_call(call),
            );
        }
    }

    /// Routes an error to the handler's ordered error callback.
    ///
    /// Returns false when the fail-on-first-error policy makes the error
    /// non-recoverable, in which case the completion event is suppressed.
    pub fn report_error(
        &mut self,
        error: WatsonxError,
        orchestrator: &CallbackOrchestrator,
    ) -> bool {
        let handler = Arc::clone(&self.handler);
        orchestrator.schedule(move || {
            handler.on_error(&error);
            Ok(())
        });
        if self.handler.fail_on_first_error() {
            self.failed = true;
            return false;
        }
        true
    }
}

/// Compensates for a backend quirk: when the caller forced a tool choice
/// and tool calls were in fact produced, the final chunk sometimes omits
/// the `tool_calls` finish marker. The reported finish reason is corrected
/// to tool-calls in that case.
fn reconcile_tool_choice_finish_reason(
    tool_choice_required: bool,
    finish_reason: Option<FinishReason>,
    tool_calls: &[ToolCall],
) -> Option<FinishReason> {
    if tool_choice_required
        && finish_reason != Some(FinishReason::ToolCalls)
        && tool_calls.iter().any(|call| !call.function.name.is_empty())
    {
        return Some(FinishReason::ToolCalls);
    }
    finish_reason
}
