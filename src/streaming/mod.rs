//! Streaming response engine.
//!
//! Turns a raw SSE response body into handler callbacks with two delivery
//! guarantees: ordered callbacks (text, thinking, completion, error) run
//! strictly in submission order, and completed tool calls are dispatched
//! concurrently with an optional interception step. Data flows
//! transport → [`SseStream`] → aggregator → [`CallbackOrchestrator`] →
//! handler, pulling one event at a time.

mod aggregator;
mod handler;
mod orchestrator;
mod sse;

pub use aggregator::{ChatAggregator, GenerationAggregator, ToolCallFragment};
pub use handler::{
    ChatEventHandler, ChatStreamResult, GenerationEventHandler, GenerationStreamResult,
};
pub use orchestrator::CallbackOrchestrator;
pub use sse::{SseLineParser, SseStream, StreamEvent};
