//! IBM watsonx.ai Client Library
//!
//! A production-ready Rust client for the IBM watsonx.ai API with support
//! for chat completions, text generation, batch inference, and document
//! text extraction.
//!
//! # Features
//!
//! - **Streaming Engine**: SSE streaming with strict callback ordering and
//!   concurrent, interceptable tool-call delivery
//! - **Job Polling**: Exponential-backoff poll-until-done for batch and
//!   extraction jobs with typed timeout and failure outcomes
//! - **Observability**: Structured logging via `tracing`
//! - **Type Safety**: Comprehensive type definitions with builder patterns
//! - **Async/Await**: Built on Tokio for high-performance async I/O
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use watsonx_client::{ChatRequest, ChatService, Message, WatsonxClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WatsonxClient::from_env()?;
//!
//!     let request = ChatRequest::builder()
//!         .model_id("ibm/granite-3-8b-instruct")
//!         .project_id("my-project")
//!         .message(Message::user("Hello, watsonx!"))
//!         .build();
//!
//!     let response = client.chat().create(request).await?;
//!     println!(
//!         "{}",
//!         response.choices[0].message.content.as_deref().unwrap_or("")
//!     );
//!     Ok(())
//! }
//! ```
//!
//! # Streaming
//!
//! Implement [`ChatEventHandler`] (or [`GenerationEventHandler`]) and pass
//! it to the streaming entry points. Ordered callbacks arrive strictly in
//! stream order; completed tool calls are dispatched concurrently through
//! the handler's interception hook.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod polling;
pub mod services;
pub mod streaming;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use client::WatsonxClient;
pub use config::WatsonxConfig;
pub use errors::{WatsonxError, WatsonxResult};

pub use polling::{poll_until_done, PollConfig, PollState, PollableResource};
pub use services::{BatchService, ChatService, ExtractionService, GenerationService};
pub use streaming::{
    ChatEventHandler, ChatStreamResult, GenerationEventHandler, GenerationStreamResult,
    ToolCallFragment,
};

// Type re-exports
pub use types::batch::{BatchJob, BatchRequest, BatchStatus, DataReference};
pub use types::chat::{
    AssistantMessage, ChatChoice, ChatRequest, ChatResponse, Message, SystemMessage, ToolMessage,
    UserMessage,
};
pub use types::common::{FinishReason, Role, StopReason, Usage};
pub use types::extraction::{ExtractionJob, ExtractionRequest, ExtractionStatus};
pub use types::generation::{GenerationParameters, GenerationRequest, GenerationResponse};
pub use types::tools::{FunctionDefinition, Tool, ToolCall, ToolChoice, ToolChoiceOption};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
