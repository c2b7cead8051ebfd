//! Chat completion service.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::errors::{WatsonxError, WatsonxResult};
use crate::streaming::{ChatAggregator, ChatEventHandler, CallbackOrchestrator, SseStream, StreamEvent};
use crate::types::chat::{ChatChunk, ChatRequest, ChatResponse};
use crate::types::tools::ToolCall;

const CHAT_PATH: &str = "/ml/v1/text/chat";
const CHAT_STREAM_PATH: &str = "/ml/v1/text/chat_stream";

/// Stream of decoded chat chunks.
pub type ChatChunkStream = Pin<Box<dyn Stream<Item = WatsonxResult<ChatChunk>> + Send>>;

/// Chat service for chat completions.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Creates a chat completion.
    async fn create(&self, request: ChatRequest) -> WatsonxResult<ChatResponse>;

    /// Creates a streaming chat completion, returning the raw chunk stream.
    async fn create_stream(&self, request: ChatRequest) -> WatsonxResult<ChatChunkStream>;

    /// Creates a streaming chat completion, delivering events to `handler`.
    ///
    /// Resolves once every ordered callback has run and every tool-call job
    /// has finished, yielding the processed tool calls.
    async fn create_stream_with_handler<H: ChatEventHandler + 'static>(
        &self,
        request: ChatRequest,
        handler: Arc<H>,
    ) -> WatsonxResult<Vec<ToolCall>>;
}

/// Default implementation of the chat service.
pub struct DefaultChatService<T> {
    transport: T,
}

impl<T> DefaultChatService<T> {
    /// Creates a new chat service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> ChatService for DefaultChatService<T>
where
    T: crate::transport::HttpTransport + Send + Sync,
{
    async fn create(&self, request: ChatRequest) -> WatsonxResult<ChatResponse> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let response = self.transport.post(CHAT_PATH, body).await?;

        serde_json::from_slice(&response).map_err(|e| WatsonxError::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response).to_string(),
        })
    }

    async fn create_stream(&self, request: ChatRequest) -> WatsonxResult<ChatChunkStream> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let raw = self.transport.post_stream(CHAT_STREAM_PATH, body).await?;
        let chunks = SseStream::new(raw).map(|event| {
            event.and_then(|event| match event {
                StreamEvent::Data(payload) => {
                    serde_json::from_str::<ChatChunk>(&payload).map_err(|e| {
                        WatsonxError::Deserialization {
                            message: e.to_string(),
                            body: payload,
                        }
                    })
                }
                StreamEvent::Error(message) => Err(WatsonxError::stream(message)),
            })
        });
        Ok(Box::pin(chunks))
    }

    async fn create_stream_with_handler<H: ChatEventHandler + 'static>(
        &self,
        request: ChatRequest,
        handler: Arc<H>,
    ) -> WatsonxResult<Vec<ToolCall>> {
        let tool_choice_required = request.requires_tool_call();
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let raw = self.transport.post_stream(CHAT_STREAM_PATH, body).await?;
        let mut events = SseStream::new(raw);

        let sink_handler = Arc::clone(&handler);
        let orchestrator = CallbackOrchestrator::new(move |e| sink_handler.on_error(&e));
        let mut aggregator = ChatAggregator::new(Arc::clone(&handler), tool_choice_required);

        while let Some(event) = events.next().await {
            let keep_going = match event {
                Ok(event) => aggregator.process(event, &orchestrator),
                Err(e) => aggregator.report_error(e, &orchestrator),
            };
            if !keep_going {
                break;
            }
        }
        // Dropping the stream cancels any remaining transport reads.
        drop(events);

        aggregator.finish(&orchestrator);
        Ok(orchestrator.await_all().await)
    }
}
