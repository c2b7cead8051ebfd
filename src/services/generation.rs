//! Text generation service.

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{Stream, StreamExt};

use crate::errors::{WatsonxError, WatsonxResult};
use crate::streaming::{
    CallbackOrchestrator, GenerationAggregator, GenerationEventHandler, SseStream, StreamEvent,
};
use crate::types::generation::{GenerationRequest, GenerationResponse};

const GENERATION_PATH: &str = "/ml/v1/text/generation";
const GENERATION_STREAM_PATH: &str = "/ml/v1/text/generation_stream";

/// Stream of decoded generation chunks.
pub type GenerationChunkStream =
    Pin<Box<dyn Stream<Item = WatsonxResult<GenerationResponse>> + Send>>;

/// Text generation service.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Generates text for a prompt.
    async fn generate(&self, request: GenerationRequest) -> WatsonxResult<GenerationResponse>;

    /// Generates text as a stream, returning the raw chunk stream.
    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> WatsonxResult<GenerationChunkStream>;

    /// Generates text as a stream, delivering events to `handler`.
    ///
    /// Resolves once every ordered callback has run.
    async fn generate_stream_with_handler<H: GenerationEventHandler + 'static>(
        &self,
        request: GenerationRequest,
        handler: Arc<H>,
    ) -> WatsonxResult<()>;
}

/// Default implementation of the text generation service.
pub struct DefaultGenerationService<T> {
    transport: T,
}

impl<T> DefaultGenerationService<T> {
    /// Creates a new generation service.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T> GenerationService for DefaultGenerationService<T>
where
    T: crate::transport::HttpTransport + Send + Sync,
{
    async fn generate(&self, request: GenerationRequest) -> WatsonxResult<GenerationResponse> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let response = self.transport.post(GENERATION_PATH, body).await?;

        serde_json::from_slice(&response).map_err(|e| WatsonxError::Deserialization {
            message: e.to_string(),
            body: String::from_utf8_lossy(&response).to_string(),
        })
    }

    async fn generate_stream(
        &self,
        request: GenerationRequest,
    ) -> WatsonxResult<GenerationChunkStream> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let raw = self
            .transport
            .post_stream(GENERATION_STREAM_PATH, body)
            .await?;
        let chunks = SseStream::new(raw).map(|event| {
            event.and_then(|event| match event {
                StreamEvent::Data(payload) => {
                    serde_json::from_str::<GenerationResponse>(&payload).map_err(|e| {
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

    async fn generate_stream_with_handler<H: GenerationEventHandler + 'static>(
        &self,
        request: GenerationRequest,
        handler: Arc<H>,
    ) -> WatsonxResult<()> {
        let body = serde_json::to_vec(&request).map_err(|e| WatsonxError::Serialization {
            message: e.to_string(),
        })?;

        let raw = self
            .transport
            .post_stream(GENERATION_STREAM_PATH, body)
            .await?;
        let mut events = SseStream::new(raw);

        let sink_handler = Arc::clone(&handler);
        let orchestrator = CallbackOrchestrator::new(move |e| sink_handler.on_error(&e));
        let mut aggregator = GenerationAggregator::new(Arc::clone(&handler));

        while let Some(event) = events.next().await {
            let keep_going = match event {
                Ok(event) => aggregator.process(event, &orchestrator),
                Err(e) => aggregator.report_error(e, &orchestrator),
            };
            if !keep_going {
                break;
            }
        }
        drop(events);

        aggregator.finish(&orchestrator);
        orchestrator.await_all().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockTransport;
    use crate::streaming::GenerationStreamResult;
    use crate::types::common::StopReason;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingHandler {
        deltas: Mutex<Vec<String>>,
        results: Mutex<Vec<GenerationStreamResult>>,
        errors: Mutex<Vec<String>>,
    }

    impl GenerationEventHandler for CollectingHandler {
        fn on_text(&self, delta: &str) -> WatsonxResult<()> {
            self.deltas.lock().unwrap().push(delta.to_string());
            Ok(())
        }

        fn on_complete(&self, result: GenerationStreamResult) -> WatsonxResult<()> {
            self.results.lock().unwrap().push(result);
            Ok(())
        }

        fn on_error(&self, error: &WatsonxError) {
            self.errors.lock().unwrap().push(error.to_string());
        }
    }

    #[tokio::test]
    async fn test_generate_parses_results() {
        let transport = MockTransport::new();
        transport.enqueue_response(
            r#"{"model_id":"ibm/granite-3-8b-instruct","results":[{"generated_text":"Hi","generated_token_count":1,"input_token_count":2,"stop_reason":"eos_token"}]}"#,
        );
        let service = DefaultGenerationService::new(transport);

        let response = service
            .generate(GenerationRequest::new("ibm/granite-3-8b-instruct", "Hello"))
            .await
            .unwrap();

        assert_eq!(response.results[0].generated_text, "Hi");
    }

    #[tokio::test]
    async fn test_generate_stream_yields_decoded_chunks() {
        let transport = MockTransport::new();
        transport.enqueue_stream(vec![
            r#"data: {"results":[{"generated_text":"Hel","generated_token_count":1}]}"#,
            "",
            r#"data: {"results":[{"generated_text":"lo","generated_token_count":1,"stop_reason":"eos_token"}]}"#,
            "",
        ]);
        let service = DefaultGenerationService::new(transport);

        let mut chunks = service
            .generate_stream(GenerationRequest::new("ibm/granite-3-8b-instruct", "Hello"))
            .await
            .unwrap();

        let first = chunks.next().await.unwrap().unwrap();
        assert_eq!(first.results[0].generated_text, "Hel");
        let second = chunks.next().await.unwrap().unwrap();
        assert_eq!(second.results[0].stop_reason, Some(StopReason::EosToken));
        assert!(chunks.next().await.is_none());
    }

    #[tokio::test]
    async fn test_generate_stream_accumulates() {
        let transport = MockTransport::new();
        transport.enqueue_stream(vec![
            r#"data: {"results":[{"generated_text":"Hel","generated_token_count":1,"input_token_count":5}]}"#,
            "",
            r#"data: {"results":[{"generated_text":"lo","generated_token_count":1,"stop_reason":"eos_token"}]}"#,
            "",
        ]);
        let service = DefaultGenerationService::new(transport);
        let handler = Arc::new(CollectingHandler::default());

        service
            .generate_stream_with_handler(
                GenerationRequest::new("ibm/granite-3-8b-instruct", "Hello"),
                Arc::clone(&handler),
            )
            .await
            .unwrap();

        assert_eq!(*handler.deltas.lock().unwrap(), vec!["Hel", "lo"]);
        let results = handler.results.lock().unwrap();
        assert_eq!(results[0].generated_text, "Hello");
        assert_eq!(results[0].stop_reason, Some(StopReason::EosToken));
        assert_eq!(results[0].generated_token_count, 2);
    }

    #[tokio::test]
    async fn test_generate_stream_backend_error_frame() {
        let transport = MockTransport::new();
        transport.enqueue_stream(vec![
            "event: error",
            r#"data: {"errors":[{"code":"quota","message":"quota exceeded"}]}"#,
            "",
        ]);
        let service = DefaultGenerationService::new(transport);
        let handler = Arc::new(CollectingHandler::default());

        service
            .generate_stream_with_handler(
                GenerationRequest::new("ibm/granite-3-8b-instruct", "Hello"),
                Arc::clone(&handler),
            )
            .await
            .unwrap();

        let errors = handler.errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("quota exceeded"));
        // Fail-fast stream yields an error, never a completion.
        assert!(handler.results.lock().unwrap().is_empty());
    }
}
