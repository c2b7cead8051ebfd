//! API services for the watsonx client.

pub mod batch;
pub mod chat;
pub mod extraction;
pub mod generation;

pub use batch::{BatchService, DefaultBatchService};
pub use chat::{ChatChunkStream, ChatService, DefaultChatService};
pub use extraction::{DefaultExtractionService, ExtractionService};
pub use generation::{DefaultGenerationService, GenerationChunkStream, GenerationService};
