//! The watsonx.ai API client.

use std::sync::Arc;

use crate::config::WatsonxConfig;
use crate::errors::WatsonxResult;
use crate::services::{
    BatchService, ChatService, DefaultBatchService, DefaultChatService, DefaultExtractionService,
    DefaultGenerationService, ExtractionService, GenerationService,
};
use crate::transport::{ReqwestTransport, TransportConfig};

/// The main watsonx client.
///
/// Owns the shared HTTP transport; services borrow it, so a client can be
/// used from multiple tasks behind an `Arc`.
pub struct WatsonxClient {
    config: WatsonxConfig,
    transport: Arc<ReqwestTransport>,
}

impl WatsonxClient {
    /// Creates a new client with the given configuration.
    pub fn new(config: WatsonxConfig) -> WatsonxResult<Self> {
        let transport_config = TransportConfig {
            base_url: config.base_url.clone(),
            api_version: config.api_version.clone(),
            api_key: config.api_key().to_string(),
            timeout: config.timeout,
            custom_headers: config.custom_headers.clone(),
        };

        let transport = Arc::new(ReqwestTransport::with_config(transport_config)?);

        Ok(Self { config, transport })
    }

    /// Creates a client from an API key, with default settings.
    pub fn from_api_key(api_key: impl Into<String>) -> WatsonxResult<Self> {
        let config = WatsonxConfig::builder().api_key(api_key).build()?;
        Self::new(config)
    }

    /// Creates a client from `WATSONX_*` environment variables.
    pub fn from_env() -> WatsonxResult<Self> {
        let config = WatsonxConfig::from_env()?;
        Self::new(config)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &WatsonxConfig {
        &self.config
    }

    /// Returns the chat service.
    pub fn chat(&self) -> impl ChatService + '_ {
        DefaultChatService::new(self.transport.as_ref())
    }

    /// Returns the text generation service.
    pub fn generation(&self) -> impl GenerationService + '_ {
        DefaultGenerationService::new(self.transport.as_ref())
    }

    /// Returns the batch job service.
    pub fn batches(&self) -> impl BatchService + '_ {
        DefaultBatchService::new(self.transport.as_ref())
    }

    /// Returns the text extraction service.
    pub fn extractions(&self) -> impl ExtractionService + '_ {
        DefaultExtractionService::new(self.transport.as_ref())
    }
}
