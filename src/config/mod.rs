//! Configuration module for the watsonx.ai client.
//!
//! Provides configuration management including API keys, base URLs,
//! the dated API version parameter, timeouts, and default project scope.

use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use crate::errors::{WatsonxError, WatsonxResult};

/// Default base URL for the watsonx.ai API (Dallas region).
pub const DEFAULT_BASE_URL: &str = "https://us-south.ml.cloud.ibm.com";

/// Default API version date.
pub const DEFAULT_API_VERSION: &str = "2024-05-31";

/// Default request timeout (10 minutes for long-running operations).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Configuration for the watsonx client.
#[derive(Clone)]
pub struct WatsonxConfig {
    /// API key for authentication (stored securely).
    pub(crate) api_key: SecretString,
    /// Base URL for API requests.
    pub base_url: String,
    /// API version date passed as the `version` query parameter.
    pub api_version: String,
    /// Default project to scope requests to.
    pub project_id: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// Custom headers to include in requests.
    pub custom_headers: Vec<(String, String)>,
}

impl WatsonxConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> WatsonxConfigBuilder {
        WatsonxConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `WATSONX_API_KEY` (required): API key for authentication
    /// - `WATSONX_BASE_URL` (optional): Custom base URL
    /// - `WATSONX_PROJECT_ID` (optional): Default project scope
    /// - `WATSONX_TIMEOUT` (optional): Request timeout in seconds
    pub fn from_env() -> WatsonxResult<Self> {
        let api_key = std::env::var("WATSONX_API_KEY").map_err(|_| {
            WatsonxError::Configuration {
                message: "WATSONX_API_KEY environment variable not set".to_string(),
            }
        })?;

        let mut builder = WatsonxConfigBuilder::new().api_key(api_key);

        if let Ok(base_url) = std::env::var("WATSONX_BASE_URL") {
            builder = builder.base_url(base_url);
        }

        if let Ok(project_id) = std::env::var("WATSONX_PROJECT_ID") {
            builder = builder.project_id(project_id);
        }

        if let Ok(timeout_str) = std::env::var("WATSONX_TIMEOUT") {
            if let Ok(timeout_secs) = timeout_str.parse::<u64>() {
                builder = builder.timeout(Duration::from_secs(timeout_secs));
            }
        }

        builder.build()
    }

    /// Returns the API key (exposing the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

impl std::fmt::Debug for WatsonxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatsonxConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .field("project_id", &self.project_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Builder for `WatsonxConfig`.
#[derive(Default)]
pub struct WatsonxConfigBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    api_version: Option<String>,
    project_id: Option<String>,
    timeout: Option<Duration>,
    custom_headers: Vec<(String, String)>,
}

impl WatsonxConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the API version date.
    pub fn api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = Some(api_version.into());
        self
    }

    /// Sets the default project id.
    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a custom header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> WatsonxResult<WatsonxConfig> {
        let api_key = self.api_key.ok_or_else(|| WatsonxError::Configuration {
            message: "API key is required".to_string(),
        })?;

        if api_key.is_empty() {
            return Err(WatsonxError::Configuration {
                message: "API key cannot be empty".to_string(),
            });
        }

        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        // Reject anything a URL parser would choke on later.
        let parsed = url::Url::parse(&base_url)?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(WatsonxError::Configuration {
                message: "Base URL must start with http:// or https://".to_string(),
            });
        }

        Ok(WatsonxConfig {
            api_key: SecretString::new(api_key),
            base_url,
            api_version: self
                .api_version
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            project_id: self.project_id,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            custom_headers: self.custom_headers,
        })
    }
}
