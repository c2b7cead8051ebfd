//! Error types for the watsonx.ai client.
//!
//! Provides a comprehensive error taxonomy covering API errors, network
//! errors, streaming protocol errors, and long-running job failures.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for watsonx operations.
pub type WatsonxResult<T> = Result<T, WatsonxError>;

/// Comprehensive error type for watsonx client operations.
#[derive(Debug, Error)]
pub enum WatsonxError {
    /// Configuration error (invalid API key, base URL, etc.)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Error message describing the configuration issue.
        message: String,
    },

    /// Authentication error (invalid or missing API key).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message from the API.
        message: String,
    },

    /// Permission denied (insufficient access rights).
    #[error("Permission denied: {message}")]
    Permission {
        /// Error message describing the permission issue.
        message: String,
    },

    /// Bad request (invalid request parameters).
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message describing the validation issue.
        message: String,
        /// Error code from the API.
        code: Option<String>,
    },

    /// Resource not found.
    #[error("Not found: {message}")]
    NotFound {
        /// Error message.
        message: String,
        /// The type of resource that was not found.
        resource: Option<String>,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded: {message}")]
    RateLimit {
        /// Error message.
        message: String,
        /// Duration to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Internal server error.
    #[error("Internal server error: {message}")]
    Internal {
        /// Error message.
        message: String,
        /// Trace ID for debugging.
        trace: Option<String>,
    },

    /// Service unavailable.
    #[error("Service unavailable: {message}")]
    ServiceUnavailable {
        /// Error message.
        message: String,
        /// Duration to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// Request timeout.
    #[error("Request timeout: {message}")]
    Timeout {
        /// Error message.
        message: String,
    },

    /// Network/connection error.
    #[error("Connection error: {message}")]
    Connection {
        /// Error message.
        message: String,
    },

    /// Streaming protocol error (malformed SSE framing, backend error frame).
    #[error("Stream error: {message}")]
    Stream {
        /// Error message.
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message.
        message: String,
    },

    /// Deserialization error (response body did not match the expected shape).
    #[error("Deserialization error: {message}")]
    Deserialization {
        /// Error message.
        message: String,
        /// The offending body.
        body: String,
    },

    /// Tool call interception error.
    #[error("Tool call interception failed: {message}")]
    Interception {
        /// Error message from the interceptor.
        message: String,
        /// The id of the intercepted tool call.
        tool_call_id: Option<String>,
    },

    /// A polled job reported failure.
    #[error("Job failed: {message}")]
    JobFailed {
        /// Failure detail supplied by the remote resource.
        message: String,
        /// Job identifier, when known.
        job_id: Option<String>,
    },

    /// The polling deadline elapsed before the job reached a terminal state.
    #[error("Polling timed out for {operation} after {elapsed:?}")]
    PollTimeout {
        /// The operation being polled.
        operation: String,
        /// Elapsed time when the deadline was hit.
        elapsed: Duration,
    },

    /// Unknown error.
    #[error("Unknown error (HTTP {status}): {message}")]
    Unknown {
        /// HTTP status code.
        status: u16,
        /// Error message.
        message: String,
        /// Raw response body.
        body: Option<String>,
    },
}

impl WatsonxError {
    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WatsonxError::RateLimit { .. }
                | WatsonxError::ServiceUnavailable { .. }
                | WatsonxError::Internal { .. }
                | WatsonxError::Timeout { .. }
                | WatsonxError::Connection { .. }
        )
    }

    /// Returns the retry-after duration if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            WatsonxError::RateLimit { retry_after, .. } => *retry_after,
            WatsonxError::ServiceUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Creates a stream error.
    pub fn stream(message: impl Into<String>) -> Self {
        WatsonxError::Stream {
            message: message.into(),
        }
    }
}

/// API error response from watsonx.ai.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// The individual errors.
    #[serde(default)]
    pub errors: Vec<ApiErrorDetail>,
    /// Trace ID for support requests.
    pub trace: Option<String>,
    /// HTTP status code echoed by the API.
    pub status_code: Option<u16>,
}

impl ApiErrorResponse {
    /// Returns the first error message, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }

    /// Returns the first error code, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.errors.first().and_then(|e| e.code.as_deref())
    }
}

/// Detailed API error information.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorDetail {
    /// The error code.
    pub code: Option<String>,
    /// The error message.
    pub message: String,
    /// Link to further documentation.
    pub more_info: Option<String>,
}

impl From<reqwest::Error> for WatsonxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WatsonxError::Timeout {
                message: err.to_string(),
            }
        } else if err.is_connect() {
            WatsonxError::Connection {
                message: err.to_string(),
            }
        } else {
            WatsonxError::Unknown {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
                body: None,
            }
        }
    }
}

impl From<serde_json::Error> for WatsonxError {
    fn from(err: serde_json::Error) -> Self {
        WatsonxError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for WatsonxError {
    fn from(err: url::ParseError) -> Self {
        WatsonxError::Configuration {
            message: format!("Invalid URL: {}", err),
        }
    }
}
