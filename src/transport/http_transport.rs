//! HTTP transport implementation using reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{ByteStream, HttpResponse, HttpTransport, Method};
use crate::errors::{ApiErrorResponse, WatsonxError, WatsonxResult};

/// Configuration for `ReqwestTransport`.
pub struct TransportConfig {
    /// Base URL for the API.
    pub base_url: String,
    /// API version date appended as the `version` query parameter.
    pub api_version: String,
    /// API key for authentication.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Extra headers for every request.
    pub custom_headers: Vec<(String, String)>,
}

/// Reqwest-based HTTP transport implementation.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    api_key: String,
    custom_headers: Vec<(String, String)>,
}

impl ReqwestTransport {
    /// Creates a new transport with configuration.
    pub fn with_config(config: TransportConfig) -> WatsonxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| WatsonxError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url,
            api_version: config.api_version,
            api_key: config.api_key,
            custom_headers: config.custom_headers,
        })
    }

    /// Creates a new transport with a custom client.
    pub fn with_client(
        client: reqwest::Client,
        base_url: String,
        api_version: String,
        api_key: String,
    ) -> Self {
        Self {
            client,
            base_url,
            api_version,
            api_key,
            custom_headers: Vec::new(),
        }
    }

    /// Gets the default headers for requests.
    fn default_headers(&self) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert(
            "Authorization".to_string(),
            format!("Bearer {}", self.api_key),
        );
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        for (name, value) in &self.custom_headers {
            headers.insert(name.clone(), value.clone());
        }
        headers
    }

    /// Builds a full URL from a path, appending the version query parameter.
    fn build_url(&self, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}version={}",
            self.base_url, path, separator, self.api_version
        )
    }

    /// Maps HTTP status codes to watsonx errors.
    fn map_http_error(
        &self,
        status: u16,
        body: &Bytes,
        headers: &HashMap<String, String>,
    ) -> WatsonxError {
        let api_error: Option<ApiErrorResponse> = serde_json::from_slice(body).ok();

        let message = api_error
            .as_ref()
            .and_then(|e| e.first_message().map(str::to_string))
            .unwrap_or_else(|| format!("HTTP {} error", status));

        let retry_after = self.extract_retry_after(headers);

        match status {
            400 => WatsonxError::BadRequest {
                message,
                code: api_error
                    .as_ref()
                    .and_then(|e| e.first_code().map(str::to_string)),
            },
            401 => WatsonxError::Authentication { message },
            403 => WatsonxError::Permission { message },
            404 => WatsonxError::NotFound {
                message,
                resource: None,
            },
            429 => WatsonxError::RateLimit {
                message,
                retry_after,
            },
            500 => WatsonxError::Internal {
                message,
                trace: api_error.as_ref().and_then(|e| e.trace.clone()),
            },
            503 => WatsonxError::ServiceUnavailable {
                message,
                retry_after,
            },
            504 => WatsonxError::Timeout {
                message: "Gateway timeout - request took too long".to_string(),
            },
            _ => WatsonxError::Unknown {
                status,
                message,
                body: String::from_utf8_lossy(body).to_string().into(),
            },
        }
    }

    /// Extracts retry-after duration from headers.
    fn extract_retry_after(&self, headers: &HashMap<String, String>) -> Option<Duration> {
        headers
            .get("retry-after")
            .or_else(|| headers.get("Retry-After"))
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Converts response headers to a HashMap.
    fn extract_headers(headers: &reqwest::header::HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(k, v)| {
                v.to_str()
                    .ok()
                    .map(|val| (k.as_str().to_string(), val.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<HttpResponse> {
        let mut request = self.client.request(method.into(), &url);

        for (key, value) in &headers {
            request = request.header(key, value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(method = ?method, url = %url, "sending request");
        let response = request.send().await?;
        let status = response.status().as_u16();
        debug!(status, url = %url, "received response");
        let response_headers = Self::extract_headers(response.headers());
        let body = response.bytes().await?;

        if status >= 400 {
            return Err(self.map_http_error(status, &body, &response_headers));
        }

        Ok(HttpResponse {
            status,
            headers: response_headers,
            body,
        })
    }

    async fn execute_stream(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<ByteStream> {
        let mut request = self.client.request(method.into(), &url);

        for (key, value) in &headers {
            request = request.header(key, value);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        debug!(method = ?method, url = %url, "opening stream");
        let response = request.send().await?;
        let status = response.status().as_u16();

        if status >= 400 {
            let response_headers = Self::extract_headers(response.headers());
            let body = response.bytes().await?;
            return Err(self.map_http_error(status, &body, &response_headers));
        }

        let stream = response.bytes_stream().map(|result| {
            result.map_err(|e| WatsonxError::Stream {
                message: e.to_string(),
            })
        });

        Ok(Box::pin(stream))
    }

    async fn get(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        let url = self.build_url(path);
        let response = self
            .execute(Method::Get, url, self.default_headers(), None)
            .await?;
        Ok(response.body.to_vec())
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> WatsonxResult<Vec<u8>> {
        let url = self.build_url(path);
        let response = self
            .execute(
                Method::Post,
                url,
                self.default_headers(),
                Some(Bytes::from(body)),
            )
            .await?;
        Ok(response.body.to_vec())
    }

    async fn post_stream(&self, path: &str, body: Vec<u8>) -> WatsonxResult<ByteStream> {
        let url = self.build_url(path);
        let mut headers = self.default_headers();
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        self.execute_stream(Method::Post, url, headers, Some(Bytes::from(body)))
            .await
    }

    async fn delete(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        let url = self.build_url(path);
        let response = self
            .execute(Method::Delete, url, self.default_headers(), None)
            .await?;
        Ok(response.body.to_vec())
    }
}
