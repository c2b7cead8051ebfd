//! Mock transport for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::errors::{WatsonxError, WatsonxResult};
use crate::transport::{ByteStream, HttpResponse, HttpTransport, Method};

/// A recorded request for verification.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: Method,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: Option<Bytes>,
}

/// A mock response to return.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
    /// When set, streaming requests deliver the body as these separate
    /// byte chunks instead of one.
    pub chunks: Option<Vec<Bytes>>,
}

impl MockResponse {
    /// Creates a successful response with a raw body.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            headers: {
                let mut h = HashMap::new();
                h.insert("content-type".to_string(), "application/json".to_string());
                h
            },
            body: body.into(),
            chunks: None,
        }
    }

    /// Creates an error response in the watsonx error envelope.
    pub fn error(status: u16, code: &str, message: &str) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Bytes::from(format!(
                r#"{{"errors":[{{"code":"{code}","message":"{message}"}}],"trace":"mock-trace","status_code":{status}}}"#
            )),
            chunks: None,
        }
    }
}

/// Mock transport serving queued responses and recording requests.
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a 200 response with the given body.
    pub fn enqueue_response(&self, body: &str) {
        self.enqueue(MockResponse::ok(body.to_string()));
    }

    /// Queues an SSE response whose body is the given lines joined by `\n`.
    pub fn enqueue_stream(&self, lines: Vec<&str>) {
        let mut body = lines.join("\n");
        body.push('\n');
        self.enqueue(MockResponse::ok(body));
    }

    /// Queues an SSE response delivered as the given raw byte chunks, so
    /// consumers see lines split across chunk boundaries.
    pub fn enqueue_stream_chunks(&self, chunks: Vec<&str>) {
        let chunks: Vec<Bytes> = chunks
            .into_iter()
            .map(|c| Bytes::from(c.to_string()))
            .collect();
        let body: Vec<u8> = chunks.iter().flat_map(|c| c.iter().copied()).collect();
        let mut response = MockResponse::ok(body);
        response.chunks = Some(chunks);
        self.enqueue(response);
    }

    /// Queues an arbitrary response.
    pub fn enqueue(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn record_request(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url,
            headers,
            body,
        });
    }

    fn next_response(&self) -> WatsonxResult<MockResponse> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| MockResponse::error(500, "mock", "No mock response configured"));

        if response.status >= 400 {
            return Err(WatsonxError::Unknown {
                status: response.status,
                message: String::from_utf8_lossy(&response.body).to_string(),
                body: Some(String::from_utf8_lossy(&response.body).to_string()),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn execute(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<HttpResponse> {
        self.record_request(method, url, headers, body);
        let response = self.next_response()?;

        Ok(HttpResponse {
            status: response.status,
            headers: response.headers,
            body: response.body,
        })
    }

    async fn execute_stream(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<ByteStream> {
        self.record_request(method, url, headers, body);
        let response = self.next_response()?;

        match response.chunks {
            Some(chunks) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok));
                Ok(Box::pin(stream))
            }
            None => {
                let stream = futures::stream::once(async move { Ok(response.body) });
                Ok(Box::pin(stream))
            }
        }
    }

    async fn get(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        let response = self
            .execute(Method::Get, path.to_string(), HashMap::new(), None)
            .await?;
        Ok(response.body.to_vec())
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> WatsonxResult<Vec<u8>> {
        let response = self
            .execute(
                Method::Post,
                path.to_string(),
                HashMap::new(),
                Some(Bytes::from(body)),
            )
            .await?;
        Ok(response.body.to_vec())
    }

    async fn post_stream(&self, path: &str, body: Vec<u8>) -> WatsonxResult<ByteStream> {
        self.execute_stream(
            Method::Post,
            path.to_string(),
            HashMap::new(),
            Some(Bytes::from(body)),
        )
        .await
    }

    async fn delete(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        let response = self
            .execute(Method::Delete, path.to_string(), HashMap::new(), None)
            .await?;
        Ok(response.body.to_vec())
    }
}
