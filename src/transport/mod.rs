//! HTTP transport module for the watsonx client.
//!
//! Provides the HTTP transport layer for making API requests, including
//! support for regular requests and raw streaming bodies. SSE framing is
//! not interpreted here; the `streaming` module consumes the raw bytes.

mod http_transport;

pub use http_transport::{ReqwestTransport, TransportConfig};

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

use crate::errors::WatsonxResult;

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// DELETE request.
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// HTTP response.
#[derive(Debug)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Bytes,
}

/// Byte stream type for streaming response bodies.
pub type ByteStream = Pin<Box<dyn Stream<Item = WatsonxResult<Bytes>> + Send>>;

/// HTTP transport trait for the watsonx client.
///
/// Implemented for references too, so services can borrow a shared
/// transport from the client.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Executes an HTTP request.
    async fn execute(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<HttpResponse>;

    /// Executes a streaming HTTP request, returning the raw body bytes.
    async fn execute_stream(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<ByteStream>;

    /// Convenience method for GET requests.
    async fn get(&self, path: &str) -> WatsonxResult<Vec<u8>>;

    /// Convenience method for POST requests.
    async fn post(&self, path: &str, body: Vec<u8>) -> WatsonxResult<Vec<u8>>;

    /// Convenience method for streaming POST requests.
    async fn post_stream(&self, path: &str, body: Vec<u8>) -> WatsonxResult<ByteStream>;

    /// Convenience method for DELETE requests.
    async fn delete(&self, path: &str) -> WatsonxResult<Vec<u8>>;
}

#[async_trait]
impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    async fn execute(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<HttpResponse> {
        (**self).execute(method, url, headers, body).await
    }

    async fn execute_stream(
        &self,
        method: Method,
        url: String,
        headers: HashMap<String, String>,
        body: Option<Bytes>,
    ) -> WatsonxResult<ByteStream> {
        (**self).execute_stream(method, url, headers, body).await
    }

    async fn get(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        (**self).get(path).await
    }

    async fn post(&self, path: &str, body: Vec<u8>) -> WatsonxResult<Vec<u8>> {
        (**self).post(path, body).await
    }

    async fn post_stream(&self, path: &str, body: Vec<u8>) -> WatsonxResult<ByteStream> {
        (**self).post_stream(path, body).await
    }

    async fn delete(&self, path: &str) -> WatsonxResult<Vec<u8>> {
        (**self).delete(path).await
    }
}
