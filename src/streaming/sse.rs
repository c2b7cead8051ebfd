//! Server-sent-event framing.
//!
//! Splits a raw `text/event-stream` body into discrete events. Two frame
//! kinds matter here: `data: <json>` carries one chunk payload, and an
//! `event: error` marker line flags the *next* data line as carrying an
//! error message instead of a chunk. Everything else (blank lines, unknown
//! fields) is ignored for forward compatibility.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use pin_project_lite::pin_project;

use crate::errors::{WatsonxError, WatsonxResult};
use crate::transport::ByteStream;

const DATA_PREFIX: &str = "data:";
const EVENT_PREFIX: &str = "event:";

/// One decoded unit from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A chunk payload, still JSON-encoded.
    Data(String),
    /// A backend-signaled error with its message.
    Error(String),
}

/// Line-by-line SSE parser.
///
/// Stateful only for the pending-error flag: an `event: error` line arms it,
/// and the following data line is then reinterpreted as the error's message.
#[derive(Debug, Default)]
pub struct SseLineParser {
    pending_error: bool,
}

impl SseLineParser {
    /// Creates a parser with no pending error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses one line, producing zero or one event.
    ///
    /// A pending error followed by anything other than a blank line or a
    /// data line is a protocol violation.
    pub fn parse_line(&mut self, line: &str) -> WatsonxResult<Option<StreamEvent>> {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            return Ok(None);
        }

        if let Some(payload) = line.strip_prefix(DATA_PREFIX) {
            let payload = payload.strip_prefix(' ').unwrap_or(payload);
            if self.pending_error {
                self.pending_error = false;
                return Ok(Some(StreamEvent::Error(payload.to_string())));
            }
            return Ok(Some(StreamEvent::Data(payload.to_string())));
        }

        if let Some(name) = line.strip_prefix(EVENT_PREFIX) {
            if name.trim() == "error" {
                self.pending_error = true;
            }
            return Ok(None);
        }

        if self.pending_error {
            return Err(WatsonxError::stream(format!(
                "expected data line after error event, got: {line}"
            )));
        }

        // Unknown SSE fields (id:, retry:, comments) are ignored.
        Ok(None)
    }

    /// Returns true when an error event is armed and awaiting its data line.
    pub fn has_pending_error(&self) -> bool {
        self.pending_error
    }
}

pin_project! {
    /// Pull-based adapter from a raw byte stream to SSE events.
    ///
    /// Buffers bytes until a full line is available, then feeds each line to
    /// the parser. The next transport chunk is only requested once every
    /// line of the current chunk has been consumed, so a slow consumer
    /// naturally throttles the connection. Dropping the stream cancels the
    /// underlying transport read.
    pub struct SseStream {
        #[pin]
        inner: ByteStream,
        // Raw bytes: the transport may split a multi-byte UTF-8 code point
        // across chunks, so decoding waits for a complete line.
        buffer: Vec<u8>,
        parser: SseLineParser,
        done: bool,
    }
}

impl SseStream {
    /// Wraps a raw response body.
    pub fn new(inner: ByteStream) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            parser: SseLineParser::new(),
            done: false,
        }
    }
}

impl Stream for SseStream {
    type Item = WatsonxResult<StreamEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            // Drain complete lines already buffered before polling for more.
            while let Some(newline) = this.buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = this.buffer.drain(..=newline).collect();
                let line = String::from_utf8_lossy(&line[..newline]);
                match this.parser.parse_line(&line) {
                    Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                    Ok(None) => {}
                    Err(e) => {
                        *this.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                }
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.extend_from_slice(&bytes);
                }
                Poll::Ready(Some(Err(e))) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(None) => {
                    *this.done = true;
                    // A final line without a trailing newline still counts.
                    let remainder = std::mem::take(this.buffer);
                    let remainder = String::from_utf8_lossy(&remainder);
                    match this.parser.parse_line(&remainder) {
                        Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                        Ok(None) => {
                            if this.parser.has_pending_error() {
                                return Poll::Ready(Some(Err(WatsonxError::stream(
                                    "stream ended with unresolved error event",
                                ))));
                            }
                            return Poll::Ready(None);
                        }
                        Err(e) => return Poll::Ready(Some(Err(e))),
                    }
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn byte_stream(chunks: Vec<&'static str>) -> ByteStream {
        raw_byte_stream(chunks.into_iter().map(str::as_bytes).collect())
    }

    fn raw_byte_stream(chunks: Vec<&'static [u8]>) -> ByteStream {
        Box::pin(futures::stream::iter(
            chunks.into_iter().map(|c| Ok(bytes::Bytes::from_static(c))),
        ))
    }

    #[test_case::test_case("data: {\"x\":1}" ; "with space")]
    #[test_case::test_case("data:{\"x\":1}" ; "without space")]
    #[test_case::test_case("data: {\"x\":1}\r" ; "with carriage return")]
    fn test_data_line_prefix_variants(line: &str) {
        let mut parser = SseLineParser::new();
        let event = parser.parse_line(line).unwrap();
        assert_eq!(event, Some(StreamEvent::Data("{\"x\":1}".to_string())));
    }

    #[test]
    fn test_blank_and_unknown_lines_ignored() {
        let mut parser = SseLineParser::new();
        assert_eq!(parser.parse_line("").unwrap(), None);
        assert_eq!(parser.parse_line("id: 42").unwrap(), None);
        assert_eq!(parser.parse_line(": keep-alive").unwrap(), None);
    }

    #[test]
    fn test_error_event_reinterprets_next_data_line() {
        let mut parser = SseLineParser::new();
        assert_eq!(parser.parse_line("event: error").unwrap(), None);
        assert!(parser.has_pending_error());
        let event = parser.parse_line("data: quota exceeded").unwrap();
        assert_eq!(event, Some(StreamEvent::Error("quota exceeded".to_string())));
        assert!(!parser.has_pending_error());

        // Subsequent data lines are normal chunks again.
        let event = parser.parse_line("data: {}").unwrap();
        assert_eq!(event, Some(StreamEvent::Data("{}".to_string())));
    }

    #[test]
    fn test_pending_error_followed_by_non_data_line_is_protocol_violation() {
        let mut parser = SseLineParser::new();
        parser.parse_line("event: error").unwrap();
        let result = parser.parse_line("id: 7");
        assert!(result.is_err());
    }

    #[test]
    fn test_non_error_event_ignored() {
        let mut parser = SseLineParser::new();
        assert_eq!(parser.parse_line("event: message").unwrap(), None);
        assert!(!parser.has_pending_error());
    }

    #[tokio::test]
    async fn test_stream_reassembles_lines_across_chunks() {
        let inner = byte_stream(vec!["data: {\"a\"", ":1}\n\ndata: {\"b\":2}\n"]);
        let mut stream = SseStream::new(inner);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, StreamEvent::Data("{\"a\":1}".to_string()));
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second, StreamEvent::Data("{\"b\":2}".to_string()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_reassembles_multibyte_char_split_across_chunks() {
        // "é" is 0xC3 0xA9; the transport may hand each byte over separately.
        let inner = raw_byte_stream(vec![b"data: caf\xc3", b"\xa9\n"]);
        let mut stream = SseStream::new(inner);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, StreamEvent::Data("caf\u{e9}".to_string()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_handles_final_line_without_newline() {
        let inner = byte_stream(vec!["data: {\"a\":1}"]);
        let mut stream = SseStream::new(inner);

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first, StreamEvent::Data("{\"a\":1}".to_string()));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_surfaces_unresolved_error_event_at_end() {
        let inner = byte_stream(vec!["event: error\n"]);
        let mut stream = SseStream::new(inner);
        let result = stream.next().await.unwrap();
        assert!(result.is_err());
    }
}
