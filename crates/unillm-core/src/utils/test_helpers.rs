//! Test utilities for simulating Server-Sent Events (SSE) responses
//!
//! Builds SSE bodies and byte streams so the frame decoder and the streaming
//! client can be exercised against awkward chunk boundaries.

use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Configuration for fake SSE response generation
#[derive(Debug, Clone, Default)]
pub struct FakeSseConfig {
    /// Whether to append a final "[DONE]" event
    pub include_done: bool,
    /// Split the body into chunks of this many bytes
    pub chunk_size: Option<usize>,
}

/// Render events (without the "data: " prefix) as an SSE body
pub fn sse_body(events: &[&str], include_done: bool) -> String {
    let mut body = String::new();
    for event in events {
        body.push_str(&format!("data: {event}\n\n"));
    }
    if include_done {
        body.push_str("data: [DONE]\n\n");
    }
    body
}

/// Creates a fake SSE response stream compatible with `sse_payloads`
pub fn fake_sse_response(
    events: &[&str],
    config: Option<FakeSseConfig>,
) -> impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + use<> {
    let config = config.unwrap_or_default();
    FakeSseStream {
        data: sse_body(events, config.include_done).into_bytes(),
        position: 0,
        chunk_size: config.chunk_size,
    }
}

/// Creates a fake SSE response with events split across chunk boundaries
pub fn fake_sse_response_chunked(
    events: &[&str],
    chunk_size: usize,
) -> impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + use<> {
    fake_sse_response(
        events,
        Some(FakeSseConfig {
            chunk_size: Some(chunk_size),
            ..Default::default()
        }),
    )
}

/// Creates a fake SSE response that ends with a [DONE] event
pub fn fake_sse_response_with_done(
    events: &[&str],
) -> impl Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin + use<> {
    fake_sse_response(
        events,
        Some(FakeSseConfig {
            include_done: true,
            ..Default::default()
        }),
    )
}

struct FakeSseStream {
    data: Vec<u8>,
    position: usize,
    chunk_size: Option<usize>,
}

impl Stream for FakeSseStream {
    type Item = Result<bytes::Bytes, reqwest::Error>;

    fn poll_next(mut self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.position >= self.data.len() {
            return Poll::Ready(None);
        }

        let chunk_size = self
            .chunk_size
            .unwrap_or(self.data.len() - self.position)
            .max(1);
        let end = std::cmp::min(self.position + chunk_size, self.data.len());
        let chunk = self.data[self.position..end].to_vec();
        self.position = end;

        Poll::Ready(Some(Ok(bytes::Bytes::from(chunk))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[test]
    fn test_sse_body() {
        assert_eq!(sse_body(&["a", "b"], false), "data: a\n\ndata: b\n\n");
        assert_eq!(sse_body(&[], true), "data: [DONE]\n\n");
    }

    #[tokio::test]
    async fn test_chunked_reassembles() {
        let chunks: Vec<_> = fake_sse_response_chunked(&["hello", "world"], 5)
            .collect()
            .await;
        assert!(chunks.len() > 1);

        let full: Vec<u8> = chunks
            .into_iter()
            .flat_map(|c| c.unwrap().to_vec())
            .collect();
        assert_eq!(full, b"data: hello\n\ndata: world\n\n");
    }

    #[tokio::test]
    async fn test_empty_events() {
        let chunks: Vec<_> = fake_sse_response(&[], None).collect().await;
        assert!(chunks.is_empty());
    }
}
