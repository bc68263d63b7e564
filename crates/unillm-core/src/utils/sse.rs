use crate::error::LlmError;
use futures::Stream;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Incremental Server-Sent Events decoder.
///
/// Bytes are appended as they arrive; every complete frame (terminated by a
/// blank line) is split off and each of its `data:` lines becomes one payload.
/// Incomplete frames, including UTF-8 sequences cut mid-character, stay
/// buffered until more input arrives.
#[derive(Debug)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    max_buffer: usize,
    // Bytes before this offset are known not to start a terminator
    scanned: usize,
}

impl SseDecoder {
    pub fn new(max_buffer: usize) -> Self {
        Self {
            buffer: Vec::new(),
            max_buffer,
            scanned: 0,
        }
    }

    /// Bytes held for an unterminated frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Append a chunk and return the payloads of every frame it completes
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<String>, LlmError> {
        // CRLF framing collapses to LF; JSON payloads never carry a raw CR
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut payloads = Vec::new();
        while let Some(pos) = find_terminator(&self.buffer, self.scanned) {
            let frame: Vec<u8> = self.buffer.drain(..pos + 2).take(pos).collect();
            push_payloads(&frame, &mut payloads);
            self.scanned = 0;
        }
        self.scanned = self.buffer.len().saturating_sub(1);

        if self.buffer.len() > self.max_buffer {
            self.buffer.clear();
            self.scanned = 0;
            return Err(LlmError::StreamOverflow {
                limit: self.max_buffer,
            });
        }

        Ok(payloads)
    }

    /// Flush a trailing frame the server closed without a blank line
    pub fn finish(&mut self) -> Vec<String> {
        let frame = std::mem::take(&mut self.buffer);
        self.scanned = 0;
        let mut payloads = Vec::new();
        push_payloads(&frame, &mut payloads);
        payloads
    }
}

fn find_terminator(buffer: &[u8], from: usize) -> Option<usize> {
    buffer
        .get(from..)?
        .windows(2)
        .position(|w| w == b"\n\n")
        .map(|pos| pos + from)
}

fn push_payloads(frame: &[u8], out: &mut Vec<String>) {
    let text = String::from_utf8_lossy(frame);
    for line in text.lines() {
        // Ignore lines without the "data:" field name
        if let Some(data) = line.strip_prefix("data:") {
            out.push(data.trim_start().to_string());
        }
    }
}

/// Adapts a response byte stream into a stream of SSE `data:` payloads
pub fn sse_payloads<S>(stream: S, max_buffer: usize) -> SsePayloads<S>
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin,
{
    SsePayloads {
        stream,
        decoder: SseDecoder::new(max_buffer),
        queue: VecDeque::new(),
        done: false,
    }
}

pub struct SsePayloads<S> {
    stream: S,
    decoder: SseDecoder,
    queue: VecDeque<String>,
    done: bool,
}

impl<S> Stream for SsePayloads<S>
where
    S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin,
{
    type Item = Result<String, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(payload) = self.queue.pop_front() {
                return Poll::Ready(Some(Ok(payload)));
            }
            if self.done {
                return Poll::Ready(None);
            }

            match Pin::new(&mut self.stream).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => match self.decoder.feed(&bytes) {
                    Ok(payloads) => self.queue.extend(payloads),
                    Err(e) => {
                        self.done = true;
                        return Poll::Ready(Some(Err(e)));
                    }
                },
                Poll::Ready(Some(Err(e))) => {
                    self.done = true;
                    return Poll::Ready(Some(Err(LlmError::from(e))));
                }
                Poll::Ready(None) => {
                    self.done = true;
                    let rest = self.decoder.finish();
                    self.queue.extend(rest);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{fake_sse_response_chunked, fake_sse_response_with_done};
    use futures::{StreamExt, stream};

    const LIMIT: usize = 1024;

    fn bytes_from_str(s: &str) -> bytes::Bytes {
        bytes::Bytes::from(s.to_string())
    }

    async fn collect_ok<S>(stream: S) -> Vec<String>
    where
        S: Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Unpin,
    {
        let results: Vec<Result<String, LlmError>> = sse_payloads(stream, LIMIT).collect().await;
        results.into_iter().collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_two_frames_any_split_point() {
        let input = "data: {\"a\":1}\n\ndata: {\"b\":2}\n\n";
        for split in 0..=input.len() {
            let mut decoder = SseDecoder::new(LIMIT);
            let mut payloads = decoder.feed(&input.as_bytes()[..split]).unwrap();
            payloads.extend(decoder.feed(&input.as_bytes()[split..]).unwrap());

            assert_eq!(payloads, vec!["{\"a\":1}", "{\"b\":2}"], "split at {split}");
            assert_eq!(decoder.pending(), 0);
        }
    }

    #[test]
    fn test_byte_at_a_time_feeding() {
        let input = "data: first\n\ndata: sec\nond\n\ndata: third\n\n";
        let mut decoder = SseDecoder::new(LIMIT);
        let mut payloads = Vec::new();
        for byte in input.as_bytes() {
            payloads.extend(decoder.feed(std::slice::from_ref(byte)).unwrap());
            assert!(decoder.scanned <= decoder.pending());
        }

        assert_eq!(payloads, vec!["first", "sec", "third"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[test]
    fn test_partial_frame_stays_buffered() {
        let mut decoder = SseDecoder::new(LIMIT);
        assert!(decoder.feed(b"data: hel").unwrap().is_empty());
        assert_eq!(decoder.pending(), 9);
        assert_eq!(decoder.feed(b"lo\n\n").unwrap(), vec!["hello"]);
    }

    #[test]
    fn test_prefix_without_space_and_extra_whitespace() {
        let mut decoder = SseDecoder::new(LIMIT);
        let payloads = decoder.feed(b"data:tight\n\ndata:    padded\n\n").unwrap();
        assert_eq!(payloads, vec!["tight", "padded"]);
    }

    #[test]
    fn test_multiple_data_lines_in_one_frame() {
        let mut decoder = SseDecoder::new(LIMIT);
        let payloads = decoder
            .feed(b"event: message\nid: 7\ndata: first\ndata: second\n\n")
            .unwrap();
        assert_eq!(payloads, vec!["first", "second"]);
    }

    #[test]
    fn test_crlf_framing() {
        let mut decoder = SseDecoder::new(LIMIT);
        let mut payloads = decoder.feed(b"data: one\r\n\r").unwrap();
        payloads.extend(decoder.feed(b"\ndata: two\r\n\r\n").unwrap());
        assert_eq!(payloads, vec!["one", "two"]);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let input = "data: caf\u{e9} \u{1F600}\n\n".as_bytes();
        // Split inside the two-byte "é"
        let split = "data: caf".len() + 1;
        let mut decoder = SseDecoder::new(LIMIT);
        assert!(decoder.feed(&input[..split]).unwrap().is_empty());
        assert_eq!(
            decoder.feed(&input[split..]).unwrap(),
            vec!["caf\u{e9} \u{1F600}"]
        );
    }

    #[test]
    fn test_comments_and_keepalives_yield_nothing() {
        let mut decoder = SseDecoder::new(LIMIT);
        assert!(decoder.feed(b": keepalive\n\n\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_overflow_without_terminator() {
        let mut decoder = SseDecoder::new(16);
        assert!(decoder.feed(b"data: 0123456").unwrap().is_empty());
        let err = decoder.feed(b"789abcdef").unwrap_err();
        assert!(matches!(err, LlmError::StreamOverflow { limit: 16 }));
    }

    #[test]
    fn test_completed_frames_do_not_count_toward_cap() {
        let mut decoder = SseDecoder::new(16);
        let payloads = decoder
            .feed(b"data: aaaaaaaa\n\ndata: bbbbbbbb\n\ndata: cc")
            .unwrap();
        assert_eq!(payloads, vec!["aaaaaaaa", "bbbbbbbb"]);
        assert_eq!(decoder.pending(), 8);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut decoder = SseDecoder::new(LIMIT);
        assert!(decoder.feed(b"data: tail").unwrap().is_empty());
        assert_eq!(decoder.finish(), vec!["tail"]);
        assert_eq!(decoder.pending(), 0);
    }

    #[tokio::test]
    async fn test_stream_single_event() {
        let stream = stream::iter(vec![Ok(bytes_from_str("data: hello\n\n"))]);
        assert_eq!(collect_ok(stream).await, vec!["hello"]);
    }

    #[tokio::test]
    async fn test_stream_partial_chunks() {
        let stream = stream::iter(vec![
            Ok(bytes_from_str("data: split")),
            Ok(bytes_from_str("-me\n\n")),
        ]);
        assert_eq!(collect_ok(stream).await, vec!["split-me"]);
    }

    #[tokio::test]
    async fn test_stream_empty() {
        let stream = stream::iter(Vec::<Result<bytes::Bytes, reqwest::Error>>::new());
        assert_eq!(collect_ok(stream).await, Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_stream_keeps_done_marker_for_adapters() {
        let stream = fake_sse_response_with_done(&["before_done"]);
        assert_eq!(collect_ok(stream).await, vec!["before_done", "[DONE]"]);
    }

    #[tokio::test]
    async fn test_stream_small_chunks() {
        let events = ["chunk_test", "split_me", "{\"k\":\"v\"}"];
        let stream = fake_sse_response_chunked(&events, 3);
        assert_eq!(collect_ok(stream).await, events.to_vec());
    }

    #[tokio::test]
    async fn test_stream_overflow_ends_stream() {
        let stream = stream::iter(vec![
            Ok(bytes_from_str("data: ok\n\n")),
            Ok(bytes_from_str("data: this frame never terminates")),
            Ok(bytes_from_str("data: unreachable\n\n")),
        ]);
        let results: Vec<Result<String, LlmError>> = sse_payloads(stream, 8).collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap(), "ok");
        assert!(matches!(results[1], Err(LlmError::StreamOverflow { limit: 8 })));
    }
}
