use crate::error::LlmError;
use futures::Stream;
use metrics::{counter, histogram};

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Streaming metrics collector
#[derive(Debug, Clone)]
pub struct StreamingMetrics {
    pub start_time: Instant,
    pub first_delta_latency: Option<Duration>,
    pub total_bytes: usize,
    pub total_deltas: usize,
    pub provider_name: &'static str,
    errored: bool,
    finalized: bool,
}

impl StreamingMetrics {
    pub fn new(provider_name: &'static str) -> Self {
        Self {
            start_time: Instant::now(),
            first_delta_latency: None,
            total_bytes: 0,
            total_deltas: 0,
            provider_name,
            errored: false,
            finalized: false,
        }
    }

    pub fn record_delta(&mut self, delta: &str) {
        if self.first_delta_latency.is_none() {
            let latency = self.start_time.elapsed();
            self.first_delta_latency = Some(latency);

            histogram!(
                "llm_streaming_first_delta_latency_ms",
                "provider" => self.provider_name
            )
            .record(latency.as_millis() as f64);

            log::debug!(
                "First delta received after {:?} for provider {}",
                latency,
                self.provider_name
            );
        }

        self.total_bytes += delta.len();
        self.total_deltas += 1;
    }

    pub fn record_error(&mut self) {
        self.errored = true;
        counter!(
            "llm_streaming_errors_total",
            "provider" => self.provider_name
        )
        .increment(1);
    }

    /// Record throughput and a completion. A stream that ended with an error
    /// is not counted as completed.
    pub fn finalize(&mut self) {
        if self.finalized || self.errored {
            return;
        }
        self.finalized = true;

        let total_duration = self.start_time.elapsed();
        if total_duration.as_secs_f64() > 0.0 {
            let bytes_per_second = self.total_bytes as f64 / total_duration.as_secs_f64();
            histogram!(
                "llm_streaming_bytes_per_second",
                "provider" => self.provider_name
            )
            .record(bytes_per_second);

            log::debug!(
                "Stream completed: {} bytes, {} deltas in {:?} ({:.2} bytes/s) for provider {}",
                self.total_bytes,
                self.total_deltas,
                total_duration,
                bytes_per_second,
                self.provider_name
            );
        }

        counter!(
            "llm_streaming_completions_total",
            "provider" => self.provider_name
        )
        .increment(1);
    }
}

/// Wrapper stream that records delta metrics as text passes through
pub struct MetricsStream<S> {
    inner: S,
    metrics: StreamingMetrics,
}

impl<S> MetricsStream<S> {
    pub fn new(inner: S, provider_name: &'static str) -> Self {
        Self {
            inner,
            metrics: StreamingMetrics::new(provider_name),
        }
    }

    pub fn metrics(&self) -> &StreamingMetrics {
        &self.metrics
    }
}

impl<S> Stream for MetricsStream<S>
where
    S: Stream<Item = Result<String, LlmError>> + Unpin,
{
    type Item = Result<String, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.inner).poll_next(cx) {
            Poll::Ready(Some(Ok(delta))) => {
                self.metrics.record_delta(&delta);
                Poll::Ready(Some(Ok(delta)))
            }
            Poll::Ready(Some(Err(e))) => {
                self.metrics.record_error();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                self.metrics.finalize();
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
