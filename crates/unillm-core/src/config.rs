use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Client configuration, fixed at construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// TCP/TLS connect timeout
    pub connect_timeout_seconds: u64,
    /// Maximum idle time between reads of the response body
    pub read_timeout_seconds: u64,
    /// Wall-clock limit for one non-streaming attempt
    pub timeout_seconds: u64,
    /// Retries after the first attempt for transient failures
    pub max_retries: u32,
    /// Base of the exponential backoff, in seconds
    pub backoff_base: f64,
    /// Upper bound on any single backoff sleep
    pub max_backoff_seconds: u64,
    /// Upper bound on a server-provided Retry-After wait
    pub max_retry_after_seconds: u64,
    /// Whether callback-style generation streams
    pub stream: bool,
    /// Override for the provider's default endpoint
    pub base_url: Option<String>,
    /// Override for the provider's default model
    pub default_model: Option<String>,
    /// Cap on buffered bytes of one unterminated SSE frame
    pub max_stream_buffer_bytes: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 10,
            read_timeout_seconds: 60,
            timeout_seconds: 120,
            max_retries: 3,
            backoff_base: 2.0,
            max_backoff_seconds: 30,
            max_retry_after_seconds: 60,
            stream: false,
            base_url: None,
            default_model: None,
            max_stream_buffer_bytes: 1024 * 1024,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(source: &str) -> Result<Self, LlmError> {
        let config: ClientConfig = toml::from_str(source)
            .map_err(|e| LlmError::configuration(format!("Invalid client config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LlmError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            LlmError::configuration(format!("Cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&source)
    }

    pub fn with_connect_timeout(mut self, seconds: u64) -> Self {
        self.connect_timeout_seconds = seconds;
        self
    }

    pub fn with_read_timeout(mut self, seconds: u64) -> Self {
        self.read_timeout_seconds = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff(mut self, base: f64, max_backoff_seconds: u64) -> Self {
        self.backoff_base = base;
        self.max_backoff_seconds = max_backoff_seconds;
        self
    }

    pub fn with_max_retry_after(mut self, seconds: u64) -> Self {
        self.max_retry_after_seconds = seconds;
        self
    }

    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_max_stream_buffer(mut self, bytes: usize) -> Self {
        self.max_stream_buffer_bytes = bytes;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_seconds)
    }

    pub fn max_retry_after(&self) -> Duration {
        Duration::from_secs(self.max_retry_after_seconds)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LlmError> {
        if self.connect_timeout_seconds == 0
            || self.read_timeout_seconds == 0
            || self.timeout_seconds == 0
        {
            return Err(LlmError::configuration("Timeouts must be greater than 0"));
        }

        if !self.backoff_base.is_finite() || self.backoff_base < 1.0 {
            return Err(LlmError::configuration(
                "Backoff base must be a finite number >= 1.0",
            ));
        }

        if self.max_stream_buffer_bytes == 0 {
            return Err(LlmError::configuration(
                "Stream buffer cap must be greater than 0",
            ));
        }

        if let Some(base_url) = &self.base_url {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(LlmError::configuration(
                    "Base URL must be a valid HTTP/HTTPS URL",
                ));
            }
        }

        if matches!(&self.default_model, Some(m) if m.trim().is_empty()) {
            return Err(LlmError::configuration("Default model cannot be empty"));
        }

        Ok(())
    }
}

/// Utility functions for parsing retry timing from HTTP headers
pub mod retry_parsing {
    use std::str::FromStr;
    use std::time::Duration;

    /// Parse a delta-seconds `Retry-After` value
    pub fn parse_retry_after(value: &str) -> Option<Duration> {
        // TODO: accept the HTTP-date form as well
        u64::from_str(value.trim()).ok().map(Duration::from_secs)
    }

    /// `Retry-After` from a response's headers
    pub fn retry_after_from_headers(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
        headers
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_retry_after)
    }
}
