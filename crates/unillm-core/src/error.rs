use std::time::Duration;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the generation client
#[derive(Error, Debug)]
pub enum LlmError {
    /// Unknown provider, missing credential or invalid client configuration
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The request could not be built from the given inputs
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Connection failures and resets
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Connect, read or overall timeout
    #[error("Request timed out: {message}")]
    Timeout { message: String },

    /// HTTP 429
    #[error("Rate limit exceeded: {message}. Retry after: {retry_after:?}")]
    RateLimit {
        message: String,
        retry_after: Option<Duration>,
        body: Option<String>,
    },

    /// Non-2xx response, or a transient failure that outlived its retries
    #[error("Request failed: {message}")]
    Request {
        message: String,
        status: Option<u16>,
        body: Option<String>,
        #[source]
        source: Option<BoxError>,
    },

    /// Any other HTTP client failure
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A full response body that is not the JSON shape the provider promises
    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: BoxError,
    },

    /// An SSE frame grew past the configured buffer cap without terminating
    #[error("Stream buffer exceeded {limit} bytes without a frame terminator")]
    StreamOverflow { limit: usize },

    #[error("Request was cancelled")]
    Cancelled,
}

impl LlmError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with source
    pub fn network_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a timeout error
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limit(
        message: impl Into<String>,
        retry_after: Option<Duration>,
        body: Option<String>,
    ) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
            body,
        }
    }

    /// Create a request error for a non-2xx response
    pub fn request(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::Request {
            message: format!("HTTP {status}: {body}"),
            status: Some(status),
            body: Some(body),
            source: None,
        }
    }

    /// Wrap the last transient failure once the retry budget is spent
    pub fn retries_exhausted(attempts: u32, last: LlmError) -> Self {
        let (status, body) = match &last {
            LlmError::RateLimit { body, .. } => (Some(429), body.clone()),
            _ => (None, None),
        };
        Self::Request {
            message: format!("giving up after {attempts} attempts: {last}"),
            status,
            body,
            source: Some(Box::new(last)),
        }
    }

    /// Create a transport error with source
    pub fn transport_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Serialization {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Serialization error for a response that parsed but lacks an expected field
    pub fn missing_field(provider: &str, path: &str) -> Self {
        Self::serialization(
            format!("{provider} response is missing `{path}`"),
            std::io::Error::new(std::io::ErrorKind::InvalidData, path.to_string()),
        )
    }

    /// Whether the retry policy may try this failure again
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LlmError::Network { .. } | LlmError::Timeout { .. } | LlmError::RateLimit { .. }
        )
    }

    /// Server-provided wait hint, if any
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            LlmError::RateLimit { .. } => Some(429),
            LlmError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

fn is_connection_reset(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

/// Convert from reqwest errors. The URL is dropped first since a query
/// string may carry a credential.
impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let reset = is_connection_reset(&err);
        let err = err.without_url();
        if err.is_timeout() {
            LlmError::timeout(err.to_string())
        } else if err.is_connect() {
            LlmError::network_with_source("Connection failed", err)
        } else if reset {
            LlmError::network_with_source("Connection reset", err)
        } else if err.is_builder() {
            LlmError::validation(format!("Invalid request: {err}"))
        } else {
            LlmError::transport_with_source("HTTP request failed", err)
        }
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::serialization("JSON deserialization failed", err)
    }
}
