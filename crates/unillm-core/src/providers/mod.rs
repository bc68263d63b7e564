//! Vendor adapters
//!
//! Each adapter turns a [`GenerationRequest`] into one vendor HTTP request and
//! pulls plain text back out of the vendor's response body or stream frames.
//! [`Provider`] picks the adapter with an exhaustive `match`, so adding a
//! variant fails to compile until every capability is wired up.

pub mod anthropic;
pub mod google;
pub mod openai;

pub use anthropic::AnthropicAdapter;
pub use google::GoogleAdapter;
pub use openai::OpenAIAdapter;

use crate::credentials::Credential;
use crate::error::LlmError;
use crate::types::{GenerationRequest, Provider};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// A fully built vendor request, ready for the HTTP client
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: String,
    pub query: Vec<(&'static str, String)>,
    pub headers: HeaderMap,
    pub body: serde_json::Value,
}

/// Capabilities every vendor adapter provides
pub trait VendorAdapter {
    /// Build the request. Called once per attempt, so per-attempt values are
    /// regenerated on every retry.
    fn build_request(
        &self,
        base_url: &str,
        credential: &Credential,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError>;

    /// Generated text of a complete (non-streamed) response body
    fn extract_text(&self, body: &serde_json::Value) -> Result<String, LlmError>;

    /// Text delta of one SSE payload; `None` for frames that carry no text
    /// or fail to parse.
    fn extract_delta(&self, payload: &str) -> Option<String>;
}

impl VendorAdapter for Provider {
    fn build_request(
        &self,
        base_url: &str,
        credential: &Credential,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError> {
        match self {
            Provider::Google => {
                GoogleAdapter.build_request(base_url, credential, request, model, stream)
            }
            Provider::OpenAI => {
                OpenAIAdapter.build_request(base_url, credential, request, model, stream)
            }
            Provider::Claude => {
                AnthropicAdapter.build_request(base_url, credential, request, model, stream)
            }
        }
    }

    fn extract_text(&self, body: &serde_json::Value) -> Result<String, LlmError> {
        match self {
            Provider::Google => GoogleAdapter.extract_text(body),
            Provider::OpenAI => OpenAIAdapter.extract_text(body),
            Provider::Claude => AnthropicAdapter.extract_text(body),
        }
    }

    fn extract_delta(&self, payload: &str) -> Option<String> {
        match self {
            Provider::Google => GoogleAdapter.extract_delta(payload),
            Provider::OpenAI => OpenAIAdapter.extract_delta(payload),
            Provider::Claude => AnthropicAdapter.extract_delta(payload),
        }
    }
}

/// Header value holding a secret; marked sensitive so it is masked in debug output
pub(crate) fn secret_header(value: &str) -> Result<HeaderValue, LlmError> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| LlmError::configuration("API key contains invalid header characters"))?;
    header.set_sensitive(true);
    Ok(header)
}

pub(crate) fn insert_header(
    headers: &mut HeaderMap,
    name: &'static str,
    value: HeaderValue,
) {
    headers.insert(HeaderName::from_static(name), value);
}

/// Parse one stream payload as JSON, logging and dropping malformed frames
pub(crate) fn parse_frame(provider: &str, payload: &str) -> Option<serde_json::Value> {
    match serde_json::from_str(payload) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("Skipping malformed {provider} stream frame: {e}");
            None
        }
    }
}

/// Copy generation-config keys into a JSON object body
pub(crate) fn merge_config(body: &mut serde_json::Map<String, serde_json::Value>, request: &GenerationRequest) {
    if let Some(config) = request.config_entries() {
        for (key, value) in config {
            body.insert(key.clone(), value.clone());
        }
    }
}
