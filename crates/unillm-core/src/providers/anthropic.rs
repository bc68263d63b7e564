use super::{PreparedRequest, VendorAdapter, insert_header, merge_config, parse_frame, secret_header};
use crate::credentials::Credential;
use crate::error::LlmError;
use crate::types::GenerationRequest;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};

/// Anthropic Messages API
#[derive(Debug, Clone, Copy, Default)]
pub struct AnthropicAdapter;

pub const API_VERSION: &str = "2023-06-01";

/// `max_tokens` is mandatory for this API
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

impl VendorAdapter for AnthropicAdapter {
    fn build_request(
        &self,
        base_url: &str,
        credential: &Credential,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError> {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "x-api-key", secret_header(credential.expose())?);
        insert_header(
            &mut headers,
            "anthropic-version",
            HeaderValue::from_static(API_VERSION),
        );
        if stream {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }

        let mut body = Map::new();
        merge_config(&mut body, request);
        body.insert("model".to_string(), Value::String(model.to_string()));
        body.insert(
            "messages".to_string(),
            json!([{ "role": "user", "content": request.prompt }]),
        );
        body.entry("max_tokens")
            .or_insert_with(|| json!(DEFAULT_MAX_TOKENS));
        if let Some(system) = request.system_text() {
            body.insert("system".to_string(), Value::String(system.to_string()));
        }
        if stream {
            body.insert("stream".to_string(), Value::Bool(true));
        } else {
            body.remove("stream");
        }

        Ok(PreparedRequest {
            url: format!("{}/messages", base_url.trim_end_matches('/')),
            query: Vec::new(),
            headers,
            body: Value::Object(body),
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String, LlmError> {
        let blocks = body
            .get("content")
            .and_then(Value::as_array)
            .ok_or_else(|| LlmError::missing_field("claude", "content"))?;

        Ok(blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .collect())
    }

    fn extract_delta(&self, payload: &str) -> Option<String> {
        let frame = parse_frame("claude", payload)?;
        if frame.get("type")?.as_str()? != "content_block_delta" {
            return None;
        }
        let delta = frame.get("delta")?;
        if delta.get("type")?.as_str()? != "text_delta" {
            return None;
        }
        delta.get("text")?.as_str().map(str::to_string)
    }
}
