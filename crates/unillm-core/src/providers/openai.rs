use super::{PreparedRequest, VendorAdapter, insert_header, merge_config, parse_frame, secret_header};
use crate::credentials::Credential;
use crate::error::LlmError;
use crate::types::GenerationRequest;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde_json::{Map, Value, json};

/// OpenAI Chat Completions API
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAIAdapter;

/// Header carrying the per-attempt deduplication token
pub const IDEMPOTENCY_HEADER: &str = "idempotency-key";

/// Stream terminator sent after the last chunk
const DONE_MARKER: &str = "[DONE]";

impl VendorAdapter for OpenAIAdapter {
    fn build_request(
        &self,
        base_url: &str,
        credential: &Credential,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            secret_header(&format!("Bearer {}", credential.expose()))?,
        );
        // New token per attempt, never reused across retries
        let token = uuid::Uuid::new_v4().to_string();
        insert_header(
            &mut headers,
            IDEMPOTENCY_HEADER,
            HeaderValue::from_str(&token)
                .map_err(|_| LlmError::validation("Invalid idempotency token"))?,
        );
        if stream {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system_text() {
            messages.push(json!({ "role": "system", "content": system }));
        }
        messages.push(json!({ "role": "user", "content": request.prompt }));

        let mut body = Map::new();
        merge_config(&mut body, request);
        body.insert("model".to_string(), Value::String(model.to_string()));
        body.insert("messages".to_string(), Value::Array(messages));
        if stream {
            body.insert("stream".to_string(), Value::Bool(true));
        } else {
            body.remove("stream");
        }

        Ok(PreparedRequest {
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            query: Vec::new(),
            headers,
            body: Value::Object(body),
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String, LlmError> {
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| LlmError::missing_field("openai", "choices[0].message.content"))
    }

    fn extract_delta(&self, payload: &str) -> Option<String> {
        if payload.trim() == DONE_MARKER {
            return None;
        }
        let frame = parse_frame("openai", payload)?;
        frame
            .get("choices")?
            .get(0)?
            .get("delta")?
            .get("content")?
            .as_str()
            .map(str::to_string)
    }
}
