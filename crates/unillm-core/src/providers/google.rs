use super::{PreparedRequest, VendorAdapter, parse_frame};
use crate::credentials::Credential;
use crate::error::LlmError;
use crate::types::GenerationRequest;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde_json::{Value, json};

/// Google Generative Language API (`generateContent`)
#[derive(Debug, Clone, Copy, Default)]
pub struct GoogleAdapter;

/// Concatenated `text` of `candidates[0].content.parts`
fn candidate_text(body: &Value) -> Option<String> {
    let parts = body
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;

    Some(
        parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect(),
    )
}

impl VendorAdapter for GoogleAdapter {
    fn build_request(
        &self,
        base_url: &str,
        credential: &Credential,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError> {
        let base = base_url.trim_end_matches('/');
        let mut query = Vec::new();
        let mut headers = HeaderMap::new();

        let url = if stream {
            query.push(("alt", "sse".to_string()));
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
            format!("{base}/{model}:streamGenerateContent")
        } else {
            format!("{base}/{model}:generateContent")
        };
        query.push(("key", credential.expose().to_string()));

        let mut body = json!({
            "contents": [{ "parts": [{ "text": request.prompt }] }]
        });
        if let Some(system) = request.system_text() {
            body["systemInstruction"] = json!({ "parts": [{ "text": system }] });
        }
        if let Some(config) = request.config_entries() {
            body["generationConfig"] = Value::Object(config.clone());
        }

        Ok(PreparedRequest {
            url,
            query,
            headers,
            body,
        })
    }

    fn extract_text(&self, body: &Value) -> Result<String, LlmError> {
        candidate_text(body)
            .ok_or_else(|| LlmError::missing_field("google", "candidates[0].content.parts"))
    }

    fn extract_delta(&self, payload: &str) -> Option<String> {
        let frame = parse_frame("google", payload)?;
        candidate_text(&frame)
    }
}
