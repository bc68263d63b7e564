use crate::error::LlmError;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::str::FromStr;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use tokio_util::sync::CancellationToken;

/// Supported text generation backends
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[strum(to_string = "google")]
    Google,
    #[strum(to_string = "openai")]
    OpenAI,
    #[strum(to_string = "claude", serialize = "anthropic")]
    #[serde(alias = "anthropic")]
    Claude,
}

impl Provider {
    /// Parse a provider name, failing with a configuration error
    pub fn parse(name: &str) -> Result<Self, LlmError> {
        Provider::from_str(name.trim())
            .map_err(|_| LlmError::configuration(format!("Unknown provider: {name}")))
    }

    /// Canonical provider identifier
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::OpenAI => "openai",
            Provider::Claude => "claude",
        }
    }

    /// Environment variables searched for a credential, in priority order
    pub fn env_keys(&self) -> &'static [&'static str] {
        match self {
            Provider::Google => &["GOOGLE_API_KEY", "GOOGLE_GENAI_API_KEY"],
            Provider::OpenAI => &["OPENAI_API_KEY"],
            Provider::Claude => &["CLAUDE_API_KEY", "ANTHROPIC_API_KEY"],
        }
    }

    /// Default base URL used when no explicit endpoint is configured
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Google => "https://generativelanguage.googleapis.com/v1beta/models",
            Provider::OpenAI => "https://api.openai.com/v1",
            Provider::Claude => "https://api.anthropic.com/v1",
        }
    }

    /// Model used when neither the request nor the config names one
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Google => "gemini-2.0-flash",
            Provider::OpenAI => "gpt-4o-mini",
            Provider::Claude => "claude-3-5-haiku-20241022",
        }
    }
}

/// Provider-specific tuning parameters, passed through unvalidated
pub type GenerationConfig = serde_json::Map<String, serde_json::Value>;

/// Lazy sequence of text deltas from a streamed generation
pub type TextStream = Pin<Box<dyn futures::Stream<Item = Result<String, LlmError>> + Send>>;

/// One generation call
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub generation_config: Option<GenerationConfig>,
    pub model: Option<String>,
    pub cancellation: Option<CancellationToken>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn generation_config(mut self, config: GenerationConfig) -> Self {
        self.generation_config = Some(config);
        self
    }

    /// Set a single generation parameter, e.g. `temperature`
    pub fn param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::new)
            .insert(key.into(), value);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Abort the call (between retries or mid-stream) when the token fires
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Non-empty generation config, if any
    pub(crate) fn config_entries(&self) -> Option<&GenerationConfig> {
        self.generation_config.as_ref().filter(|c| !c.is_empty())
    }

    /// System instruction, unless blank
    pub(crate) fn system_text(&self) -> Option<&str> {
        self.system_instruction
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }

    pub(crate) fn validate(&self) -> Result<(), LlmError> {
        if self.prompt.trim().is_empty() {
            return Err(LlmError::validation("Prompt cannot be empty"));
        }
        Ok(())
    }
}
