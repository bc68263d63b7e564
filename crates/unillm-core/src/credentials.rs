//! Credential resolution
//!
//! A credential comes from an explicit argument or, failing that, from the
//! provider's ordered list of environment variables. The environment is an
//! injected [`EnvSource`] so construction never reaches for process globals
//! behind the caller's back.

use crate::error::LlmError;
use crate::types::Provider;
use std::collections::HashMap;
use std::fmt;

/// Key-value lookup consulted once, at client construction
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// API secret. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Resolve the credential for `provider`: the explicit value wins, then the
/// first non-empty environment variable in the provider's priority list.
pub fn resolve_credential(
    provider: Provider,
    explicit: Option<&str>,
    env: &dyn EnvSource,
) -> Result<Credential, LlmError> {
    if let Some(secret) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(Credential::new(secret));
    }

    for key in provider.env_keys() {
        if let Some(value) = env.var(key) {
            let value = value.trim();
            if !value.is_empty() {
                log::debug!("Using {provider} credential from {key}");
                return Ok(Credential::new(value));
            }
        }
    }

    Err(LlmError::configuration(format!(
        "No API key for {provider}: pass one explicitly or set {}",
        provider.env_keys().join(" or ")
    )))
}
