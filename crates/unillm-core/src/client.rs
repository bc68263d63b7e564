use crate::config::{ClientConfig, retry_parsing};
use crate::credentials::{Credential, EnvSource, ProcessEnv, resolve_credential};
use crate::error::LlmError;
use crate::middleware::MetricsStream;
use crate::providers::{PreparedRequest, VendorAdapter};
use crate::retry::RetryPolicy;
use crate::types::{GenerationRequest, Provider, TextStream};
use crate::utils::sse::sse_payloads;
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use unicode_normalization::UnicodeNormalization;

/// Unified text generation client, bound to one provider for its lifetime
#[derive(Clone)]
pub struct Client {
    provider: Provider,
    credential: Credential,
    config: ClientConfig,
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Create a client, falling back to the process environment for the credential
    pub fn new(
        provider: Provider,
        credential: Option<&str>,
        config: Option<ClientConfig>,
    ) -> Result<Self, LlmError> {
        Self::with_env(provider, credential, config, &ProcessEnv)
    }

    /// Create a client from a provider name such as `"google"` or `"claude"`
    pub fn from_name(
        provider: &str,
        credential: Option<&str>,
        config: Option<ClientConfig>,
    ) -> Result<Self, LlmError> {
        Self::new(Provider::parse(provider)?, credential, config)
    }

    /// Create a client that resolves its credential from `env`
    pub fn with_env(
        provider: Provider,
        credential: Option<&str>,
        config: Option<ClientConfig>,
        env: &dyn EnvSource,
    ) -> Result<Self, LlmError> {
        let config = config.unwrap_or_default();
        config.validate()?;
        let credential = resolve_credential(provider, credential, env)?;

        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .read_timeout(config.read_timeout())
            .build()
            .map_err(|e| LlmError::configuration(format!("Failed to build HTTP client: {e}")))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| provider.default_base_url().to_string());

        log::debug!("Created {provider} client for {base_url}");

        Ok(Self {
            provider,
            credential,
            retry: RetryPolicy::from_config(&config),
            config,
            base_url,
            http,
        })
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Model used when a request does not name one
    pub fn default_model(&self) -> &str {
        self.config
            .default_model
            .as_deref()
            .unwrap_or_else(|| self.provider.default_model())
    }

    fn resolve_model<'a>(&'a self, request: &'a GenerationRequest) -> &'a str {
        request
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.default_model())
    }

    fn prepare(
        &self,
        request: &GenerationRequest,
        model: &str,
        stream: bool,
    ) -> Result<PreparedRequest, LlmError> {
        self.provider
            .build_request(&self.base_url, &self.credential, request, model, stream)
    }

    /// Send one attempt and return the response once its status is 2xx
    async fn send(
        &self,
        prepared: PreparedRequest,
        attempt: u32,
        stream: bool,
    ) -> Result<reqwest::Response, LlmError> {
        // The URL is logged without its query string, which may hold a key
        log::debug!("POST {} ({}, attempt {attempt})", prepared.url, self.provider);

        let mut builder = self
            .http
            .post(&prepared.url)
            .headers(prepared.headers)
            .json(&prepared.body);
        if !prepared.query.is_empty() {
            builder = builder.query(&prepared.query);
        }
        if !stream {
            builder = builder.timeout(self.config.timeout());
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let retry_after = retry_parsing::retry_after_from_headers(response.headers());
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        if status.as_u16() == 429 {
            return Err(LlmError::rate_limit(
                format!("{} returned HTTP 429", self.provider),
                retry_after,
                Some(body),
            ));
        }
        Err(LlmError::request(status.as_u16(), body))
    }

    /// Generate text with one non-streaming exchange
    pub async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError> {
        request.validate()?;
        let model = self.resolve_model(&request);
        let req = &request;

        let raw = self
            .retry
            .execute(request.cancellation.as_ref(), |attempt| async move {
                let prepared = self.prepare(req, model, false)?;
                let response = self.send(prepared, attempt, false).await?;
                Ok::<_, LlmError>(response.text().await?)
            })
            .await?;

        let body: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            LlmError::serialization(format!("Failed to parse {} response", self.provider), e)
        })?;
        self.provider.extract_text(&body)
    }

    /// Generate text as a stream of deltas.
    ///
    /// Connecting and receiving the response headers is retried; once the body
    /// starts flowing, failures end the stream with an error item.
    pub async fn generate_stream(&self, request: GenerationRequest) -> Result<TextStream, LlmError> {
        request.validate()?;
        let model = self.resolve_model(&request);
        let req = &request;

        let response = self
            .retry
            .execute(request.cancellation.as_ref(), |attempt| async move {
                let prepared = self.prepare(req, model, true)?;
                self.send(prepared, attempt, true).await
            })
            .await?;

        let payloads = sse_payloads(
            Box::pin(response.bytes_stream()),
            self.config.max_stream_buffer_bytes,
        );
        let deltas = delta_stream(self.provider, payloads, request.cancellation.clone());

        Ok(Box::pin(MetricsStream::new(
            Box::pin(deltas),
            self.provider.name(),
        )))
    }

    /// Callback form of generation.
    ///
    /// With streaming enabled in the config, `on_chunk` runs once per delta in
    /// arrival order and `Ok(None)` is returned; the caller accumulates.
    /// Otherwise one non-streaming call is made, `on_chunk` is not called,
    /// and the full text is returned.
    pub async fn generate_with<F>(
        &self,
        request: GenerationRequest,
        mut on_chunk: F,
    ) -> Result<Option<String>, LlmError>
    where
        F: FnMut(&str),
    {
        if !self.config.stream {
            return self.generate(request).await.map(Some);
        }

        let mut stream = self.generate_stream(request).await?;
        while let Some(delta) = stream.next().await {
            on_chunk(&delta?);
        }
        Ok(None)
    }
}

/// Turn SSE payloads into NFC-normalized, non-empty text deltas
fn delta_stream<S>(
    provider: Provider,
    mut payloads: S,
    cancel: Option<CancellationToken>,
) -> impl Stream<Item = Result<String, LlmError>> + Send
where
    S: Stream<Item = Result<String, LlmError>> + Unpin + Send,
{
    async_stream::stream! {
        while let Some(item) = next_payload(&mut payloads, cancel.as_ref()).await {
            match item {
                Ok(payload) => {
                    if let Some(delta) = provider.extract_delta(&payload) {
                        if !delta.is_empty() {
                            yield Ok(delta.nfc().collect::<String>());
                        }
                    }
                }
                Err(e) => {
                    yield Err(e);
                    break;
                }
            }
        }
    }
}

async fn next_payload<S>(
    payloads: &mut S,
    cancel: Option<&CancellationToken>,
) -> Option<Result<String, LlmError>>
where
    S: Stream<Item = Result<String, LlmError>> + Unpin,
{
    match cancel {
        Some(token) => tokio::select! {
            biased;
            _ = token.cancelled() => Some(Err(LlmError::Cancelled)),
            item = payloads.next() => item,
        },
        None => payloads.next().await,
    }
}
