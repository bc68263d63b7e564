//! # unillm-core - Unified LLM Generation Client
//!
//! One client, three vendors. A [`Client`] is bound to Google Gemini, OpenAI
//! or Anthropic Claude at construction and exposes the same text generation
//! surface for all of them, in blocking-style and streaming form.
//!
//! ## Features
//!
//! - **Three Providers** - Google, OpenAI, Claude behind one request shape
//! - **Streaming** - Server-Sent Events decoded into plain text deltas
//! - **Retries** - Exponential backoff with jitter, honouring `Retry-After`
//! - **Cancellation** - Per-request tokens abort in-flight calls and backoff sleeps
//! - **Observability** - `log` records plus streaming metrics via `metrics`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use unillm_core::{Client, GenerationRequest, Provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads OPENAI_API_KEY when no key is passed
//!     let client = Client::new(Provider::OpenAI, None, None)?;
//!     let text = client
//!         .generate(GenerationRequest::new("What is the capital of France?"))
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```
//!
//! ## Streaming
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use unillm_core::{Client, GenerationRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::from_name("claude", None, None)?;
//!     let request = GenerationRequest::new("Tell me a story").system("Be brief");
//!
//!     let mut stream = client.generate_stream(request).await?;
//!     while let Some(delta) = stream.next().await {
//!         print!("{}", delta?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`Result<T, LlmError>`](LlmError):
//!
//! ```rust,no_run
//! # use unillm_core::{Client, GenerationRequest, LlmError, Provider};
//! # async fn run(client: Client) {
//! match client.generate(GenerationRequest::new("Hi")).await {
//!     Ok(text) => println!("{text}"),
//!     Err(LlmError::Configuration { message }) => println!("Bad setup: {message}"),
//!     Err(e) if e.status() == Some(429) => println!("Still rate limited: {e}"),
//!     Err(e) => println!("Other error: {e}"),
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod middleware;
pub mod providers;
pub mod retry;
pub mod types;
pub mod utils;


pub use client::Client;
pub use config::ClientConfig;
pub use credentials::{Credential, EnvSource, ProcessEnv};
pub use error::LlmError;
pub use middleware::{MetricsStream, StreamingMetrics};
pub use providers::{PreparedRequest, VendorAdapter};
pub use retry::RetryPolicy;
pub use types::{GenerationConfig, GenerationRequest, Provider, TextStream};
pub use utils::sse::{SseDecoder, sse_payloads};

pub use tokio_util::sync::CancellationToken;
