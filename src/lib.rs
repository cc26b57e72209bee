//! # Numexa - Async client for the Numexa LLM proxy
//!
//! Sends chat and text completion requests to the Numexa proxy, which routes
//! one logical call to one or more upstream providers (`single`, `fallback`
//! or `ab_test`). In direct mode the client talks to the provider itself and
//! fans a call out into one request per configured model.
//!
#![deny(unsafe_code)]

//! ## Features
//!
//! - **One pipeline**: plan, execute, decode; the same path serves every resource.
//! - **Typed responses**: completions and stream chunks are validated, and a missing field is reported by name.
//! - **Streaming**: server-sent events are decoded lazily into a fused chunk stream.
//! - **No hidden state**: configuration is an explicit object, resolved from the environment only on request.
//! - **Honest fan-out**: every direct-mode leg is accounted for, success or failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use numexa::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = NumexaClient::from_env()?;
//!     let config = Config::single(
//!         ProviderOptions::new(ProviderType::OpenAi)
//!             .with_model("gpt-3.5-turbo")
//!             .with_virtual_key("openai-vk"),
//!     )?;
//!
//!     let request = ChatCompletionRequest::new(vec![Message::user("Tell me a joke")])
//!         .with_config(config)
//!         .with_stream(true);
//!     let mut stream = client.chat_completions().create(request).await?.into_stream()?;
//!     while let Some(chunk) = stream.next().await {
//!         print!("{}", chunk?.delta_text().unwrap_or_default());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod params;
pub mod streaming;
pub mod telemetry;
pub mod types;

pub use client::NumexaClient;
pub use config::ClientConfig;
pub use error::LlmError;

/// Library version, sent as `X-Numexa-package-version`.
pub const VERSION: &str = defaults::VERSION;

/// Everything needed for the common call paths.
pub mod prelude {
    pub use crate::client::{
        ChatCompletionRequest, CompletionRequest, GenerationRequest, NumexaClient,
    };
    pub use crate::config::{ClientConfig, FanOutPolicy, StatusErrorPolicy};
    pub use crate::error::LlmError;
    pub use crate::execution::{FanOut, LegOutcome};
    pub use crate::params::Params;
    pub use crate::streaming::{Completion, CompletionStream};
    pub use crate::telemetry::TelemetrySink;
    pub use crate::types::*;
}
