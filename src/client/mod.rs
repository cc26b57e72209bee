//! Numexa client
//!
//! [`NumexaClient`] owns the transport and the client-wide configuration and
//! exposes the three resource entry points:
//!
//! ```rust,no_run
//! use numexa::prelude::*;
//!
//! # async fn run() -> Result<(), LlmError> {
//! let client = NumexaClient::new(ClientConfig::proxy("nx-key"))?;
//! let config = Config::new(
//!     RoutingMode::Fallback,
//!     vec![
//!         ProviderOptions::new(ProviderType::OpenAi).with_model("gpt-4").with_virtual_key("vk-1"),
//!         ProviderOptions::new(ProviderType::Anthropic).with_model("claude-2").with_virtual_key("vk-2"),
//!     ],
//! )?;
//! let reply = client
//!     .chat_completions()
//!     .create(ChatCompletionRequest::new(vec![Message::user("Hello")]).with_config(config))
//!     .await?
//!     .into_full()?;
//! println!("{:?}", reply.text());
//! # Ok(())
//! # }
//! ```

mod request;
mod resources;

pub use request::{ChatCompletionRequest, CompletionRequest, GenerationRequest};
pub use resources::{
    ChatCompletionResult, ChatCompletions, Completions, Generations, TextCompletionResult,
};

use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::LlmError;
use crate::execution::{
    DispatchPolicy, FanOut, PlanRequest, RequestBody, RequestPlanner, TransportExecutor, dispatch,
};
use crate::params::Params;
use crate::streaming::{Completion, ResponseDecoder};
use crate::telemetry::{IngestLogSink, TelemetrySink};
use crate::types::{Config, Construct};

/// Async client for the Numexa proxy (or, in direct mode, the provider).
#[derive(Clone)]
pub struct NumexaClient {
    config: Arc<ClientConfig>,
    executor: TransportExecutor,
    default_config: Option<Config>,
}

impl std::fmt::Debug for NumexaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NumexaClient")
            .field("base_url", &self.config.base_url)
            .field("proxy_enabled", &self.config.proxy_enabled)
            .field("log_mirroring", &self.config.log_mirroring)
            .field("has_default_config", &self.default_config.is_some())
            .finish()
    }
}

impl NumexaClient {
    /// Build a client. Fails if the config lacks the key its mode needs.
    pub fn new(config: ClientConfig) -> Result<Self, LlmError> {
        config.ensure_usable()?;

        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| LlmError::ConfigurationError(format!("Failed to build HTTP client: {e}")))?;

        let mut executor = TransportExecutor::new(http_client.clone());
        if let (true, Some(url)) = (config.log_mirroring, &config.ingest_url) {
            let sink = IngestLogSink::new(http_client, url.clone(), config.api_key.clone());
            executor = executor.with_sink(Arc::new(sink));
        }

        tracing::debug!(
            target: "numexa::http",
            base_url = %config.base_url,
            proxy = config.proxy_enabled,
            log_mirroring = config.log_mirroring,
            "numexa client ready"
        );

        Ok(Self {
            config: Arc::new(config),
            executor,
            default_config: None,
        })
    }

    /// Build a client from `NUMEXA_*` environment variables.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Replace the log-mirroring sink (also enables mirroring).
    pub fn with_telemetry_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.executor = self.executor.with_sink(sink);
        self
    }

    /// Routing config used by calls that do not carry their own.
    pub fn with_default_config(mut self, config: Config) -> Self {
        self.default_config = Some(config);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn completions(&self) -> Completions<'_> {
        Completions::new(self)
    }

    pub fn chat_completions(&self) -> ChatCompletions<'_> {
        ChatCompletions::new(self)
    }

    pub fn generations(&self) -> Generations<'_> {
        Generations::new(self)
    }

    fn planner(&self, call_config: Option<&Config>, timeout: Option<Duration>) -> RequestPlanner {
        let mut planner = RequestPlanner::new(&self.config);
        if let Some(config) = call_config {
            planner = planner.with_call_config(config);
        }
        if let Some(timeout) = timeout {
            planner = planner.with_timeout(timeout);
        }
        planner
    }

    fn policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            fan_out: self.config.fan_out,
            on_status_error: self.config.on_status_error,
        }
    }

    /// Plan, dispatch and decode one completion call.
    async fn complete<F, C>(
        &self,
        path: &str,
        call_config: Option<&Config>,
        params: &Params,
        stream: bool,
        timeout: Option<Duration>,
        decoder: ResponseDecoder<F, C>,
    ) -> Result<FanOut<Completion<F, C>>, LlmError>
    where
        F: Construct,
        C: Construct,
    {
        let config = call_config.or(self.default_config.as_ref()).ok_or_else(|| {
            LlmError::ConfigurationError(
                "No routing config given; pass one with the request or set a client default"
                    .into(),
            )
        })?;
        config.validate()?;
        params.ensure_valid()?;

        let descriptors = self.planner(Some(config), timeout).plan(PlanRequest {
            path,
            body: RequestBody::Providers(config.llms.clone()),
            mode: Some(config.mode),
            params: Some(params),
            stream,
        })?;

        dispatch(&self.executor, descriptors, self.policy(), |raw| {
            decoder.decode(raw, stream)
        })
        .await
    }
}
