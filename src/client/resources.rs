//! Resource entry points: completions, chat completions, generations

use serde_json::json;

use super::NumexaClient;
use super::request::{ChatCompletionRequest, CompletionRequest, GenerationRequest};
use crate::defaults::paths;
use crate::error::LlmError;
use crate::execution::{FanOut, PlanRequest, RequestBody, dispatch};
use crate::streaming::{Completion, ResponseDecoder};
use crate::types::{
    ChatCompletion, ChatCompletionChunk, GenericResponse, TextCompletion, TextCompletionChunk,
};

/// Decoded chat completion call.
pub type ChatCompletionResult = Completion<ChatCompletion, ChatCompletionChunk>;
/// Decoded text completion call.
pub type TextCompletionResult = Completion<TextCompletion, TextCompletionChunk>;

/// `POST /v1/complete`
#[derive(Debug, Clone, Copy)]
pub struct Completions<'a> {
    client: &'a NumexaClient,
}

impl<'a> Completions<'a> {
    pub(super) fn new(client: &'a NumexaClient) -> Self {
        Self { client }
    }

    /// Run a text completion and return the first successful leg.
    pub async fn create(&self, request: CompletionRequest) -> Result<TextCompletionResult, LlmError> {
        self.create_all(request).await?.into_result()
    }

    /// Run a text completion and return every attempted leg.
    pub async fn create_all(
        &self,
        request: CompletionRequest,
    ) -> Result<FanOut<TextCompletionResult>, LlmError> {
        self.client
            .complete(
                paths::COMPLETION,
                request.config.as_ref(),
                &request.params,
                request.stream,
                request.timeout,
                ResponseDecoder::new("completion"),
            )
            .await
    }
}

/// `POST /chat/completions`
#[derive(Debug, Clone, Copy)]
pub struct ChatCompletions<'a> {
    client: &'a NumexaClient,
}

impl<'a> ChatCompletions<'a> {
    pub(super) fn new(client: &'a NumexaClient) -> Self {
        Self { client }
    }

    /// Run a chat completion and return the first successful leg.
    pub async fn create(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResult, LlmError> {
        self.create_all(request).await?.into_result()
    }

    /// Run a chat completion and return every attempted leg.
    pub async fn create_all(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<FanOut<ChatCompletionResult>, LlmError> {
        let path = if self.client.config().proxy_enabled {
            paths::CHAT_COMPLETION
        } else {
            paths::CHAT_COMPLETION_DIRECT
        };
        self.client
            .complete(
                path,
                request.config.as_ref(),
                &request.params,
                request.stream,
                request.timeout,
                ResponseDecoder::new("chat completion"),
            )
            .await
    }
}

/// `POST /v1/prompts/{id}/generate`
#[derive(Debug, Clone, Copy)]
pub struct Generations<'a> {
    client: &'a NumexaClient,
}

impl<'a> Generations<'a> {
    pub(super) fn new(client: &'a NumexaClient) -> Self {
        Self { client }
    }

    /// Render and run a named prompt.
    pub async fn create(&self, request: GenerationRequest) -> Result<GenericResponse, LlmError> {
        if request.prompt_id.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "A prompt id is required for generations".into(),
            ));
        }

        let path = paths::generate(&request.prompt_id);
        let descriptors = self
            .client
            .planner(request.config.as_ref(), request.timeout)
            .plan(PlanRequest {
                path: &path,
                body: RequestBody::Variables(json!({ "variables": request.variables })),
                mode: None,
                params: None,
                stream: false,
            })?;

        let decoder = ResponseDecoder::<GenericResponse, GenericResponse>::without_chunks("generations");
        dispatch(&self.client.executor, descriptors, self.client.policy(), |raw| {
            decoder.decode(raw, false)
        })
        .await?
        .into_result()?
        .into_full()
    }
}
