//! Request builders for the resource entry points

use std::time::Duration;

use serde_json::Value;

use crate::params::Params;
use crate::types::{Config, Message};

/// A chat completion call.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletionRequest {
    /// Routing config; falls back to the client default when unset.
    pub config: Option<Config>,
    pub params: Params,
    pub stream: bool,
    /// Per-call timeout, overriding the client-wide one.
    pub timeout: Option<Duration>,
}

impl ChatCompletionRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            params: Params::new().with_messages(messages),
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params = self.params.with_temperature(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params = self.params.with_max_tokens(max_tokens);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.params = self.params.with_top_k(top_k);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.params = self.params.with_top_p(top_p);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params = self.params.with_extra(key, value);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A text completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub config: Option<Config>,
    pub params: Params,
    pub stream: bool,
    pub timeout: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            params: Params::new().with_prompt(prompt),
            ..Default::default()
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.params = self.params.with_temperature(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.params = self.params.with_max_tokens(max_tokens);
        self
    }

    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.params = self.params.with_top_k(top_k);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.params = self.params.with_top_p(top_p);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params = self.params.with_extra(key, value);
        self
    }

    pub fn with_stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A named-prompt generation call.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt_id: String,
    /// Template variables, sent as `{"variables": ...}`.
    pub variables: Value,
    /// Only the key and base URL overrides of this config are used.
    pub config: Option<Config>,
    pub timeout: Option<Duration>,
}

impl GenerationRequest {
    pub fn new(prompt_id: impl Into<String>) -> Self {
        Self {
            prompt_id: prompt_id.into(),
            variables: Value::Object(Default::default()),
            config: None,
            timeout: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = variables;
        self
    }

    /// Set one template variable.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        if !self.variables.is_object() {
            self.variables = Value::Object(Default::default());
        }
        if let Value::Object(map) = &mut self.variables {
            map.insert(name.into(), value.into());
        }
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
