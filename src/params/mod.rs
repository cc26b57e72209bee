//! Parameter Management Module
//!
//! Builds the provider-agnostic parameter bag and normalizes it before it is
//! serialized onto the wire.

pub mod normalize;

pub use normalize::{is_empty_value, remove_empty_values};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::error::LlmError;
use crate::types::Message;

/// Request parameters shared by every target of one call.
///
/// `prompt` is used by text completions, `messages` by chat completions.
/// Anything not modelled explicitly goes into `extra` and is sent verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct Params {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub messages: Option<Vec<Message>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub top_p: Option<f32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub const fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub const fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Add an arbitrary extension field (e.g. `stop_sequences`, `user`).
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Canonical mapping with empty values removed and `stream` set.
    ///
    /// A missing `prompt`/`messages` is passed through; the wire format
    /// decides whether that is acceptable.
    pub fn normalized(&self, stream: bool) -> Result<Map<String, Value>, LlmError> {
        let mut map = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        map.insert("stream".into(), Value::Bool(stream));
        Ok(normalize_map(map))
    }

    pub fn ensure_valid(&self) -> Result<(), LlmError> {
        self.validate()
            .map_err(|e| LlmError::from_validation("Params", &e))
    }
}

fn normalize_map(map: Map<String, Value>) -> Map<String, Value> {
    match remove_empty_values(Value::Object(map)) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalized_drops_absent_and_keeps_explicit_zero() {
        let params = Params::new()
            .with_messages(vec![Message::user("hi")])
            .with_temperature(0.0)
            .with_extra("user", "")
            .with_extra("logit_bias", json!({}))
            .with_extra("echo", false);
        let map = params.normalized(false).unwrap();
        assert_eq!(
            Value::Object(map),
            json!({
                "messages": [{"role": "user", "content": "hi"}],
                "temperature": 0.0,
                "echo": false,
                "stream": false
            })
        );
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let params = Params::new()
            .with_prompt("why is the sky blue?")
            .with_max_tokens(256)
            .with_extra("metadata", json!({"a": null, "b": {"c": ""}}))
            .with_extra("stop", json!(["", "\n"]));
        let once = params.normalized(true).unwrap();
        let twice = normalize_map(once.clone());
        assert_eq!(once, twice);
        assert!(!once.contains_key("metadata"));
        assert_eq!(once["stop"], json!(["\n"]));
    }

    #[test]
    fn out_of_range_sampling_is_rejected() {
        let err = Params::new()
            .with_temperature(3.5)
            .with_top_p(1.5)
            .ensure_valid()
            .unwrap_err();
        match err {
            LlmError::ValidationError { fields, .. } => {
                assert_eq!(fields, vec!["temperature", "top_p"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
