//! Provider-independent completion shapes
//!
//! The proxy normalizes every upstream answer to these shapes, so the same
//! type decodes a response no matter which provider produced it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use super::construct::Construct;
use super::message::{Message, MessageRole};

/// Token accounting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<u32>,
}

/// One choice of a buffered chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChatChoice {
    #[serde(default)]
    pub index: u32,
    #[validate(required, nested)]
    pub message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
}

/// A full chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChatCompletion {
    #[validate(required)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[validate(required)]
    pub model: Option<String>,
    #[validate(required, nested)]
    pub choices: Option<Vec<ChatChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_fingerprint: Option<String>,
}

impl ChatCompletion {
    /// Content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .as_ref()?
            .first()?
            .message
            .as_ref()?
            .text()
    }
}

impl Construct for ChatCompletion {
    const TYPE_NAME: &'static str = "ChatCompletion";
}

/// Incremental message delta.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<MessageRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Value>,
}

/// One choice of a streamed chat chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// One streamed unit of a chat completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ChatCompletionChunk {
    #[validate(required)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[validate(required)]
    pub model: Option<String>,
    #[validate(required)]
    pub choices: Option<Vec<ChatChunkChoice>>,
}

impl ChatCompletionChunk {
    /// Content delta of the first choice.
    pub fn delta_text(&self) -> Option<&str> {
        self.choices.as_ref()?.first()?.delta.content.as_deref()
    }
}

impl Construct for ChatCompletionChunk {
    const TYPE_NAME: &'static str = "ChatCompletionChunk";
}

/// One choice of a text completion (buffered or streamed).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logprobs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// A full text completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TextCompletion {
    #[validate(required)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[validate(required)]
    pub model: Option<String>,
    #[validate(required)]
    pub choices: Option<Vec<TextChoice>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl TextCompletion {
    pub fn text(&self) -> Option<&str> {
        Some(self.choices.as_ref()?.first()?.text.as_str())
    }
}

impl Construct for TextCompletion {
    const TYPE_NAME: &'static str = "TextCompletion";
}

/// One streamed unit of a text completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct TextCompletionChunk {
    #[validate(required)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    #[validate(required)]
    pub model: Option<String>,
    #[validate(required)]
    pub choices: Option<Vec<TextChoice>>,
}

impl TextCompletionChunk {
    pub fn delta_text(&self) -> Option<&str> {
        Some(self.choices.as_ref()?.first()?.text.as_str())
    }
}

impl Construct for TextCompletionChunk {
    const TYPE_NAME: &'static str = "TextCompletionChunk";
}

/// Response of a named-prompt generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GenericResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// Any other top-level fields, kept verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl Construct for GenericResponse {
    const TYPE_NAME: &'static str = "GenericResponse";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use serde_json::json;

    fn chat_json() -> Value {
        json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "created": 1677652288,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello there"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21},
            "system_fingerprint": "fp_44709d6fcb"
        })
    }

    #[test]
    fn chat_completion_reserializes_declared_fields() {
        let original = chat_json();
        let completion = ChatCompletion::construct(original.clone()).unwrap();
        assert_eq!(completion.text(), Some("Hello there"));
        assert_eq!(serde_json::to_value(&completion).unwrap(), original);
    }

    #[test]
    fn missing_required_field_is_named() {
        let mut raw = chat_json();
        raw.as_object_mut().unwrap().remove("model");
        match ChatCompletion::construct(raw).unwrap_err() {
            LlmError::ValidationError { target, fields, .. } => {
                assert_eq!(target, "ChatCompletion");
                assert_eq!(fields, vec!["model"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn lists_every_missing_field() {
        let raw = json!({"object": "chat.completion"});
        match ChatCompletion::construct(raw).unwrap_err() {
            LlmError::ValidationError { fields, .. } => {
                assert_eq!(fields, vec!["choices", "id", "model"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_choice_without_message_is_reported() {
        let raw = json!({"id": "x", "model": "m", "choices": [{"index": 0}]});
        match ChatCompletion::construct(raw).unwrap_err() {
            LlmError::ValidationError { fields, .. } => {
                assert_eq!(fields, vec!["choices[0].message"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn nested_and_top_level_violations_are_reported_together() {
        let raw = json!({"choices": [{"index": 0, "message": {"content": "x"}}]});
        match ChatCompletion::construct(raw).unwrap_err() {
            LlmError::ValidationError { target, fields, .. } => {
                assert_eq!(target, "ChatCompletion");
                assert_eq!(fields, vec!["choices[0].message.role", "id", "model"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn chunk_exposes_delta_text() {
        let chunk = ChatCompletionChunk::construct(json!({
            "id": "c1",
            "object": "chat.completion.chunk",
            "created": 1,
            "model": "gpt-3.5-turbo",
            "choices": [{"index": 0, "delta": {"content": "Hel"}, "finish_reason": null}]
        }))
        .unwrap();
        assert_eq!(chunk.delta_text(), Some("Hel"));
    }

    #[test]
    fn generic_response_keeps_unknown_fields() {
        let resp = GenericResponse::construct(json!({"success": true, "data": {"a": 1}, "trace": "t"}))
            .unwrap();
        assert_eq!(resp.success, Some(true));
        assert_eq!(resp.extra["trace"], "t");
    }
}
