//! Typed construction from decoded JSON
//!
//! Every response shape the decoder can produce implements [`Construct`]:
//! decode with serde, then run structural validation so that every missing
//! required field is reported by path. Required fields are `Option`s checked
//! by `validator`, so serde only fails on a value of the wrong type.

use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::LlmError;

/// A typed decoding target for a full response or a stream chunk.
pub trait Construct: DeserializeOwned + Validate + Send + 'static {
    /// Name used in validation errors.
    const TYPE_NAME: &'static str;

    /// Build `Self` from a JSON value, failing with `ValidationError` listing
    /// every violated field.
    fn construct(value: serde_json::Value) -> Result<Self, LlmError> {
        let out: Self = serde_json::from_value(value).map_err(|e| {
            let message = e.to_string();
            LlmError::validation(Self::TYPE_NAME, serde_field_hint(&message), message)
        })?;
        out.validate()
            .map_err(|e| LlmError::from_validation(Self::TYPE_NAME, &e))?;
        Ok(out)
    }
}

/// serde names the offending field in backticks for missing/unknown fields.
fn serde_field_hint(message: &str) -> Vec<String> {
    if !(message.starts_with("missing field") || message.starts_with("unknown field")) {
        return Vec::new();
    }
    message
        .split('`')
        .nth(1)
        .map(|f| vec![f.to_string()])
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_missing_field_name() {
        assert_eq!(
            serde_field_hint("missing field `role` at line 1 column 2"),
            vec!["role".to_string()]
        );
        assert!(serde_field_hint("invalid type: string \"x\", expected u64").is_empty());
    }
}
