//! Provider options
//!
//! One `ProviderOptions` value describes one upstream target: which provider
//! and model to use, how to authenticate, and optional per-leg overrides.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use validator::{Validate, ValidationError, ValidationErrors};

use super::common::{CacheType, ProviderType};
use crate::error::LlmError;

/// Retry hints forwarded to the proxy. The client itself never retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct RetrySettings {
    #[validate(range(min = 1))]
    pub attempts: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub on_status_codes: Vec<u16>,
}

/// Parameters that apply to one leg only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct OverrideParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_sequences: Option<Vec<String>>,
    /// Provider-specific extras, sent as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// One upstream target.
///
/// Credentials are held as secrets and only exposed when the wire body is
/// assembled (see [`ProviderOptions::to_wire`]).
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ProviderOptions {
    pub provider: ProviderType,
    /// Required unless `override_params.model` is set.
    #[validate(length(min = 1))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip)]
    pub api_key: Option<SecretString>,
    #[serde(skip)]
    pub virtual_key: Option<SecretString>,
    /// Relative weight for A/B splits.
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[validate(nested)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetrySettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_status: Option<CacheType>,
    /// Cache entry lifetime in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
    #[validate(nested)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_params: Option<OverrideParams>,
}

impl ProviderOptions {
    /// Start describing a target for `provider`.
    pub fn new(provider: ProviderType) -> Self {
        Self {
            provider,
            model: None,
            api_key: None,
            virtual_key: None,
            weight: None,
            retry: None,
            cache_status: None,
            cache_age: None,
            trace_id: None,
            metadata: HashMap::new(),
            override_params: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Authenticate this leg with a direct provider key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    /// Authenticate this leg with a proxy-issued virtual key.
    pub fn with_virtual_key(mut self, key: impl Into<String>) -> Self {
        self.virtual_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = Some(weight);
        self
    }

    pub fn with_retry(mut self, attempts: u32, on_status_codes: Vec<u16>) -> Self {
        self.retry = Some(RetrySettings {
            attempts,
            on_status_codes,
        });
        self
    }

    pub fn with_cache(mut self, cache: CacheType, max_age_secs: Option<u64>) -> Self {
        self.cache_status = Some(cache);
        self.cache_age = max_age_secs;
        self
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_override_params(mut self, params: OverrideParams) -> Self {
        self.override_params = Some(params);
        self
    }

    /// Model identifier, falling back to the override model.
    pub fn model_id(&self) -> Option<&str> {
        self.model
            .as_deref()
            .or_else(|| self.override_params.as_ref()?.model.as_deref())
    }

    /// Run field rules plus the credential rule, collecting every violation.
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(e) => e,
        };
        if self.model_id().is_none() {
            let mut err = ValidationError::new("required");
            err.message = Some("set model or override_params.model".into());
            errors.add("model", err);
        }
        if self.api_key.is_some() && self.virtual_key.is_some() {
            let mut err = ValidationError::new("exclusive_credentials");
            err.message = Some("set either api_key or virtual_key, not both".into());
            errors.add("api_key", err.clone());
            errors.add("virtual_key", err);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate and report as an `LlmError`.
    pub fn ensure_valid(&self) -> Result<(), LlmError> {
        self.check()
            .map_err(|e| LlmError::from_validation("ProviderOptions", &e))
    }

    /// JSON shape sent to the proxy: credentials exposed, override params
    /// enriched with the leg's model.
    pub fn to_wire(&self) -> Result<Value, LlmError> {
        let mut value = serde_json::to_value(self)?;
        let Some(obj) = value.as_object_mut() else {
            return Err(LlmError::JsonError(
                "provider options did not serialize to an object".into(),
            ));
        };
        if let Some(key) = &self.api_key {
            obj.insert("api_key".into(), Value::String(key.expose_secret().to_string()));
        }
        if let Some(key) = &self.virtual_key {
            obj.insert(
                "virtual_key".into(),
                Value::String(key.expose_secret().to_string()),
            );
        }

        let mut overrides = self.override_params.clone().unwrap_or_default();
        if overrides.model.is_none() {
            overrides.model = self.model.clone();
        }
        obj.insert("override_params".into(), serde_json::to_value(overrides)?);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_model_is_reported() {
        let opts = ProviderOptions::new(ProviderType::OpenAi).with_virtual_key("vk");
        let err = opts.ensure_valid().unwrap_err();
        match err {
            LlmError::ValidationError { fields, .. } => assert_eq!(fields, vec!["model"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn reports_every_violation_at_once() {
        let opts = ProviderOptions::new(ProviderType::Anthropic)
            .with_api_key("sk")
            .with_virtual_key("vk")
            .with_weight(3.0);
        let err = opts.ensure_valid().unwrap_err();
        match err {
            LlmError::ValidationError { fields, .. } => {
                assert_eq!(fields, vec!["api_key", "model", "virtual_key", "weight"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn wire_shape_exposes_credentials_and_enriches_overrides() {
        let opts = ProviderOptions::new(ProviderType::OpenAi)
            .with_model("gpt-3.5-turbo")
            .with_virtual_key("vk-123")
            .with_metadata("_user", "sdk")
            .with_override_params(OverrideParams {
                temperature: Some(0.5),
                ..Default::default()
            });
        let wire = opts.to_wire().unwrap();
        assert_eq!(
            wire,
            json!({
                "provider": "openai",
                "model": "gpt-3.5-turbo",
                "virtual_key": "vk-123",
                "metadata": {"_user": "sdk"},
                "override_params": {"model": "gpt-3.5-turbo", "temperature": 0.5}
            })
        );
    }

    #[test]
    fn override_model_satisfies_the_model_rule() {
        let opts = ProviderOptions::new(ProviderType::OpenAi)
            .with_virtual_key("vk")
            .with_override_params(OverrideParams {
                model: Some("gpt-4".into()),
                ..Default::default()
            });
        assert!(opts.ensure_valid().is_ok());
        assert_eq!(opts.model_id(), Some("gpt-4"));

        let empty = ProviderOptions::new(ProviderType::OpenAi).with_model("");
        match empty.ensure_valid().unwrap_err() {
            LlmError::ValidationError { fields, .. } => assert_eq!(fields, vec!["model"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_keys() {
        let opts = ProviderOptions::new(ProviderType::OpenAi).with_api_key("sk-secret");
        assert!(!format!("{opts:?}").contains("sk-secret"));
    }
}
