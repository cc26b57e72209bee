//! Per-call routing configuration

use secrecy::SecretString;

use super::common::RoutingMode;
use super::options::ProviderOptions;
use crate::error::{LlmError, flatten_validation_errors};

/// Routing mode plus the ordered list of targets for one logical call.
///
/// An optional API key and base URL override the client-wide values for the
/// calls made with this config. A `Config` is never persisted and is not
/// mutated while a call is in flight.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: RoutingMode,
    pub llms: Vec<ProviderOptions>,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
}

impl Config {
    /// Build and validate a config. Every violated field across all
    /// provider options is reported in one `ValidationError`.
    pub fn new(mode: RoutingMode, llms: Vec<ProviderOptions>) -> Result<Self, LlmError> {
        let config = Self {
            mode,
            llms,
            api_key: None,
            base_url: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Shorthand for a `single` config with one target.
    pub fn single(llm: ProviderOptions) -> Result<Self, LlmError> {
        Self::new(RoutingMode::Single, vec![llm])
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(api_key.into()));
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Model identifiers in provider order.
    pub fn models(&self) -> Vec<Option<&str>> {
        self.llms.iter().map(ProviderOptions::model_id).collect()
    }

    pub fn validate(&self) -> Result<(), LlmError> {
        let mut fields = Vec::new();
        let mut messages = Vec::new();
        for (index, llm) in self.llms.iter().enumerate() {
            if let Err(errors) = llm.check() {
                fields.extend(
                    flatten_validation_errors(&errors)
                        .into_iter()
                        .map(|f| format!("llms[{index}].{f}")),
                );
                messages.push(format!("llms[{index}]: {errors}"));
            }
        }
        if fields.is_empty() {
            Ok(())
        } else {
            Err(LlmError::validation("Config", fields, messages.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderType;

    #[test]
    fn collects_violations_across_all_targets() {
        let err = Config::new(
            RoutingMode::Fallback,
            vec![
                ProviderOptions::new(ProviderType::OpenAi).with_model("gpt-4"),
                ProviderOptions::new(ProviderType::Anthropic),
                ProviderOptions::new(ProviderType::Cohere).with_weight(-1.0),
            ],
        )
        .unwrap_err();
        match err {
            LlmError::ValidationError { target, fields, .. } => {
                assert_eq!(target, "Config");
                assert_eq!(
                    fields,
                    vec!["llms[1].model", "llms[2].model", "llms[2].weight"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn single_builds_valid_config() {
        let config =
            Config::single(ProviderOptions::new(ProviderType::OpenAi).with_model("m1")).unwrap();
        assert_eq!(config.mode, RoutingMode::Single);
        assert_eq!(config.models(), vec![Some("m1")]);
    }
}
