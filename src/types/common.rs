//! Common types and enums used across the library

use serde::{Deserialize, Serialize};

/// Upstream provider identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderType {
    #[serde(rename = "openai")]
    OpenAi,
    #[serde(rename = "cohere")]
    Cohere,
    #[serde(rename = "anthropic")]
    Anthropic,
    #[serde(rename = "azure-openai")]
    AzureOpenAi,
    #[serde(rename = "huggingface")]
    HuggingFace,
    #[serde(rename = "anyscale")]
    Anyscale,
}

impl ProviderType {
    /// Wire name of the provider.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Cohere => "cohere",
            Self::Anthropic => "anthropic",
            Self::AzureOpenAi => "azure-openai",
            Self::HuggingFace => "huggingface",
            Self::Anyscale => "anyscale",
        }
    }

    /// Parse a wire name. Unknown names are rejected rather than guessed.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "openai" => Some(Self::OpenAi),
            "cohere" => Some(Self::Cohere),
            "anthropic" => Some(Self::Anthropic),
            "azure-openai" => Some(Self::AzureOpenAi),
            "huggingface" => Some(Self::HuggingFace),
            "anyscale" => Some(Self::Anyscale),
            _ => None,
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the proxy interprets the list of provider options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    /// Use the first (only) target.
    Single,
    /// Try targets in order until one succeeds.
    Fallback,
    /// Split traffic between targets by weight.
    AbTest,
}

impl RoutingMode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Fallback => "fallback",
            Self::AbTest => "ab_test",
        }
    }
}

impl std::fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoutingMode {
    type Err = crate::error::LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "fallback" => Ok(Self::Fallback),
            "ab_test" => Ok(Self::AbTest),
            other => Err(crate::error::LlmError::validation(
                "RoutingMode",
                vec!["mode".to_string()],
                format!("unknown routing mode '{other}'"),
            )),
        }
    }
}

/// Proxy-side cache flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheType {
    Simple,
    Semantic,
}
