//! HTTP Headers Utility
//!
//! Header builder shared by proxy and direct requests, plus the
//! `X-Numexa-` prefixed header serialization.

use crate::defaults::{self, HEADER_PREFIX};
use crate::error::LlmError;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

/// HTTP header builder for API requests
pub struct HttpHeaderBuilder {
    headers: HeaderMap,
}

impl HttpHeaderBuilder {
    /// Create a new header builder
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// Add Bearer token authorization. A token that already carries the
    /// `Bearer ` prefix is sent verbatim.
    pub fn with_bearer_auth(mut self, token: &str) -> Result<Self, LlmError> {
        let auth_value = if token.starts_with("Bearer ") {
            token.to_string()
        } else {
            format!("Bearer {token}")
        };
        let mut value = HeaderValue::from_str(&auth_value)
            .map_err(|e| LlmError::ConfigurationError(format!("Invalid API key format: {e}")))?;
        value.set_sensitive(true);
        self.headers.insert(AUTHORIZATION, value);
        Ok(self)
    }

    /// Add JSON content type
    pub fn with_json_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, LlmError> {
        let (name, value) = header_pair(name, value)?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add a header whose value must not show up in debug output
    pub fn with_sensitive_header(mut self, name: &str, value: &str) -> Result<Self, LlmError> {
        let (name, mut value) = header_pair(name, value)?;
        value.set_sensitive(true);
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Add `X-Numexa-<name>` headers; objects and arrays are JSON-encoded.
    pub fn with_prefixed_headers(mut self, extra: &[(String, Value)]) -> Result<Self, LlmError> {
        for (name, value) in serialize_header_values(extra) {
            let (name, value) = header_pair(&name, &value)?;
            self.headers.insert(name, value);
        }
        Ok(self)
    }

    /// Build the final HeaderMap
    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

impl Default for HttpHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn header_pair(name: &str, value: &str) -> Result<(HeaderName, HeaderValue), LlmError> {
    let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
        LlmError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
    })?;
    let header_value = HeaderValue::from_str(value).map_err(|e| {
        LlmError::ConfigurationError(format!("Invalid header value for '{name}': {e}"))
    })?;
    Ok((header_name, header_value))
}

/// Prefix each name with `X-Numexa-` and render the value as a header string.
pub fn serialize_header_values(extra: &[(String, Value)]) -> Vec<(String, String)> {
    extra
        .iter()
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                Value::Object(_) | Value::Array(_) => value.to_string(),
                Value::Null => String::new(),
                other => other.to_string(),
            };
            (format!("{HEADER_PREFIX}{name}"), rendered)
        })
        .collect()
}

/// Default headers for proxy mode.
pub fn proxy_headers(
    api_key: &str,
    cache_enabled: bool,
    extra: &[(String, Value)],
) -> Result<HeaderMap, LlmError> {
    let package_version = format!("numexa-{}", defaults::VERSION);
    let runtime_version = match env!("CARGO_PKG_RUST_VERSION") {
        "" => "unknown",
        v => v,
    };
    Ok(HttpHeaderBuilder::new()
        .with_json_content_type()
        .with_sensitive_header(&format!("{HEADER_PREFIX}Api-Key"), api_key)?
        .with_header(&format!("{HEADER_PREFIX}package-version"), &package_version)?
        .with_header(&format!("{HEADER_PREFIX}runtime"), "rust")?
        .with_header(&format!("{HEADER_PREFIX}runtime-version"), runtime_version)?
        .with_header(
            &format!("{HEADER_PREFIX}Cache"),
            if cache_enabled { "true" } else { "false" },
        )?
        .with_prefixed_headers(extra)?
        .build())
}

/// Default headers for direct mode.
pub fn direct_headers(provider_key: &str, extra: &[(String, Value)]) -> Result<HeaderMap, LlmError> {
    Ok(HttpHeaderBuilder::new()
        .with_json_content_type()
        .with_bearer_auth(provider_key)?
        .with_prefixed_headers(extra)?
        .build())
}
