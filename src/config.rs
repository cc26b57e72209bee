//! Client configuration
//!
//! `ClientConfig` is the explicit replacement for ambient process state: it
//! carries the platform key, base URL, proxy switch and dispatch policies,
//! and is handed to every call. [`ClientConfig::from_env`] resolves it from
//! the environment once, at startup.

use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;

use crate::defaults;
use crate::error::LlmError;

/// How a multi-descriptor (direct fan-out) call is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FanOutPolicy {
    /// Dispatch legs in provider order and stop at the first success.
    #[default]
    FirstSuccess,
    /// Dispatch every leg and keep every outcome.
    All,
}

/// What a 4xx/5xx response on one leg does to the remaining legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusErrorPolicy {
    /// Log the failure, record it, and move on to the next leg.
    #[default]
    Continue,
    /// Stop dispatching and return the status error.
    Abort,
}

/// Client-wide settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Platform key sent as `X-Numexa-Api-Key` in proxy mode.
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub proxy_enabled: bool,
    /// Provider key sent as `Authorization` in direct mode.
    pub direct_api_key: Option<SecretString>,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Value of the `X-Numexa-Cache` header in proxy mode.
    pub cache_enabled: bool,
    /// Mirror every request/response to `ingest_url`.
    pub log_mirroring: bool,
    /// Log-ingestion endpoint. There is no built-in default, so mirroring
    /// stays off until one is configured.
    pub ingest_url: Option<String>,
    pub fan_out: FanOutPolicy,
    pub on_status_error: StatusErrorPolicy,
    /// Extra headers, sent with the `X-Numexa-` prefix.
    pub extra_headers: Vec<(String, Value)>,
}

impl ClientConfig {
    /// Proxy-mode config with the given platform key.
    pub fn proxy(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(SecretString::from(api_key.into())),
            base_url: defaults::endpoints::PROXY_URL.to_string(),
            proxy_enabled: true,
            direct_api_key: None,
            timeout: defaults::http::REQUEST_TIMEOUT,
            connect_timeout: defaults::http::CONNECT_TIMEOUT,
            cache_enabled: true,
            log_mirroring: false,
            ingest_url: None,
            fan_out: FanOutPolicy::default(),
            on_status_error: StatusErrorPolicy::default(),
            extra_headers: Vec::new(),
        }
    }

    /// Direct-mode config talking to the provider with `direct_api_key`.
    pub fn direct(direct_api_key: impl Into<String>) -> Self {
        Self {
            base_url: defaults::endpoints::DIRECT_URL.to_string(),
            proxy_enabled: false,
            api_key: None,
            direct_api_key: Some(SecretString::from(direct_api_key.into())),
            ..Self::proxy("")
        }
    }

    /// Resolve from the process environment.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve using an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LlmError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let proxy_enabled = get(defaults::env::PROXY)
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(true);
        let api_key = get(defaults::env::API_KEY);

        let mut config = if proxy_enabled {
            let key = api_key.ok_or_else(|| {
                LlmError::ConfigurationError(format!(
                    "No API key found. Set the {} environment variable or pass an api key explicitly",
                    defaults::env::API_KEY
                ))
            })?;
            Self::proxy(key)
        } else {
            let direct_key = get(defaults::env::DIRECT_API_KEY).ok_or_else(|| {
                LlmError::ConfigurationError(format!(
                    "{} is not 'true', so {} must be set for direct mode",
                    defaults::env::PROXY,
                    defaults::env::DIRECT_API_KEY
                ))
            })?;
            let mut config = Self::direct(direct_key);
            config.api_key = api_key.map(SecretString::from);
            config
        };

        if let Some(url) = get(defaults::env::BASE_URL) {
            config.base_url = url;
        }
        if let Some(url) = get(defaults::env::INGEST_URL) {
            config.ingest_url = Some(url);
            config.log_mirroring = !config.proxy_enabled;
        }
        tracing::debug!(
            target: "numexa::config",
            proxy = config.proxy_enabled,
            base_url = %config.base_url,
            "resolved client config"
        );
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn with_log_mirroring(mut self, enabled: bool) -> Self {
        self.log_mirroring = enabled;
        self
    }

    /// Set the log-ingestion endpoint and turn mirroring on.
    pub fn with_ingest_url(mut self, url: impl Into<String>) -> Self {
        self.ingest_url = Some(url.into());
        self.log_mirroring = true;
        self
    }

    pub fn with_fan_out(mut self, policy: FanOutPolicy) -> Self {
        self.fan_out = policy;
        self
    }

    pub fn with_status_error_policy(mut self, policy: StatusErrorPolicy) -> Self {
        self.on_status_error = policy;
        self
    }

    /// Add a header sent as `X-Numexa-<name>`. Objects and arrays are
    /// JSON-encoded, scalars stringified.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Fail fast on settings that can never produce a valid request.
    pub fn ensure_usable(&self) -> Result<(), LlmError> {
        if self.base_url.trim().is_empty() {
            return Err(LlmError::ConfigurationError(
                "No base url provided. Please provide a valid base url".into(),
            ));
        }
        if !self.proxy_enabled && self.direct_api_key.is_none() {
            return Err(LlmError::ConfigurationError(format!(
                "direct mode requires a provider key ({})",
                defaults::env::DIRECT_API_KEY
            )));
        }
        if self.log_mirroring && self.ingest_url.is_none() {
            return Err(LlmError::ConfigurationError(format!(
                "log mirroring requires an ingest url ({})",
                defaults::env::INGEST_URL
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn proxy_is_default_mode() {
        let config = ClientConfig::from_lookup(lookup(&[("NUMEXA_API_KEY", "nx-1")])).unwrap();
        assert!(config.proxy_enabled);
        assert_eq!(config.base_url, defaults::endpoints::PROXY_URL);
        assert_eq!(config.api_key.unwrap().expose_secret(), "nx-1");
        assert!(!config.log_mirroring);
    }

    #[test]
    fn direct_mode_requires_provider_key() {
        let err = ClientConfig::from_lookup(lookup(&[("NUMEXA_PROXY", "false")])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn direct_mode_uses_direct_url() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("NUMEXA_PROXY", "False "),
            ("OPEN_API_KEY", "sk-abc"),
            ("NUMEXA_API_KEY", "nx-1"),
        ]))
        .unwrap();
        assert!(!config.proxy_enabled);
        assert_eq!(config.base_url, defaults::endpoints::DIRECT_URL);
        assert!(!config.log_mirroring);
        assert!(config.ingest_url.is_none());
        assert_eq!(config.direct_api_key.unwrap().expose_secret(), "sk-abc");
    }

    #[test]
    fn ingest_url_turns_on_mirroring_in_direct_mode() {
        let direct = ClientConfig::from_lookup(lookup(&[
            ("NUMEXA_PROXY", "false"),
            ("OPEN_API_KEY", "sk-abc"),
            ("NUMEXA_INGEST_URL", "http://logs.test/ingest"),
        ]))
        .unwrap();
        assert!(direct.log_mirroring);
        assert_eq!(direct.ingest_url.as_deref(), Some("http://logs.test/ingest"));
        assert!(direct.ensure_usable().is_ok());

        let proxy = ClientConfig::from_lookup(lookup(&[
            ("NUMEXA_API_KEY", "nx-1"),
            ("NUMEXA_INGEST_URL", "http://logs.test/ingest"),
        ]))
        .unwrap();
        assert!(!proxy.log_mirroring);
    }

    #[test]
    fn mirroring_without_ingest_url_is_rejected() {
        let err = ClientConfig::direct("sk-abc")
            .with_log_mirroring(true)
            .ensure_usable()
            .unwrap_err();
        match err {
            LlmError::ConfigurationError(msg) => assert!(msg.contains("NUMEXA_INGEST_URL")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn proxy_mode_without_key_fails() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, LlmError::ConfigurationError(_)));
    }

    #[test]
    fn base_url_override_applies() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("NUMEXA_API_KEY", "nx-1"),
            ("NUMEXA_BASE_URL", "http://localhost:8787"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8787");
    }
}
