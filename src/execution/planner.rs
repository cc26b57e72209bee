//! Request planning
//!
//! Maps `(path, provider options, mode, params)` onto one or more wire-level
//! [`RequestDescriptor`]s. Proxy mode always yields exactly one descriptor
//! wrapping the routing config; direct mode fans out into one descriptor per
//! configured model; `/generate` paths pass their variables through.

use std::fmt;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};

use super::headers::{direct_headers, proxy_headers};
use crate::config::ClientConfig;
use crate::defaults::paths;
use crate::error::LlmError;
use crate::params::{Params, remove_empty_values};
use crate::types::{Config, ProviderOptions, RoutingMode};

/// Which leg of a fan-out a descriptor belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegInfo {
    pub index: usize,
    pub model: Option<String>,
}

/// Body keys whose values never leave the descriptor in logs or mirrors.
const SECRET_BODY_KEYS: [&str; 2] = ["api_key", "virtual_key"];

/// One wire-level request.
#[derive(Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Value,
    pub timeout: Duration,
    /// Whether the caller asked for a streamed answer.
    pub stream: bool,
    pub leg: LegInfo,
}

impl RequestDescriptor {
    /// The body with every `api_key`/`virtual_key` value masked.
    pub fn redacted_body(&self) -> Value {
        redact(&self.body)
    }
}

impl fmt::Debug for RequestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestDescriptor")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.redacted_body())
            .field("timeout", &self.timeout)
            .field("stream", &self.stream)
            .field("leg", &self.leg)
            .finish()
    }
}

fn redact(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if SECRET_BODY_KEYS.contains(&k.as_str()) && !v.is_null() {
                        Value::String("[REDACTED]".to_string())
                    } else {
                        redact(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Logical body handed to the planner.
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// Ordered upstream targets of a completion call.
    Providers(Vec<ProviderOptions>),
    /// `{variables}` mapping of a named-prompt generation.
    Variables(Value),
}

/// Per-call planning inputs.
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    pub path: &'a str,
    pub body: RequestBody,
    pub mode: Option<RoutingMode>,
    pub params: Option<&'a Params>,
    pub stream: bool,
}

/// Decides URL, headers and body shape for each call.
#[derive(Debug, Clone)]
pub struct RequestPlanner {
    base_url: String,
    proxy_enabled: bool,
    api_key: Option<SecretString>,
    direct_api_key: Option<SecretString>,
    cache_enabled: bool,
    extra_headers: Vec<(String, Value)>,
    timeout: Duration,
}

impl RequestPlanner {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            proxy_enabled: config.proxy_enabled,
            api_key: config.api_key.clone(),
            direct_api_key: config.direct_api_key.clone(),
            cache_enabled: config.cache_enabled,
            extra_headers: config.extra_headers.clone(),
            timeout: config.timeout,
        }
    }

    /// Apply the key/base URL overrides carried by a per-call `Config`.
    pub fn with_call_config(mut self, config: &Config) -> Self {
        if let Some(key) = &config.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(url) = &config.base_url {
            self.base_url = url.clone();
        }
        self
    }

    /// Override the timeout for the descriptors of one call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn proxy_enabled(&self) -> bool {
        self.proxy_enabled
    }

    /// Produce the descriptors for one logical call.
    pub fn plan(&self, req: PlanRequest<'_>) -> Result<Vec<RequestDescriptor>, LlmError> {
        let empty = Params::default();
        let params = req.params.unwrap_or(&empty);

        if is_completion_path(req.path) {
            let providers = expect_providers(req.path, req.body)?;
            return if self.proxy_enabled {
                self.plan_proxy(req.path, &providers, req.mode, params, req.stream)
                    .map(|d| vec![d])
            } else {
                self.plan_direct(req.path, &providers, params, req.stream)
            };
        }

        if let Some(base) = req.path.strip_suffix(paths::DIRECT_SUFFIX) {
            if !is_completion_path(base) {
                return Err(LlmError::UnsupportedOperation(format!(
                    "This API path `{}` is not implemented.",
                    req.path
                )));
            }
            let providers = expect_providers(req.path, req.body)?;
            return self.plan_direct(base, &providers, params, req.stream);
        }

        if req.path.ends_with(paths::GENERATE_SUFFIX) {
            let RequestBody::Variables(variables) = req.body else {
                return Err(LlmError::ConfigurationError(format!(
                    "`{}` expects a variables body",
                    req.path
                )));
            };
            return self.plan_generate(req.path, variables).map(|d| vec![d]);
        }

        Err(LlmError::UnsupportedOperation(format!(
            "This API path `{}` is not implemented.",
            req.path
        )))
    }

    fn plan_proxy(
        &self,
        path: &str,
        providers: &[ProviderOptions],
        mode: Option<RoutingMode>,
        params: &Params,
        stream: bool,
    ) -> Result<RequestDescriptor, LlmError> {
        let mode = mode.ok_or_else(|| {
            LlmError::ConfigurationError(
                "The 'mode' parameter is not set. Please provide a valid mode.".into(),
            )
        })?;
        if providers.is_empty() {
            return Err(LlmError::ConfigurationError(
                "The provider options list is empty. Please provide a valid Config.".into(),
            ));
        }
        let options = providers
            .iter()
            .map(ProviderOptions::to_wire)
            .collect::<Result<Vec<_>, _>>()?;
        let params = params.normalized(stream)?;
        let body = json!({
            "config": {"mode": mode, "options": options},
            "params": params,
        });
        let body = remove_empty_values(body).unwrap_or_else(|| json!({}));

        Ok(RequestDescriptor {
            method: Method::POST,
            url: self.url(path),
            headers: self.proxy_headers()?,
            body,
            timeout: self.timeout,
            stream,
            leg: LegInfo {
                index: 0,
                model: None,
            },
        })
    }

    fn plan_direct(
        &self,
        path: &str,
        providers: &[ProviderOptions],
        params: &Params,
        stream: bool,
    ) -> Result<Vec<RequestDescriptor>, LlmError> {
        if providers.is_empty() {
            return Err(LlmError::ConfigurationError(
                "Direct mode needs at least one provider option; nothing would be sent.".into(),
            ));
        }

        let mut shared = params.normalized(stream)?;
        if !stream {
            shared.remove("stream");
        }
        let messages = shared
            .remove("messages")
            .unwrap_or_else(|| json!([{}]));
        let url = self.url(path);

        providers
            .iter()
            .enumerate()
            .map(|(index, llm)| {
                let model = llm.model_id().ok_or_else(|| {
                    LlmError::ConfigurationError(format!(
                        "provider option {index} ({}) has no model",
                        llm.provider
                    ))
                })?;

                let mut body = shared.clone();
                body.extend(leg_overrides(llm)?);
                body.insert("model".into(), Value::String(model.to_string()));
                body.insert("messages".into(), messages.clone());

                Ok::<_, LlmError>(RequestDescriptor {
                    method: Method::POST,
                    url: url.clone(),
                    headers: self.direct_headers(llm.api_key.as_ref())?,
                    body: Value::Object(body),
                    timeout: self.timeout,
                    stream,
                    leg: LegInfo {
                        index,
                        model: Some(model.to_string()),
                    },
                })
            })
            .collect()
    }

    fn plan_generate(&self, path: &str, variables: Value) -> Result<RequestDescriptor, LlmError> {
        let headers = if self.proxy_enabled {
            self.proxy_headers()?
        } else {
            self.direct_headers(None)?
        };
        Ok(RequestDescriptor {
            method: Method::POST,
            url: self.url(path),
            headers,
            body: remove_empty_values(variables).unwrap_or_else(|| json!({})),
            timeout: self.timeout,
            stream: false,
            leg: LegInfo {
                index: 0,
                model: None,
            },
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn proxy_headers(&self) -> Result<HeaderMap, LlmError> {
        let key = self.api_key.as_ref().ok_or_else(|| {
            LlmError::ConfigurationError("No API key found for the numexa proxy".into())
        })?;
        proxy_headers(key.expose_secret(), self.cache_enabled, &self.extra_headers)
    }

    fn direct_headers(&self, leg_key: Option<&SecretString>) -> Result<HeaderMap, LlmError> {
        let key = leg_key.or(self.direct_api_key.as_ref()).ok_or_else(|| {
            LlmError::ConfigurationError("Direct mode requires a provider API key".into())
        })?;
        direct_headers(key.expose_secret(), &self.extra_headers)
    }
}

fn is_completion_path(path: &str) -> bool {
    path == paths::COMPLETION || path == paths::CHAT_COMPLETION
}

fn expect_providers(path: &str, body: RequestBody) -> Result<Vec<ProviderOptions>, LlmError> {
    match body {
        RequestBody::Providers(providers) => Ok(providers),
        RequestBody::Variables(_) => Err(LlmError::ConfigurationError(format!(
            "`{path}` expects a list of provider options"
        ))),
    }
}

/// Normalized per-leg overrides, without the model (set separately).
fn leg_overrides(llm: &ProviderOptions) -> Result<Map<String, Value>, LlmError> {
    let Some(overrides) = &llm.override_params else {
        return Ok(Map::new());
    };
    let mut map = match remove_empty_values(serde_json::to_value(overrides)?) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.remove("model");
    Ok(map)
}
