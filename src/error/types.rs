//! Core error types
//!
//! `LlmError` is the single error type returned by every public operation.
//! Its variants follow the failure taxonomy of the request pipeline:
//! configuration and validation failures happen before any network I/O,
//! transport failures are classified per request, and fan-out failures are
//! aggregated so that no leg disappears silently.

use crate::execution::RequestDescriptor;
use thiserror::Error;

/// Coarse error category, useful for presentation and policy decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad configuration or unsupported request shape (never hits the network).
    Configuration,
    /// A typed model failed structural validation.
    Validation,
    /// The transport timed out or could not connect.
    Network,
    /// The upstream answered with a 4xx status.
    Client,
    /// The upstream answered with a 5xx status.
    Server,
    /// The response body could not be decoded.
    Parsing,
    /// Several legs failed; inspect the individual failures.
    Aggregate,
}

/// A single failed leg of a fan-out call.
#[derive(Debug)]
pub struct LegFailure {
    /// Zero-based position of the leg in provider order.
    pub index: usize,
    /// Model identifier targeted by this leg, when known.
    pub model: Option<String>,
    /// The classified error for this leg.
    pub error: LlmError,
}

/// Errors produced by the numexa client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing key, missing mode, empty provider list and similar problems.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The requested path or operation has no known wire shape.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Structural validation failed. `fields` lists every violated field.
    #[error("Validation error for {target}: {message} (fields: {})", fields.join(", "))]
    ValidationError {
        target: String,
        fields: Vec<String>,
        message: String,
    },

    /// The transport timed out while sending or waiting for headers.
    #[error("Request timed out: {} {}", request.method, request.url)]
    TimeoutError { request: Box<RequestDescriptor> },

    /// DNS, connection reset, TLS or any other transport-level failure.
    #[error("Connection error for {}: {message}", request.url)]
    ConnectionError {
        request: Box<RequestDescriptor>,
        message: String,
    },

    /// The upstream answered with a non-2xx status.
    #[error("HTTP status error {status} from {url}: {message}")]
    HttpStatusError {
        status: u16,
        url: String,
        message: String,
        body: Option<serde_json::Value>,
    },

    /// Streaming was selected but no chunk type is available for decoding.
    #[error(
        "The response is an event stream but no chunk type was supplied for decoding ({0})"
    )]
    MissingStreamTypeError(String),

    /// Every leg of a multi-descriptor call failed.
    #[error("All {} fan-out legs failed", failures.len())]
    FanOutFailed { failures: Vec<LegFailure> },

    /// A response body could not be parsed.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The event stream broke mid-flight.
    #[error("Stream error: {0}")]
    StreamError(String),

    /// Serialization of a request body failed.
    #[error("JSON error: {0}")]
    JsonError(String),

    /// The log-mirroring side channel failed. Never returned from a call.
    #[error("Telemetry error: {0}")]
    TelemetryError(String),
}

impl LlmError {
    /// Build a validation error for `target`.
    pub fn validation(
        target: impl Into<String>,
        fields: Vec<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::ValidationError {
            target: target.into(),
            fields,
            message: message.into(),
        }
    }

    /// HTTP status code, when the error came from an upstream response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatusError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether this error is a transport timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutError { .. })
    }

    /// The original request for transport-level failures.
    pub fn request(&self) -> Option<&RequestDescriptor> {
        match self {
            Self::TimeoutError { request } | Self::ConnectionError { request, .. } => {
                Some(&**request)
            }
            _ => None,
        }
    }

    /// Coarse category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError(_)
            | Self::UnsupportedOperation(_)
            | Self::MissingStreamTypeError(_) => ErrorCategory::Configuration,
            Self::ValidationError { .. } => ErrorCategory::Validation,
            Self::TimeoutError { .. }
            | Self::ConnectionError { .. }
            | Self::TelemetryError(_) => ErrorCategory::Network,
            Self::HttpStatusError { status, .. } if *status >= 500 => ErrorCategory::Server,
            Self::HttpStatusError { .. } => ErrorCategory::Client,
            Self::ParseError(_) | Self::StreamError(_) | Self::JsonError(_) => {
                ErrorCategory::Parsing
            }
            Self::FanOutFailed { .. } => ErrorCategory::Aggregate,
        }
    }
}
