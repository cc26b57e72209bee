//! Transport execution
//!
//! Sends one [`RequestDescriptor`], classifies the outcome and optionally
//! mirrors the exchange to a [`TelemetrySink`]. No retries, no backoff.

use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Local};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use serde_json::Value;
use tokio::time::{Instant, timeout_at};
use uuid::Uuid;

use super::planner::RequestDescriptor;
use crate::defaults;
use crate::error::LlmError;
use crate::telemetry::{self, RequestRecord, ResponseRecord, TelemetrySink};

/// Response body as handed to the decoder.
pub enum ResponseBody {
    /// Fully read JSON (or error) body.
    Buffered(Bytes),
    /// Live event stream, not yet read.
    Streaming(reqwest::Response),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buffered(bytes) => f.debug_tuple("Buffered").field(&bytes.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// A successful (2xx) response to one descriptor.
#[derive(Debug)]
pub struct RawResponse {
    pub request: RequestDescriptor,
    pub status: u16,
    pub headers: HeaderMap,
    pub body: ResponseBody,
    pub initiated_at: DateTime<Local>,
    pub received_at: DateTime<Local>,
}

impl RawResponse {
    /// Declared `Content-Type`, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE)?.to_str().ok()
    }

    /// Whether the response declares `text/event-stream`.
    pub fn is_event_stream(&self) -> bool {
        is_event_stream(&self.headers)
    }
}

/// Whether `headers` declare an event-stream body.
pub fn is_event_stream(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(defaults::http::EVENT_STREAM))
}

/// Sends descriptors over one shared `reqwest::Client`.
#[derive(Clone)]
pub struct TransportExecutor {
    http_client: reqwest::Client,
    sink: Option<Arc<dyn TelemetrySink>>,
}

impl TransportExecutor {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            sink: None,
        }
    }

    /// Mirror every exchange to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Send one descriptor.
    ///
    /// The descriptor timeout bounds sending plus reading a buffered body.
    /// An event-stream body is not bounded: it ends when the server closes
    /// it. Timeouts become `TimeoutError`, other transport failures
    /// `ConnectionError`; both carry the descriptor. A 4xx/5xx response is
    /// drained and returned as `HttpStatusError`.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<RawResponse, LlmError> {
        let initiated_at = Local::now();
        let request_id = Uuid::new_v4();
        tracing::debug!(
            target: "numexa::http",
            %request_id,
            url = %descriptor.url,
            leg = descriptor.leg.index,
            model = ?descriptor.leg.model,
            stream = descriptor.stream,
            "sending request"
        );

        let deadline = Instant::now() + descriptor.timeout;
        let send = self
            .http_client
            .request(descriptor.method.clone(), &descriptor.url)
            .headers(descriptor.headers.clone())
            .json(&descriptor.body)
            .send();
        let resp = match timeout_at(deadline, send).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => return Err(classify_transport_error(e, descriptor)),
            Err(_) => return Err(timed_out(descriptor)),
        };
        let received_at = Local::now();
        let status = resp.status();
        let headers = resp.headers().clone();
        tracing::debug!(target: "numexa::http", %request_id, status = status.as_u16(), "response received");

        if !status.is_success() {
            let text = match timeout_at(deadline, resp.text()).await {
                Ok(Ok(text)) => text,
                _ => String::new(),
            };
            let error = status_error(status, &descriptor.url, &text);
            tracing::warn!(
                target: "numexa::http",
                url = %descriptor.url,
                status = status.as_u16(),
                body = %text,
                "upstream returned an error status"
            );
            self.mirror(&descriptor, initiated_at, received_at, status, Some(parse_body(text.as_bytes())))
                .await;
            return Err(error);
        }

        let body = if descriptor.stream || is_event_stream(&headers) {
            ResponseBody::Streaming(resp)
        } else {
            match timeout_at(deadline, resp.bytes()).await {
                Ok(Ok(bytes)) => ResponseBody::Buffered(bytes),
                Ok(Err(e)) => return Err(classify_transport_error(e, descriptor)),
                Err(_) => return Err(timed_out(descriptor)),
            }
        };

        let mirrored_body = match &body {
            ResponseBody::Buffered(bytes) => Some(parse_body(bytes)),
            ResponseBody::Streaming(_) => None,
        };
        self.mirror(&descriptor, initiated_at, received_at, status, mirrored_body)
            .await;

        Ok(RawResponse {
            request: descriptor,
            status: status.as_u16(),
            headers,
            body,
            initiated_at,
            received_at,
        })
    }

    async fn mirror(
        &self,
        descriptor: &RequestDescriptor,
        initiated_at: DateTime<Local>,
        received_at: DateTime<Local>,
        status: StatusCode,
        response_body: Option<Value>,
    ) {
        let Some(sink) = &self.sink else {
            return;
        };
        let request = RequestRecord {
            request_time: telemetry::format_timestamp(initiated_at),
            source_ip: telemetry::source_ip(),
            request_method: descriptor.method.to_string(),
            request_url: descriptor.url.clone(),
            request_body: descriptor.redacted_body(),
        };
        let response = ResponseRecord {
            initiated_timestamp: telemetry::format_timestamp(initiated_at),
            response_timestamp: telemetry::format_timestamp(received_at),
            response_status_code: status.as_u16(),
            response_body,
        };
        telemetry::mirror(sink.as_ref(), &request, &response).await;
    }
}

fn timed_out(descriptor: RequestDescriptor) -> LlmError {
    tracing::warn!(target: "numexa::http", url = %descriptor.url, timeout = ?descriptor.timeout, "request timed out");
    LlmError::TimeoutError {
        request: Box::new(descriptor),
    }
}

pub(crate) fn classify_transport_error(err: reqwest::Error, descriptor: RequestDescriptor) -> LlmError {
    if err.is_timeout() {
        timed_out(descriptor)
    } else {
        tracing::warn!(target: "numexa::http", url = %descriptor.url, err = %err, "connection failure");
        LlmError::ConnectionError {
            message: err.to_string(),
            request: Box::new(descriptor),
        }
    }
}

/// JSON when possible, otherwise the raw text as a JSON string.
fn parse_body(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// Build an `HttpStatusError`, preferring `error.message` from a JSON body.
pub fn status_error(status: StatusCode, url: &str, text: &str) -> LlmError {
    let text = text.trim();
    let body: Option<Value> = serde_json::from_str(text).ok();
    let message = body
        .as_ref()
        .and_then(|b| b.get("error")?.get("message")?.as_str())
        .map(|m| format!("Error code: {} - {m}", status.as_u16()))
        .unwrap_or_else(|| {
            if text.is_empty() {
                format!("Error code: {}", status.as_u16())
            } else {
                text.to_string()
            }
        });
    LlmError::HttpStatusError {
        status: status.as_u16(),
        url: url.to_string(),
        message,
        body,
    }
}
