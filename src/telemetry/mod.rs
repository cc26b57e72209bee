//! Request/response mirroring
//!
//! Every successfully sent request can be mirrored to a log-ingestion sink:
//! one record describing the outbound request and one describing the
//! response. Sinks are injected into the executor, and a sink failure never
//! fails the primary call.

pub mod ingest;

pub use ingest::IngestLogSink;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::LlmError;

/// Timestamp format used in mirrored records.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Mirror of an outbound request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub request_time: String,
    pub source_ip: String,
    pub request_method: String,
    pub request_url: String,
    pub request_body: Value,
}

/// Mirror of the response to a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseRecord {
    pub initiated_timestamp: String,
    pub response_timestamp: String,
    pub response_status_code: u16,
    /// `None` for streamed responses, whose body goes to the caller unread.
    pub response_body: Option<Value>,
}

/// Destination for mirrored records.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn record_request(&self, record: &RequestRecord) -> Result<(), LlmError>;

    async fn record_response(&self, record: &ResponseRecord) -> Result<(), LlmError>;
}

/// Format a timestamp the way mirrored records expect.
pub fn format_timestamp(ts: chrono::DateTime<chrono::Local>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Best-effort local address of this host. No packet is sent: connecting a
/// UDP socket only selects the outbound interface.
pub fn source_ip() -> String {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|_| "127.0.0.1".to_string())
}

/// Send both records, logging and swallowing any sink failure.
pub async fn mirror(sink: &dyn TelemetrySink, request: &RequestRecord, response: &ResponseRecord) {
    if let Err(e) = sink.record_request(request).await {
        tracing::warn!(target: "numexa::telemetry", url = %request.request_url, err = %e, "request mirror failed");
    }
    if let Err(e) = sink.record_response(response).await {
        tracing::warn!(target: "numexa::telemetry", url = %request.request_url, err = %e, "response mirror failed");
    }
}
