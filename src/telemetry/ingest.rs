//! HTTP ingestion sink

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use super::{RequestRecord, ResponseRecord, TelemetrySink};
use crate::defaults::HEADER_PREFIX;
use crate::error::LlmError;
use crate::execution::headers::HttpHeaderBuilder;

/// Posts mirrored records to the numexa log-ingestion endpoint, tagged with
/// `X-Numexa-Log-Type` and the platform key.
#[derive(Debug, Clone)]
pub struct IngestLogSink {
    http_client: reqwest::Client,
    url: String,
    api_key: Option<SecretString>,
}

impl IngestLogSink {
    pub fn new(http_client: reqwest::Client, url: impl Into<String>, api_key: Option<SecretString>) -> Self {
        Self {
            http_client,
            url: url.into(),
            api_key,
        }
    }

    fn headers(&self, log_type: &str) -> Result<HeaderMap, LlmError> {
        let mut builder = HttpHeaderBuilder::new()
            .with_json_content_type()
            .with_header(&format!("{HEADER_PREFIX}Log-Type"), log_type)?;
        if let Some(key) = &self.api_key {
            builder =
                builder.with_sensitive_header(&format!("{HEADER_PREFIX}Api-Key"), key.expose_secret())?;
        }
        Ok(builder.build())
    }

    async fn post<T: Serialize + Sync>(&self, log_type: &str, record: &T) -> Result<(), LlmError> {
        let resp = self
            .http_client
            .post(&self.url)
            .headers(self.headers(log_type)?)
            .json(record)
            .send()
            .await
            .map_err(|e| LlmError::TelemetryError(format!("log ingestion failed: {e}")))?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::TelemetryError(format!(
                "log ingestion rejected with {status}: {body}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetrySink for IngestLogSink {
    async fn record_request(&self, record: &RequestRecord) -> Result<(), LlmError> {
        self.post("request", record).await
    }

    async fn record_response(&self, record: &ResponseRecord) -> Result<(), LlmError> {
        self.post("response", record).await
    }
}
