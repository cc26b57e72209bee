//! Default Configuration Values
//!
//! Centralizes the constants used throughout the client.

use std::time::Duration;

/// SDK version reported to the proxy.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of every numexa-specific header.
pub const HEADER_PREFIX: &str = "X-Numexa-";

/// Endpoint defaults
pub mod endpoints {
    /// Proxy base URL used when proxy mode is on.
    pub const PROXY_URL: &str = "https://app.numexa.io/proxy/v1/openai";

    /// Provider base URL used in direct mode.
    pub const DIRECT_URL: &str = "https://api.openai.com/v1";
}

/// Environment variable names
pub mod env {
    /// Platform API key.
    pub const API_KEY: &str = "NUMEXA_API_KEY";

    /// `"true"` (default) routes through the proxy; anything else goes direct.
    pub const PROXY: &str = "NUMEXA_PROXY";

    /// Provider key used in direct mode.
    pub const DIRECT_API_KEY: &str = "OPEN_API_KEY";

    /// Optional base URL override.
    pub const BASE_URL: &str = "NUMEXA_BASE_URL";

    /// Log-ingestion endpoint; setting it turns mirroring on in direct mode.
    pub const INGEST_URL: &str = "NUMEXA_INGEST_URL";
}

/// HTTP defaults
pub mod http {
    use super::*;

    /// Default request timeout, applied client-wide unless overridden per call.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default connection timeout.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Content type that selects the streaming decode path.
    pub const EVENT_STREAM: &str = "text/event-stream";
}

/// API paths understood by the request planner
pub mod paths {
    /// Text completion.
    pub const COMPLETION: &str = "/v1/complete";

    /// Chat completion.
    pub const CHAT_COMPLETION: &str = "/chat/completions";

    /// Chat completion forced into direct mode.
    pub const CHAT_COMPLETION_DIRECT: &str = "/chat/completions/direct";

    /// Suffix marking direct mode.
    pub const DIRECT_SUFFIX: &str = "/direct";

    /// Suffix of named-prompt generation paths.
    pub const GENERATE_SUFFIX: &str = "/generate";

    /// Build the generation path for a named prompt.
    pub fn generate(prompt_id: &str) -> String {
        format!("/v1/prompts/{}/generate", urlencoding::encode(prompt_id))
    }
}

/// SSE payload marking the end of a stream.
pub const STREAM_DONE_MARKER: &str = "[DONE]";
