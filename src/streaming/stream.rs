//! Typed completion streams over SSE `data:` payloads.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::stream::{Fuse, FusedStream};
use futures_util::{Stream, StreamExt};

use super::sse::SseStreamExt;
use crate::defaults::STREAM_DONE_MARKER;
use crate::error::LlmError;
use crate::types::Construct;

type ChunkStream<C> = Pin<Box<dyn Stream<Item = Result<C, LlmError>> + Send>>;

/// Lazy stream of typed chunks.
///
/// Single pass: once it has ended (on `[DONE]`, end of body, or the first
/// error) every further poll yields `None`.
pub struct CompletionStream<C> {
    inner: Fuse<ChunkStream<C>>,
}

impl<C: Construct> CompletionStream<C> {
    /// Parse SSE `data:` payloads of `byte_stream` into `C`.
    ///
    /// Empty payloads are skipped. A transport error ends the stream with
    /// `StreamError`, malformed JSON with `ParseError`, a chunk missing a
    /// required field with `ValidationError`.
    pub fn from_byte_stream<S, B, E>(byte_stream: S, label: impl Into<String>) -> Self
    where
        S: Stream<Item = Result<B, E>> + Send + 'static,
        B: AsRef<[u8]> + Send + 'static,
        E: fmt::Display + Send + 'static,
    {
        let label = label.into();
        let out = async_stream::stream! {
            let mut events = Box::pin(byte_stream.into_sse_stream());

            while let Some(item) = events.next().await {
                let event = match item {
                    Ok(ev) => ev,
                    Err(e) => {
                        yield Err(LlmError::StreamError(format!("SSE stream error ({label}): {e}")));
                        return;
                    }
                };

                let data = event.data.trim();
                if data.is_empty() {
                    continue;
                }
                if data == STREAM_DONE_MARKER {
                    tracing::debug!(target: "numexa::http", %label, "stream finished");
                    return;
                }

                let payload: serde_json::Value = match serde_json::from_str(data) {
                    Ok(v) => v,
                    Err(e) => {
                        yield Err(LlmError::ParseError(format!(
                            "Failed to parse SSE JSON ({label}): {e}"
                        )));
                        return;
                    }
                };

                match C::construct(payload) {
                    Ok(chunk) => yield Ok(chunk),
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }
        };

        Self::from_stream(Box::pin(out))
    }

    /// Stream the body of a live response.
    pub fn from_response(resp: reqwest::Response, label: impl Into<String>) -> Self {
        Self::from_byte_stream(resp.bytes_stream(), label)
    }
}

impl<C> CompletionStream<C> {
    fn from_stream(inner: ChunkStream<C>) -> Self {
        Self {
            inner: inner.fuse(),
        }
    }
}

impl<C> Stream for CompletionStream<C> {
    type Item = Result<C, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

impl<C> FusedStream for CompletionStream<C> {
    fn is_terminated(&self) -> bool {
        self.inner.is_terminated()
    }
}

impl<C> fmt::Debug for CompletionStream<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionStream")
            .field("terminated", &self.inner.is_terminated())
            .finish()
    }
}
