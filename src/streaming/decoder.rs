//! Response decoding
//!
//! Turns a 2xx [`RawResponse`] into a typed [`Completion`]: a buffered body is
//! constructed and validated at once, an event-stream body becomes a lazy
//! [`CompletionStream`].

use std::marker::PhantomData;

use super::stream::CompletionStream;
use crate::error::LlmError;
use crate::execution::executor::{RawResponse, ResponseBody, classify_transport_error};
use crate::types::Construct;

/// A decoded response: one full completion or a stream of chunks.
#[derive(Debug)]
pub enum Completion<F, C> {
    Full(F),
    Stream(CompletionStream<C>),
}

impl<F, C> Completion<F, C> {
    pub fn is_stream(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// The full completion, or an error if the response was streamed.
    pub fn into_full(self) -> Result<F, LlmError> {
        match self {
            Self::Full(full) => Ok(full),
            Self::Stream(_) => Err(LlmError::UnsupportedOperation(
                "response is an event stream; use into_stream()".to_string(),
            )),
        }
    }

    /// The chunk stream, or an error if the response was buffered.
    pub fn into_stream(self) -> Result<CompletionStream<C>, LlmError> {
        match self {
            Self::Stream(stream) => Ok(stream),
            Self::Full(_) => Err(LlmError::UnsupportedOperation(
                "response is not an event stream; use into_full()".to_string(),
            )),
        }
    }
}

/// Decodes raw responses into `F` (full body) or `C` (stream chunks).
#[derive(Debug, Clone)]
pub struct ResponseDecoder<F, C> {
    label: String,
    chunks: bool,
    _marker: PhantomData<fn() -> (F, C)>,
}

impl<F: Construct, C: Construct> ResponseDecoder<F, C> {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            chunks: true,
            _marker: PhantomData,
        }
    }

    /// A decoder that cannot decode event streams.
    pub fn without_chunks(label: impl Into<String>) -> Self {
        Self {
            chunks: false,
            ..Self::new(label)
        }
    }

    /// Decode `raw`.
    ///
    /// The response is treated as a stream when `stream_requested` is set or
    /// the server declares `text/event-stream`, whichever applies.
    pub async fn decode(
        &self,
        raw: RawResponse,
        stream_requested: bool,
    ) -> Result<Completion<F, C>, LlmError> {
        let streaming = stream_requested || raw.is_event_stream();

        if streaming {
            if !self.chunks {
                return Err(LlmError::MissingStreamTypeError(self.label.clone()));
            }
            let stream = match raw.body {
                ResponseBody::Streaming(resp) => CompletionStream::from_response(resp, self.label.clone()),
                ResponseBody::Buffered(bytes) => {
                    let once = futures_util::stream::once(async move { Ok::<_, LlmError>(bytes) });
                    CompletionStream::from_byte_stream(once, self.label.clone())
                }
            };
            return Ok(Completion::Stream(stream));
        }

        let bytes = match raw.body {
            ResponseBody::Buffered(bytes) => bytes,
            ResponseBody::Streaming(resp) => resp
                .bytes()
                .await
                .map_err(|e| classify_transport_error(e, raw.request))?,
        };
        let value: serde_json::Value = serde_json::from_slice(&bytes).map_err(|e| {
            LlmError::ParseError(format!("Failed to parse {} response: {e}", self.label))
        })?;
        Ok(Completion::Full(F::construct(value)?))
    }
}
