//! Response decoding
//!
//! Turns a raw HTTP response into either one typed completion or a lazy,
//! fused stream of typed chunks parsed from server-sent events.

mod decoder;
mod sse;
mod stream;

pub use decoder::{Completion, ResponseDecoder};
pub use sse::SseStreamExt;
pub use stream::CompletionStream;
