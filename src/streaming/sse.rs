//! SSE framing over byte streams

use eventsource_stream::{EventStream, Eventsource};
use futures_util::Stream;

/// Frames any byte stream into server-sent events.
pub trait SseStreamExt: Sized {
    fn into_sse_stream(self) -> EventStream<Self>;
}

impl<S, B, E> SseStreamExt for S
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
{
    fn into_sse_stream(self) -> EventStream<Self> {
        self.eventsource()
    }
}
