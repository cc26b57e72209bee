//! Typed model layer
//!
//! Shared data shapes: routing enums, messages, provider options, the
//! per-call `Config`, and the typed completion/chunk decoding targets.

pub mod common;
pub mod completion;
pub mod config;
pub mod construct;
pub mod message;
pub mod options;

pub use common::{CacheType, ProviderType, RoutingMode};
pub use completion::{
    ChatChoice, ChatChunkChoice, ChatCompletion, ChatCompletionChunk, Delta, GenericResponse,
    TextChoice, TextCompletion, TextCompletionChunk, Usage,
};
pub use config::Config;
pub use construct::Construct;
pub use message::{Message, MessageRole};
pub use options::{OverrideParams, ProviderOptions, RetrySettings};
