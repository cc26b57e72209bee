//! Error Handling Module
//!
//! - Core error type (`LlmError`, `ErrorCategory`, `LegFailure`)
//! - Conversions from serde and validator errors
//!
//! # Example
//!
//! ```rust,ignore
//! use numexa::error::{ErrorCategory, LlmError};
//!
//! let error = LlmError::ConfigurationError("missing api key".into());
//! assert_eq!(error.category(), ErrorCategory::Configuration);
//! ```

mod conversions;
pub mod types;

pub use conversions::flatten_validation_errors;
pub use types::*;
