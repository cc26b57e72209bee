//! Type Conversions for LlmError
//!
//! `From` implementations and helpers for turning third-party errors into
//! `LlmError`.

use super::types::LlmError;
use validator::{ValidationErrors, ValidationErrorsKind};

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<ValidationErrors> for LlmError {
    fn from(errors: ValidationErrors) -> Self {
        Self::from_validation("request", &errors)
    }
}

impl LlmError {
    /// Convert `validator` output into a `ValidationError` naming every
    /// violated field path (e.g. `llms[1].model`).
    pub fn from_validation(target: impl Into<String>, errors: &ValidationErrors) -> Self {
        let fields = flatten_validation_errors(errors);
        Self::validation(target, fields, errors.to_string())
    }
}

/// Flatten nested `validator` errors into sorted dotted field paths.
///
/// Struct-level (schema) failures are reported under the name of the
/// enclosing field, or `__all__` at the top level.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<String> {
    let mut out = Vec::new();
    collect(errors, "", &mut out);
    out.sort();
    out.dedup();
    out
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(_) => out.push(path),
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{path}[{index}]"), out);
                }
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    match (prefix.is_empty(), field == "__all__") {
        (true, _) => field.to_string(),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}.{field}"),
    }
}
