//! Error types for the docpress library.
//!
//! The taxonomy mirrors the stages of a conversion:
//!
//! * [`DocPressError::Validation`] — bad page-layout options, checked before
//!   any conversion work begins. Carries a structured list of per-field
//!   messages rather than one flattened string so callers (CLI, HTTP API)
//!   can report every problem at once.
//! * [`DocPressError::JsonParse`] — malformed JSON handed to the JSON
//!   converter; local to that converter.
//! * [`DocPressError::UnsupportedType`] — a declared type name that is not
//!   one of the four known formats (or `auto`). Surfaced immediately, no
//!   conversion is attempted.
//! * [`DocPressError::Render`] — the external browser engine failed to
//!   navigate or print.
//! * [`DocPressError::Conversion`] — the catch-all wrapper the orchestrator
//!   surfaces to callers; always carries the originating message.
//!
//! Nothing is retried automatically. Batch processing stores per-item
//! failures as plain messages inside [`crate::convert::BatchOutcome`] instead
//! of aborting the run, so one bad document never loses the rest.

use std::path::PathBuf;
use thiserror::Error;

/// A single failed check on the page-layout options.
///
/// Collected into [`DocPressError::Validation`] so that every invalid field
/// is reported in one pass.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Option field that failed, e.g. `page_format` or `margins.top`.
    pub field: String,
    /// Human-readable description of what is wrong.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// All errors returned by the docpress library.
#[derive(Debug, Error)]
pub enum DocPressError {
    /// The JSON converter was given input that is not syntactically valid JSON.
    #[error("Invalid JSON input: {detail}")]
    JsonParse { detail: String },

    /// The declared content type is not one of text, html, json, markdown, auto.
    #[error("Unsupported content type '{declared}' (expected text, html, json, markdown, or auto)")]
    UnsupportedType { declared: String },

    /// One or more page-layout options failed validation.
    #[error("Invalid page layout:\n{}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// The browser engine failed to navigate or print.
    #[error("PDF generation failed: {detail}")]
    Render { detail: String },

    /// Catch-all wrapper surfaced by the orchestrator; carries the
    /// originating message.
    #[error("Conversion failed: {detail}")]
    Conversion { detail: String },

    /// Filesystem failure while reading input or writing output.
    #[error("Failed to {action} '{path}': {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocPressError {
    /// Wrap an error into the orchestrator's catch-all, preserving the
    /// originating message.
    ///
    /// Validation and unsupported-type errors pass through unchanged: they
    /// are raised before conversion starts and callers match on them
    /// directly (the HTTP layer maps them to client errors).
    pub(crate) fn into_conversion_failure(self) -> Self {
        match self {
            e @ (DocPressError::Validation(_)
            | DocPressError::UnsupportedType { .. }
            | DocPressError::Conversion { .. }) => e,
            other => DocPressError::Conversion {
                detail: other.to_string(),
            },
        }
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_lists_every_field() {
        let e = DocPressError::Validation(vec![
            FieldError::new("page_format", "unknown page format 'B5'"),
            FieldError::new("margins.top", "invalid length '1parsec'"),
        ]);
        let msg = e.to_string();
        assert!(msg.contains("page_format"), "got: {msg}");
        assert!(msg.contains("margins.top"), "got: {msg}");
        assert!(msg.contains("B5"), "got: {msg}");
    }

    #[test]
    fn render_error_carries_context_prefix() {
        let e = DocPressError::Render {
            detail: "navigation aborted".into(),
        };
        assert!(e.to_string().starts_with("PDF generation failed:"));
    }

    #[test]
    fn conversion_wrap_preserves_original_message() {
        let inner = DocPressError::JsonParse {
            detail: "expected value at line 1 column 2".into(),
        };
        let wrapped = inner.into_conversion_failure();
        assert!(wrapped.to_string().contains("line 1 column 2"));
    }

    #[test]
    fn conversion_wrap_is_idempotent() {
        let e = DocPressError::Conversion {
            detail: "boom".into(),
        };
        let again = e.into_conversion_failure();
        assert_eq!(again.to_string(), "Conversion failed: boom");
    }

    #[test]
    fn validation_passes_through_unwrapped() {
        let e = DocPressError::Validation(vec![FieldError::new("page_format", "bad")]);
        assert!(matches!(
            e.into_conversion_failure(),
            DocPressError::Validation(_)
        ));
    }
}
