//! Error types for event parsing, template loading and answer rewriting.

/// An inbound event was malformed or incomplete. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidEventError {
    /// The event body is not a JSON object.
    #[error("event must be a JSON object")]
    NotAnObject,

    /// A required field is absent.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape or an empty value.
    #[error("invalid field {field}: {reason}")]
    InvalidField {
        /// Field name as it appears on the wire.
        field: &'static str,
        /// What was wrong with it.
        reason: String,
    },

    /// The event did not deserialize into the expected shape.
    #[error("malformed event: {0}")]
    Malformed(String),

    /// Field-level validation failed.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// A SOW template could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The template file could not be read.
    #[error("failed to read template {path}: {source}")]
    Io {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The template is not valid template JSON.
    #[error("failed to parse template: {0}")]
    Parse(#[from] serde_json::Error),

    /// The rewrite prompt template failed to compile.
    #[error("prompt template error: {0}")]
    Prompt(String),
}

/// A single answer rewrite failed. Always absorbed by the assembler.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// The prompt could not be rendered.
    #[error("prompt render failed: {0}")]
    Prompt(String),

    /// The HTTP call failed or returned a non-success status.
    #[error("rewriter backend error: {0}")]
    Backend(String),

    /// The reply did not contain usable text.
    #[error("rewriter response invalid: {0}")]
    Response(String),

    /// The call did not finish within the configured deadline.
    #[error("rewrite timed out after {0} ms")]
    Timeout(u128),
}
