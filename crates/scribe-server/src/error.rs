//! Error types for the Scribe binary.
//!
//! [`ScribeError`] wraps every failure mode of startup and serving so that
//! `main` can propagate with `?`.

/// Top-level error for the Scribe binary.
#[derive(Debug, thiserror::Error)]
pub enum ScribeError {
    /// An environment variable was missing or unparseable.
    #[error("config error: {0}")]
    Config(String),

    /// The SOW template or rewrite prompt could not be loaded.
    #[error("template error: {source}")]
    Template {
        /// The underlying template error.
        #[from]
        source: scribe_core::TemplateError,
    },

    /// Connecting to or migrating the database failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: scribe_db::StoreError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: scribe_api::ServerError,
    },
}
