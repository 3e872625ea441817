//! Shared application state for the SOW API.
//!
//! Everything here is built once at startup and handed to the router.
//! There are no globals: the store handle, the template and the rewriter
//! all travel through [`AppState`].

use std::sync::Arc;

use scribe_core::{DEFAULT_REWRITE_CONCURRENCY, Rewriter};
use scribe_db::RecordStore;
use scribe_types::{StyleSheet, TemplateDefinition};

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
pub struct AppState {
    /// Versioned record store.
    pub store: RecordStore,
    /// SOW template used for every generated document.
    pub template: Arc<TemplateDefinition>,
    /// Per-answer rewriter.
    pub rewriter: Arc<Rewriter>,
    /// Style sheet returned alongside generated documents.
    pub styles: StyleSheet,
    /// Rewrites in flight per document.
    pub rewrite_concurrency: usize,
}

impl AppState {
    /// Create the application state with default styles and concurrency.
    pub fn new(store: RecordStore, template: TemplateDefinition, rewriter: Rewriter) -> Self {
        Self {
            store,
            template: Arc::new(template),
            rewriter: Arc::new(rewriter),
            styles: StyleSheet::default(),
            rewrite_concurrency: DEFAULT_REWRITE_CONCURRENCY,
        }
    }

    /// Set how many rewrites may run at once per document.
    #[must_use]
    pub const fn with_rewrite_concurrency(mut self, concurrency: usize) -> Self {
        self.rewrite_concurrency = concurrency;
        self
    }
}
