//! Document generation for a lead's latest SOW version.
//!
//! ```text
//! get_latest(lead) -> payload -> AnswerIndexes
//!                  -> creator name
//!                  -> TemplateAssembler::assemble -> DocumentBody
//! ```

use scribe_core::{AnswerIndexes, DocumentHeader, TemplateAssembler};
use scribe_types::{DocumentBody, LeadId, RecordId, StyleSheet};
use serde::Serialize;

use crate::error::ApiError;
use crate::state::AppState;

/// A generated document plus the facts needed to render it.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    /// Lead the document was generated for.
    pub lead_id: LeadId,
    /// Version the document was generated from.
    pub version_number: i32,
    /// Record the document was generated from.
    pub record_id: RecordId,
    /// Assembled content.
    pub body: DocumentBody,
    /// Fonts and sizes for the rendering layer.
    pub styles: StyleSheet,
}

/// Assemble the document for a lead's latest version.
///
/// # Errors
///
/// Returns [`ApiError::NotFound`] if the lead has no versions and
/// [`ApiError::Store`] if the store fails.
pub async fn generate_document(
    state: &AppState,
    lead_id: &LeadId,
) -> Result<GeneratedDocument, ApiError> {
    let record = state
        .store
        .get_latest(lead_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no SOW versions for lead {lead_id}")))?;

    let indexes = AnswerIndexes::build(&record.payload);
    let header = DocumentHeader {
        version_number: record.version_number,
        created_by: state.store.creator_name(record.created_by).await,
        created_at: record.created_at,
    };

    let body = TemplateAssembler::new(&state.template, state.rewriter.as_ref())
        .with_concurrency(state.rewrite_concurrency)
        .assemble(&indexes, &header)
        .await;

    tracing::info!(
        lead_id = %lead_id,
        version = record.version_number,
        record_id = %record.id,
        rewriter = state.rewriter.name(),
        "Generated SOW document"
    );

    Ok(GeneratedDocument {
        lead_id: record.lead_id,
        version_number: record.version_number,
        record_id: record.id,
        body,
        styles: state.styles.clone(),
    })
}
