//! Shared type definitions for the Scribe SOW service.
//!
//! This crate is the single source of truth for all types crossing crate
//! boundaries. API-facing types flow downstream to `TypeScript` via `ts-rs`.
//!
//! # Modules
//!
//! - [`ids`] -- Identifier newtypes that accept string or numeric wire forms
//! - [`record`] -- Versioned SOW records and their write inputs
//! - [`answers`] -- Normalized meeting question/answer records
//! - [`template`] -- SOW template definition and ordering keys
//! - [`document`] -- Assembled document body and style sheet

pub mod answers;
pub mod document;
pub mod ids;
pub mod record;
pub mod template;

// Re-export all public types at crate root for convenience.
pub use answers::{AnswerRecord, ParsedAnswers};
pub use document::{Block, DocumentBody, ParagraphStyle, StyleSheet, TextStyle};
pub use ids::{EmployeeId, InvalidId, LeadId, MeetingId, OrganizationId, RecordId};
pub use record::{NewVersion, SowMetadata, StoreReceipt, VersionedRecord};
pub use template::{
    DocumentMetadata, OrderKey, QuestionRef, SectionTemplate, SubsectionTemplate,
    TemplateDefinition, DEFAULT_TEMPLATE_NAME,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for API-facing types.

    #[test]
    fn export_bindings() {
        // Files are written to `bindings/` relative to the crate root.
        use ts_rs::TS;

        let _ = crate::record::SowMetadata::export_all();
        let _ = crate::record::VersionedRecord::export_all();
        let _ = crate::record::StoreReceipt::export_all();
        let _ = crate::answers::AnswerRecord::export_all();
        let _ = crate::answers::ParsedAnswers::export_all();
        let _ = crate::document::ParagraphStyle::export_all();
        let _ = crate::document::Block::export_all();
        let _ = crate::document::DocumentBody::export_all();
        let _ = crate::document::TextStyle::export_all();
        let _ = crate::document::StyleSheet::export_all();
    }
}
