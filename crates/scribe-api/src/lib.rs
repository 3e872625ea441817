//! HTTP API for the Scribe SOW service.
//!
//! Exposes the versioned SOW store, meeting answer ingestion and document
//! generation over REST. Handlers are thin: validation lives in
//! `scribe-core`, persistence in `scribe-db`.
//!
//! # Architecture
//!
//! ```text
//! POST /api/sow ------> parse_store_trigger --> RecordStore::insert_version
//! POST /api/meetings -> EventParser::parse ---> RecordStore::save_meeting_answers
//! GET  .../document --> RecordStore::get_latest --> AnswerIndexes
//!                                              --> TemplateAssembler (+ Rewriter)
//! ```

pub mod document;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use document::{GeneratedDocument, generate_document};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
