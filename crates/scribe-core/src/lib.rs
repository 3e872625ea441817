//! SOW processing pipeline: event parsing, answer indexing and document
//! assembly.
//!
//! # Pipeline
//!
//! ```text
//! raw meeting event --EventParser--> ParsedAnswers
//! raw SOW event ----parse_store_trigger--> NewVersion --> store
//! stored payload ---AnswerIndexes::build--> section / subsection indexes
//!                                               |
//! template + indexes + rewriter --TemplateAssembler--> DocumentBody
//!                                               |
//!                                     render_markdown (optional)
//! ```
//!
//! # Modules
//!
//! - [`event`] -- Inbound event normalization and validation
//! - [`answer_index`] -- Question-id lookups over a stored payload
//! - [`assembler`] -- Template walk and document body construction
//! - [`rewrite`] -- Per-answer rewriting backends
//! - [`render`] -- Markdown output
//! - [`template`] -- Template file loading
//! - [`error`] -- Error types

pub mod answer_index;
pub mod assembler;
pub mod error;
pub mod event;
pub mod render;
pub mod rewrite;
pub mod template;

pub use answer_index::{AnswerIndex, AnswerIndexes};
pub use assembler::{DEFAULT_REWRITE_CONCURRENCY, DocumentHeader, TOC_CAPTION, TemplateAssembler};
pub use error::{InvalidEventError, RewriteError, TemplateError};
pub use event::{EventParser, StoreTrigger, parse_store_trigger};
pub use render::render_markdown;
pub use rewrite::{
    AnthropicConfig, AnthropicRewriter, DEFAULT_REWRITE_TIMEOUT, RewritePrompt, Rewriter,
    TextRewriter,
};
pub use template::{load_template, parse_template};
