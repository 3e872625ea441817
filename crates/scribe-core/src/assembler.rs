//! Template-driven document assembly.
//!
//! # Output order
//!
//! ```text
//! Title (heading 0)
//! Version / Created By / Created Date
//! Table of Contents
//!   {order}. {section title}
//!       {order} {subsection title}
//! --- page break ---
//! {order} {section title}          (heading 1)
//!   rewritten answers, section scope
//!   {order} {subsection title}     (heading 2)
//!     rewritten answers, subsection scope
//! ```
//!
//! Order depends only on the template's order keys. Answers are rewritten
//! concurrently up to a fixed limit, but results are emitted in template
//! order.

use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::FuturesOrdered;
use scribe_types::{Block, DocumentBody, ParagraphStyle, QuestionRef, TemplateDefinition};

use crate::answer_index::{AnswerIndex, AnswerIndexes};
use crate::rewrite::TextRewriter;

/// Default number of rewrites in flight per document.
pub const DEFAULT_REWRITE_CONCURRENCY: usize = 4;

/// Caption of the table of contents.
pub const TOC_CAPTION: &str = "Table of Contents";

/// Version facts printed in the metadata block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentHeader {
    /// Version number of the record being rendered.
    pub version_number: i32,
    /// Display name of the record's creator.
    pub created_by: String,
    /// When the record was written.
    pub created_at: DateTime<Utc>,
}

/// One slot of the section bodies: either a finished block or an answer
/// still waiting for its rewrite.
enum Slot {
    Ready(Block),
    Answer(String),
}

/// Builds a [`DocumentBody`] from a template, answer indexes and a rewriter.
pub struct TemplateAssembler<'a, R> {
    template: &'a TemplateDefinition,
    rewriter: &'a R,
    concurrency: usize,
}

impl<'a, R: TextRewriter> TemplateAssembler<'a, R> {
    /// Create an assembler for one template and rewriter.
    pub const fn new(template: &'a TemplateDefinition, rewriter: &'a R) -> Self {
        Self {
            template,
            rewriter,
            concurrency: DEFAULT_REWRITE_CONCURRENCY,
        }
    }

    /// Set how many rewrites may run at once. Zero is treated as one.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = if concurrency == 0 { 1 } else { concurrency };
        self
    }

    /// Assemble the full document.
    ///
    /// Never fails: rewrite errors fall back to the original answer and
    /// unanswered questions emit nothing.
    pub async fn assemble(&self, indexes: &AnswerIndexes, header: &DocumentHeader) -> DocumentBody {
        let mut body = DocumentBody::default();
        self.push_metadata(&mut body, header);
        self.push_contents(&mut body);
        body.push(Block::PageBreak);

        let slots = self.section_slots(indexes);
        let answer_count = slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Answer(_)))
            .count();

        // Keep at most `concurrency` rewrites in flight; FuturesOrdered
        // yields in push order, so blocks stay in template order.
        let mut slots = slots.into_iter();
        let mut in_flight = FuturesOrdered::new();
        for slot in slots.by_ref().take(self.concurrency) {
            in_flight.push_back(self.resolve(slot));
        }
        while let Some(block) = in_flight.next().await {
            body.push(block);
            if let Some(slot) = slots.next() {
                in_flight.push_back(self.resolve(slot));
            }
        }

        tracing::info!(
            template = self.template.document_metadata.display_name(),
            version = header.version_number,
            answers = answer_count,
            blocks = body.blocks.len(),
            "assembled document"
        );
        body
    }

    fn push_metadata(&self, body: &mut DocumentBody, header: &DocumentHeader) {
        body.push(Block::heading(
            0,
            self.template.document_metadata.display_name(),
        ));
        body.push(Block::body(format!("Version: {}", header.version_number)));
        body.push(Block::body(format!("Created By: {}", header.created_by)));
        body.push(Block::body(format!(
            "Created Date: {}",
            header.created_at.format("%Y-%m-%d")
        )));
    }

    fn push_contents(&self, body: &mut DocumentBody) {
        body.push(Block::paragraph(ParagraphStyle::TocHeading, TOC_CAPTION));
        for section in self.template.ordered_sections() {
            body.push(Block::paragraph(
                ParagraphStyle::TocEntry,
                format!("{}. {}", section.order, section.display_title()),
            ));
            for subsection in section.ordered_subsections() {
                body.push(Block::paragraph(
                    ParagraphStyle::TocSubEntry,
                    format!("    {} {}", subsection.order, subsection.display_title()),
                ));
            }
        }
    }

    fn section_slots(&self, indexes: &AnswerIndexes) -> Vec<Slot> {
        let mut slots = Vec::new();
        for section in self.template.ordered_sections() {
            slots.push(Slot::Ready(Block::heading(
                1,
                format!("{} {}", section.order, section.display_title()),
            )));
            push_answers(&mut slots, &section.questions, &indexes.section);

            for subsection in section.ordered_subsections() {
                slots.push(Slot::Ready(Block::heading(
                    2,
                    format!("{} {}", subsection.order, subsection.display_title()),
                )));
                push_answers(&mut slots, &subsection.questions, &indexes.subsection);
            }
        }
        slots
    }

    async fn resolve(&self, slot: Slot) -> Block {
        match slot {
            Slot::Ready(block) => block,
            Slot::Answer(original) => match self.rewriter.rewrite(&original).await {
                Ok(text) if !text.trim().is_empty() => Block::body(text.trim()),
                Ok(_) => {
                    tracing::warn!("rewriter returned empty text, using original answer");
                    Block::body(original)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rewrite failed, using original answer");
                    Block::body(original)
                }
            },
        }
    }
}

/// Queue the non-blank answers of each question, in question order.
fn push_answers(slots: &mut Vec<Slot>, questions: &[QuestionRef], index: &AnswerIndex) {
    for question in questions {
        let answers = index.answers(&question.question_id);
        if answers.is_empty() {
            tracing::debug!(question_id = question.question_id.as_str(), "no answers");
        }
        for answer in answers {
            let trimmed = answer.trim();
            if trimmed.is_empty() {
                tracing::debug!(
                    question_id = question.question_id.as_str(),
                    "skipping blank answer"
                );
                continue;
            }
            slots.push(Slot::Answer(trimmed.to_owned()));
        }
    }
}
