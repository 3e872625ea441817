//! Assembled document body handed to the rendering layer.
//!
//! The body is a flat, ordered list of [`Block`]s. It carries content and
//! ordering only; fonts and sizes live in the [`StyleSheet`] and are applied
//! by whatever produces the final file.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Paragraph styles the assembler emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ParagraphStyle {
    /// Ordinary body text.
    Body,
    /// The "Table of Contents" caption.
    TocHeading,
    /// One table-of-contents line for a section.
    TocEntry,
    /// One indented table-of-contents line for a subsection.
    TocSubEntry,
}

/// One unit of document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Block {
    /// A heading. Level 0 is the document title, 1 a section, 2 a subsection.
    Heading {
        /// Heading depth.
        level: u8,
        /// Heading text.
        text: String,
    },
    /// A styled paragraph.
    Paragraph {
        /// Paragraph style.
        style: ParagraphStyle,
        /// Paragraph text.
        text: String,
    },
    /// Hard page break.
    PageBreak,
}

impl Block {
    /// Shorthand for a heading block.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        Self::Heading {
            level,
            text: text.into(),
        }
    }

    /// Shorthand for a paragraph block.
    pub fn paragraph(style: ParagraphStyle, text: impl Into<String>) -> Self {
        Self::Paragraph {
            style,
            text: text.into(),
        }
    }

    /// Shorthand for a body paragraph.
    pub fn body(text: impl Into<String>) -> Self {
        Self::paragraph(ParagraphStyle::Body, text)
    }
}

/// An ordered document body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DocumentBody {
    /// Blocks in output order.
    pub blocks: Vec<Block>,
}

impl DocumentBody {
    /// Append a block.
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Texts of all body paragraphs, in order.
    pub fn body_paragraphs(&self) -> Vec<&str> {
        self.blocks
            .iter()
            .filter_map(|block| match block {
                Block::Paragraph {
                    style: ParagraphStyle::Body,
                    text,
                } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Body paragraphs that appear under the heading with the given text,
    /// up to the next heading of the same or a shallower level.
    pub fn paragraphs_under(&self, heading: &str) -> Vec<&str> {
        let mut out = Vec::new();
        let mut active: Option<u8> = None;
        for block in &self.blocks {
            match block {
                Block::Heading { level, text } => {
                    if let Some(open) = active
                        && *level <= open
                    {
                        active = None;
                    }
                    if text == heading {
                        active = Some(*level);
                    }
                }
                Block::Paragraph {
                    style: ParagraphStyle::Body,
                    text,
                } if active.is_some() => out.push(text.as_str()),
                _ => {}
            }
        }
        out
    }
}

/// Font settings for one style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TextStyle {
    /// Font family.
    pub font: String,
    /// Size in points.
    pub size_pt: u8,
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
}

impl TextStyle {
    fn times(size_pt: u8) -> Self {
        Self {
            font: String::from("Times New Roman"),
            size_pt,
            bold: false,
            italic: false,
        }
    }
}

/// Document-wide style settings for the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StyleSheet {
    /// Body paragraphs.
    pub body: TextStyle,
    /// Level-1 headings.
    pub heading_1: TextStyle,
    /// "Table of Contents" caption.
    pub toc_heading: TextStyle,
    /// Section lines of the table of contents.
    pub toc_entry: TextStyle,
    /// Subsection lines of the table of contents.
    pub toc_sub_entry: TextStyle,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            body: TextStyle::times(12),
            heading_1: TextStyle::times(16),
            toc_heading: TextStyle {
                bold: true,
                ..TextStyle::times(14)
            },
            toc_entry: TextStyle::times(12),
            toc_sub_entry: TextStyle {
                italic: true,
                ..TextStyle::times(11)
            },
        }
    }
}
