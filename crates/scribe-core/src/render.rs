//! Markdown rendering of an assembled document.

use scribe_types::{Block, DocumentBody, ParagraphStyle};

/// Render a document body as Markdown.
///
/// Heading level `n` maps to `n + 1` hashes, so the title is `#` and
/// sections are `##`. Page breaks become horizontal rules.
pub fn render_markdown(body: &DocumentBody) -> String {
    let mut out = String::new();
    for block in &body.blocks {
        match block {
            Block::Heading { level, text } => {
                let depth = usize::from(*level).saturating_add(1).min(6);
                out.push_str(&"#".repeat(depth));
                out.push(' ');
                out.push_str(text);
                out.push_str("\n\n");
            }
            Block::Paragraph { style, text } => match style {
                ParagraphStyle::Body => {
                    out.push_str(text);
                    out.push_str("\n\n");
                }
                ParagraphStyle::TocHeading => {
                    out.push_str("**");
                    out.push_str(text);
                    out.push_str("**\n\n");
                }
                ParagraphStyle::TocEntry => {
                    out.push_str("- ");
                    out.push_str(text);
                    out.push('\n');
                }
                ParagraphStyle::TocSubEntry => {
                    out.push_str("    - *");
                    out.push_str(text.trim());
                    out.push_str("*\n");
                }
            },
            Block::PageBreak => out.push_str("\n---\n\n"),
        }
    }
    out
}
