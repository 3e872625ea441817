//! SOW template definition.
//!
//! A template is a static JSON document describing the shape of the final
//! document:
//!
//! ```json
//! {
//!   "documentMetadata": { "templateName": "Statement of Work" },
//!   "sections": [{
//!     "sectionOrder": 1,
//!     "sectionTitle": "Overview",
//!     "questions": [{ "questionId": "Q1" }],
//!     "subsections": [{
//!       "subsectionOrder": "1.1",
//!       "subsectionTitle": "Goals",
//!       "questions": [{ "questionId": "Q1" }]
//!     }]
//!   }]
//! }
//! ```
//!
//! Order values are kept verbatim for display and compared segment-wise for
//! sorting, so `"1.10"` sorts after `"1.9"` and `2` after `1`.
//!
//! Dotted orders must be sent as strings. A JSON number such as `1.10` is
//! read as a float and loses its literal form: it displays as `1.1` and
//! sorts equal to `1.1`. Integer orders are exact either way.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Default title used when a template carries no `templateName`.
pub const DEFAULT_TEMPLATE_NAME: &str = "SOW Document";

/// Raw wire representation of an order value.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum OrderRepr {
    /// Order sent as a string, e.g. `"1.2"`.
    Text(String),
    /// Order sent as an integer.
    Integer(i64),
    /// Order sent as a decimal number. Trailing zeros are lost (`1.10`
    /// becomes `1.1`), so dotted orders belong in strings.
    Float(f64),
}

/// Ordering key of a section or subsection, e.g. `1` or `"2.3"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "OrderRepr", into = "String")]
pub struct OrderKey(String);

impl OrderKey {
    /// Wrap a literal order value.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_owned())
    }

    /// The literal value as it appeared in the template.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<OrderRepr> for OrderKey {
    fn from(repr: OrderRepr) -> Self {
        match repr {
            OrderRepr::Text(s) => Self::new(s),
            OrderRepr::Integer(n) => Self(n.to_string()),
            OrderRepr::Float(f) => Self(f.to_string()),
        }
    }
}

impl From<OrderKey> for String {
    fn from(key: OrderKey) -> Self {
        key.0
    }
}

impl core::fmt::Display for OrderKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.0.split('.');
        let mut right = other.0.split('.');
        loop {
            match (left.next(), right.next()) {
                (None, None) => return Ordering::Equal,
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(a), Some(b)) => {
                    let ord = match (a.parse::<u64>(), b.parse::<u64>()) {
                        (Ok(x), Ok(y)) => x.cmp(&y),
                        _ => a.cmp(b),
                    };
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
            }
        }
    }
}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for OrderKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

/// Reference from a template node to a question id in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRef {
    /// Question id to resolve, e.g. `Q4`.
    pub question_id: String,
}

/// Document-level metadata block of a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Title printed at the top of the document.
    #[serde(default)]
    pub template_name: Option<String>,
}

impl DocumentMetadata {
    /// The template name, or [`DEFAULT_TEMPLATE_NAME`] when unset.
    pub fn display_name(&self) -> &str {
        self.template_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(DEFAULT_TEMPLATE_NAME)
    }
}

/// A second-level template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsectionTemplate {
    /// Ordering key within the parent section.
    #[serde(rename = "subsectionOrder")]
    pub order: OrderKey,
    /// Display title.
    #[serde(rename = "subsectionTitle", default)]
    pub title: Option<String>,
    /// Questions in display order.
    #[serde(default)]
    pub questions: Vec<QuestionRef>,
}

impl SubsectionTemplate {
    /// The title, or `Subsection {order}` when unset.
    pub fn display_title(&self) -> String {
        display_title(self.title.as_deref(), "Subsection", &self.order)
    }
}

/// A top-level template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTemplate {
    /// Ordering key within the document.
    #[serde(rename = "sectionOrder")]
    pub order: OrderKey,
    /// Display title.
    #[serde(rename = "sectionTitle", default)]
    pub title: Option<String>,
    /// Questions answered directly in this section, in display order.
    #[serde(default)]
    pub questions: Vec<QuestionRef>,
    /// Nested subsections.
    #[serde(default)]
    pub subsections: Vec<SubsectionTemplate>,
}

impl SectionTemplate {
    /// The title, or `Section {order}` when unset.
    pub fn display_title(&self) -> String {
        display_title(self.title.as_deref(), "Section", &self.order)
    }

    /// Subsections sorted by their order key.
    pub fn ordered_subsections(&self) -> Vec<&SubsectionTemplate> {
        let mut subsections: Vec<&SubsectionTemplate> = self.subsections.iter().collect();
        subsections.sort_by(|a, b| a.order.cmp(&b.order));
        subsections
    }
}

/// A complete SOW template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateDefinition {
    /// Document-level metadata.
    #[serde(default)]
    pub document_metadata: DocumentMetadata,
    /// Top-level sections.
    #[serde(default)]
    pub sections: Vec<SectionTemplate>,
}

impl TemplateDefinition {
    /// Sections sorted by their order key, independent of file order.
    pub fn ordered_sections(&self) -> Vec<&SectionTemplate> {
        let mut sections: Vec<&SectionTemplate> = self.sections.iter().collect();
        sections.sort_by(|a, b| a.order.cmp(&b.order));
        sections
    }
}

fn display_title(title: Option<&str>, fallback: &str, order: &OrderKey) -> String {
    match title.map(str::trim) {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => format!("{fallback} {order}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_keys_compare_numerically_per_segment() {
        assert!(OrderKey::new("2") < OrderKey::new("10"));
        assert!(OrderKey::new("1.9") < OrderKey::new("1.10"));
        assert!(OrderKey::new("1") < OrderKey::new("1.1"));
        assert_eq!(OrderKey::new("3"), OrderKey::new("03"));
    }

    #[test]
    fn order_key_accepts_numbers_and_strings() {
        let json = r#"[{"sectionOrder": 2, "sectionTitle": "B"},
                       {"sectionOrder": "1", "sectionTitle": "A"}]"#;
        let sections: Vec<SectionTemplate> = serde_json::from_str(json).unwrap_or_default();
        assert_eq!(sections.len(), 2);
        assert_eq!(sections.first().map(|s| s.order.as_str()), Some("2"));
    }

    #[test]
    fn only_string_orders_keep_trailing_zeros() {
        let json = r#"[{"subsectionOrder": "1.10"}, {"subsectionOrder": 1.10}]"#;
        let subsections: Vec<SubsectionTemplate> = serde_json::from_str(json).unwrap_or_default();
        let orders: Vec<&str> = subsections.iter().map(|s| s.order.as_str()).collect();
        assert_eq!(orders, vec!["1.10", "1.1"]);
        assert!(OrderKey::new("1.1") < OrderKey::new("1.10"));
    }

    #[test]
    fn sections_sorted_by_order_not_file_position() {
        let json = r#"{"sections": [
            {"sectionOrder": 10, "sectionTitle": "Ten"},
            {"sectionOrder": 2, "sectionTitle": "Two"},
            {"sectionOrder": 1, "sectionTitle": "One", "subsections": [
                {"subsectionOrder": "1.2", "subsectionTitle": "b"},
                {"subsectionOrder": "1.1", "subsectionTitle": "a"}
            ]}
        ]}"#;
        let template: TemplateDefinition = serde_json::from_str(json).unwrap_or_default();
        let titles: Vec<String> = template
            .ordered_sections()
            .iter()
            .map(|s| s.display_title())
            .collect();
        assert_eq!(titles, vec!["One", "Two", "Ten"]);

        let first = template.ordered_sections().first().copied().cloned();
        let subs: Vec<String> = first
            .map(|s| s.ordered_subsections().iter().map(|x| x.display_title()).collect())
            .unwrap_or_default();
        assert_eq!(subs, vec!["a", "b"]);
    }

    #[test]
    fn missing_titles_fall_back_to_order() {
        let section: Option<SectionTemplate> =
            serde_json::from_str(r#"{"sectionOrder": 4}"#).ok();
        assert_eq!(
            section.map(|s| s.display_title()).as_deref(),
            Some("Section 4")
        );
        assert_eq!(DocumentMetadata::default().display_name(), DEFAULT_TEMPLATE_NAME);
    }
}
