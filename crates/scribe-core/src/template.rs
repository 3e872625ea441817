//! SOW template loading.
//!
//! The template is read once at startup and shared read-only by every
//! document request.

use std::collections::BTreeSet;

use scribe_types::TemplateDefinition;

use crate::error::TemplateError;

/// Parse a template from JSON text.
///
/// Duplicate section order keys are accepted but logged, since their
/// relative order is then decided by file position.
///
/// # Errors
///
/// Returns [`TemplateError::Parse`] if the JSON does not match the template
/// shape.
pub fn parse_template(json: &str) -> Result<TemplateDefinition, TemplateError> {
    let template: TemplateDefinition = serde_json::from_str(json)?;

    let mut seen = BTreeSet::new();
    for section in &template.sections {
        if !seen.insert(section.order.as_str()) {
            tracing::warn!(order = section.order.as_str(), "duplicate section order");
        }
    }
    if template.sections.is_empty() {
        tracing::warn!("template has no sections");
    }
    Ok(template)
}

/// Read and parse a template file.
///
/// # Errors
///
/// Returns [`TemplateError::Io`] if the file cannot be read and
/// [`TemplateError::Parse`] if it is not a valid template.
pub fn load_template(path: &str) -> Result<TemplateDefinition, TemplateError> {
    let json = std::fs::read_to_string(path).map_err(|source| TemplateError::Io {
        path: path.to_owned(),
        source,
    })?;
    let template = parse_template(&json)?;
    tracing::info!(
        path,
        name = template.document_metadata.display_name(),
        sections = template.sections.len(),
        "Loaded SOW template"
    );
    Ok(template)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_order_types() {
        let template = parse_template(
            r#"{
                "documentMetadata": {"templateName": "Statement of Work"},
                "sections": [
                    {"sectionOrder": "2", "sectionTitle": "Scope", "questions": [{"questionId": "Q3"}]},
                    {"sectionOrder": 1, "sectionTitle": "Overview", "subsections": [
                        {"subsectionOrder": 1.1, "subsectionTitle": "Goals"}
                    ]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(template.document_metadata.display_name(), "Statement of Work");
        let orders: Vec<&str> = template
            .ordered_sections()
            .iter()
            .map(|s| s.order.as_str())
            .collect();
        assert_eq!(orders, vec!["1", "2"]);
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(matches!(
            parse_template(r#"{"sections": "nope"}"#),
            Err(TemplateError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            load_template("/nonexistent/sow_template.json"),
            Err(TemplateError::Io { .. })
        ));
    }

    #[test]
    fn bundled_template_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../templates/sow_template.json");
        let template = load_template(path).unwrap();
        assert!(!template.sections.is_empty());
    }
}
