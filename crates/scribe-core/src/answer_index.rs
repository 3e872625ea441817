//! Question-id lookups over a stored SOW payload.
//!
//! ```text
//! payload.sections[*].questionsAndAnswers[*]                 -> section scope
//! payload.sections[*].subsections[*].questionsAndAnswers[*]  -> subsection scope
//! ```
//!
//! The two scopes are kept apart: the same question id may carry different
//! answers at section and subsection level.

use std::collections::BTreeMap;

use serde_json::Value;

/// Answers keyed by question id, in payload order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl AnswerIndex {
    /// Answers recorded for a question; empty when the question is absent.
    pub fn answers(&self, question_id: &str) -> &[String] {
        self.entries
            .get(question_id.trim())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of distinct question ids.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no questions.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, question_id: &str, answers: Vec<String>) {
        if self
            .entries
            .insert(question_id.trim().to_owned(), answers)
            .is_some()
        {
            tracing::debug!(question_id, "question id repeated, keeping later answers");
        }
    }
}

/// Section-scope and subsection-scope indexes built from one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerIndexes {
    /// Answers attached directly to sections.
    pub section: AnswerIndex,
    /// Answers attached to subsections.
    pub subsection: AnswerIndex,
}

impl AnswerIndexes {
    /// Build both indexes from a stored payload.
    ///
    /// Malformed nodes are skipped with a warning; a payload without
    /// `sections` yields two empty indexes. When a question id repeats within
    /// one scope, the entry that comes later in the payload wins.
    pub fn build(payload: &Value) -> Self {
        let mut indexes = Self::default();

        let Some(sections) = payload.get("sections").and_then(Value::as_array) else {
            tracing::warn!("payload has no sections array");
            return indexes;
        };

        for section in sections {
            if !section.is_object() {
                tracing::warn!("skipping non-object section node");
                continue;
            }
            index_entries(section, &mut indexes.section);

            let Some(subsections) = section.get("subsections") else {
                continue;
            };
            let Some(subsections) = subsections.as_array() else {
                tracing::warn!("skipping non-array subsections node");
                continue;
            };
            for subsection in subsections {
                index_entries(subsection, &mut indexes.subsection);
            }
        }

        tracing::debug!(
            section_questions = indexes.section.len(),
            subsection_questions = indexes.subsection.len(),
            "built answer indexes"
        );
        indexes
    }
}

/// Fold a node's `questionsAndAnswers` list into an index.
fn index_entries(node: &Value, index: &mut AnswerIndex) {
    let Some(entries) = node
        .get("questionsAndAnswers")
        .or_else(|| node.get("questions_and_answers"))
    else {
        return;
    };
    let Some(entries) = entries.as_array() else {
        tracing::warn!("skipping non-array questionsAndAnswers node");
        return;
    };

    for entry in entries {
        let question_id = entry
            .get("question_id")
            .or_else(|| entry.get("questionId"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|id| !id.is_empty());
        let Some(question_id) = question_id else {
            tracing::warn!("skipping answer entry without question id");
            continue;
        };

        let found = entry
            .get("answers_found")
            .or_else(|| entry.get("answersFound"));
        let answers = match found {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let text = item.as_str();
                    if text.is_none() {
                        tracing::warn!(question_id, "skipping non-string answer");
                    }
                    text.map(ToOwned::to_owned)
                })
                .collect(),
            Some(Value::String(single)) => vec![single.clone()],
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                tracing::warn!(question_id, "skipping malformed answers_found");
                continue;
            }
        };
        index.insert(question_id, answers);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn scopes_are_separate() {
        let payload = json!({
            "sections": [{
                "questionsAndAnswers": [
                    {"question_id": "Q1", "answers_found": ["section answer"]}
                ],
                "subsections": [{
                    "questionsAndAnswers": [
                        {"questionId": "Q1", "answersFound": ["subsection answer"]}
                    ]
                }]
            }]
        });
        let indexes = AnswerIndexes::build(&payload);
        assert_eq!(indexes.section.answers("Q1"), ["section answer"]);
        assert_eq!(indexes.subsection.answers("Q1"), ["subsection answer"]);
    }

    #[test]
    fn absent_question_has_no_answers() {
        let indexes = AnswerIndexes::build(&json!({"sections": []}));
        assert!(indexes.section.answers("Q9").is_empty());
        assert!(indexes.section.is_empty());
    }

    #[test]
    fn repeated_id_keeps_last_entry_and_single_string_is_accepted() {
        let payload = json!({
            "sections": [
                {"questionsAndAnswers": [{"question_id": "Q1", "answers_found": ["old", "stale"]}]},
                {"questionsAndAnswers": [{"question_id": "Q1", "answers_found": "new"}]}
            ]
        });
        let indexes = AnswerIndexes::build(&payload);
        assert_eq!(indexes.section.answers("Q1"), ["new"]);
        assert_eq!(indexes.section.len(), 1);
    }

    #[test]
    fn repeated_id_in_subsections_keeps_last_entry() {
        let payload = json!({
            "sections": [{
                "subsections": [
                    {"questionsAndAnswers": [{"question_id": "Q4", "answers_found": ["first"]}]},
                    {"questionsAndAnswers": [{"question_id": "Q4", "answers_found": ["second"]}]}
                ]
            }]
        });
        let indexes = AnswerIndexes::build(&payload);
        assert_eq!(indexes.subsection.answers("Q4"), ["second"]);
    }

    #[test]
    fn malformed_nodes_are_skipped() {
        let payload = json!({
            "sections": [
                "not an object",
                {"questionsAndAnswers": [
                    {"answers_found": ["orphan"]},
                    {"question_id": "Q2", "answers_found": 42},
                    {"question_id": "Q3", "answers_found": ["ok", 7]}
                ],
                 "subsections": "nope"}
            ]
        });
        let indexes = AnswerIndexes::build(&payload);
        assert_eq!(indexes.section.len(), 1);
        assert!(indexes.section.answers("Q2").is_empty());
        assert_eq!(indexes.section.answers("Q3"), ["ok"]);
        assert!(indexes.subsection.is_empty());
    }

    #[test]
    fn payload_without_sections_is_empty() {
        let indexes = AnswerIndexes::build(&json!({"lead_id": "L1"}));
        assert_eq!(indexes, AnswerIndexes::default());
    }
}
