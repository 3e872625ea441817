//! Inbound event normalization.
//!
//! Two event shapes arrive from upstream:
//!
//! - **Meeting answers**: a flat dictionary of `Q<n>` / `A<n>` pairs for one
//!   meeting, normalized by [`EventParser::parse`] into ordered
//!   [`AnswerRecord`]s.
//! - **Store triggers**: a full SOW payload carrying the metadata needed to
//!   append a version, checked by [`parse_store_trigger`].

use std::collections::BTreeMap;

use scribe_types::{
    AnswerRecord, EmployeeId, LeadId, MeetingId, NewVersion, OrganizationId, ParsedAnswers,
    SowMetadata,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationError};

use crate::error::InvalidEventError;

/// Normalizes meeting answer events.
pub struct EventParser;

impl EventParser {
    /// Parse a meeting answer event.
    ///
    /// ```json
    /// { "meeting_id": "M1", "answers": { "Q1": "Goal?", "A1": "Automate" } }
    /// ```
    ///
    /// Keys that are not `Q<digits>` with a positive number are ignored. A
    /// question whose `A<digits>` partner is missing or blank is skipped with
    /// a warning. Output is ordered by question number, so `Q2` precedes
    /// `Q10`.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidEventError`] if the event is not an object, lacks a
    /// usable `meeting_id`, or has a missing, non-object or empty `answers`.
    pub fn parse(raw: &Value) -> Result<ParsedAnswers, InvalidEventError> {
        let obj = raw.as_object().ok_or(InvalidEventError::NotAnObject)?;

        let meeting_id = meeting_id(obj)?;

        let answers = obj
            .get("answers")
            .ok_or(InvalidEventError::MissingField("answers"))?
            .as_object()
            .ok_or_else(|| InvalidEventError::InvalidField {
                field: "answers",
                reason: String::from("must be an object"),
            })?;
        if answers.is_empty() {
            return Err(InvalidEventError::InvalidField {
                field: "answers",
                reason: String::from("must not be empty"),
            });
        }

        let mut ordered: BTreeMap<u32, AnswerRecord> = BTreeMap::new();
        for (key, question) in answers {
            let Some((digits, number)) = question_number(key)? else {
                continue;
            };

            let answer_key = format!("A{digits}");
            let Some(answer_text) = answers.get(&answer_key).and_then(scalar_text) else {
                tracing::warn!(
                    meeting_id = %meeting_id,
                    question = key.as_str(),
                    "no answer for question, skipping"
                );
                continue;
            };
            if answer_text.trim().is_empty() {
                tracing::warn!(
                    meeting_id = %meeting_id,
                    question = key.as_str(),
                    "blank answer for question, skipping"
                );
                continue;
            }

            if ordered.contains_key(&number) {
                tracing::warn!(
                    meeting_id = %meeting_id,
                    question = key.as_str(),
                    "question number repeated, keeping first"
                );
                continue;
            }
            ordered.insert(
                number,
                AnswerRecord {
                    question_number: number,
                    question_id: key.clone(),
                    question_text: scalar_text(question).unwrap_or_default(),
                    answer_text,
                },
            );
        }

        tracing::debug!(
            meeting_id = %meeting_id,
            count = ordered.len(),
            "parsed meeting answers"
        );
        Ok(ParsedAnswers {
            meeting_id,
            answers: ordered.into_values().collect(),
        })
    }
}

/// Read `meeting_id` (or `meetingId`) as a string or number.
fn meeting_id(obj: &Map<String, Value>) -> Result<MeetingId, InvalidEventError> {
    let value = obj
        .get("meeting_id")
        .or_else(|| obj.get("meetingId"))
        .filter(|v| !v.is_null())
        .ok_or(InvalidEventError::MissingField("meeting_id"))?;
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => {
            return Err(InvalidEventError::InvalidField {
                field: "meeting_id",
                reason: String::from("must be a string or number"),
            });
        }
    };
    MeetingId::new(text).map_err(|e| InvalidEventError::InvalidField {
        field: "meeting_id",
        reason: e.to_string(),
    })
}

/// Longest `Q<digits>` key the `meeting_answers.question_id` column holds.
pub const MAX_QUESTION_KEY_LEN: usize = 32;

/// Split `Q<digits>` into its digit string and positive number.
///
/// `Ok(None)` for keys that are not questions (including `Q0`). Question
/// keys the store cannot hold are an error: numbers above `i32::MAX` and
/// keys longer than [`MAX_QUESTION_KEY_LEN`].
fn question_number(key: &str) -> Result<Option<(&str, u32)>, InvalidEventError> {
    let Some(digits) = key.strip_prefix('Q') else {
        return Ok(None);
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let out_of_range = |reason: String| InvalidEventError::InvalidField {
        field: "answers",
        reason,
    };
    if key.len() > MAX_QUESTION_KEY_LEN {
        return Err(out_of_range(format!(
            "question key {key} exceeds {MAX_QUESTION_KEY_LEN} characters"
        )));
    }
    let number = digits
        .parse::<i32>()
        .map_err(|e| out_of_range(format!("question number in {key} is out of range: {e}")))?;
    Ok(u32::try_from(number)
        .ok()
        .filter(|n| *n > 0)
        .map(|n| (digits, n)))
}

/// Text of a scalar JSON value; `None` for null, arrays and objects.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Metadata fields every SOW store request must carry.
///
/// Text limits match the `sow_versions` column widths, so anything that
/// validates here fits either store. Everything else in the request is
/// freeform and kept only as payload.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreTrigger {
    /// Template reference the SOW was filled against.
    #[serde(alias = "referenceNumber", alias = "sowTemplateReferenceNumber")]
    #[validate(custom(function = "not_blank"), length(max = 128))]
    pub sow_template_reference_number: String,
    /// Meeting the answers were captured in.
    #[serde(alias = "meetingId")]
    pub meeting_id: MeetingId,
    /// Lead the version chain belongs to.
    #[serde(alias = "leadId")]
    pub lead_id: LeadId,
    /// Lead display name.
    #[serde(alias = "leadName")]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub lead_name: String,
    /// Owning organization.
    #[serde(alias = "organizationId")]
    pub organization_id: OrganizationId,
    /// Owning organization display name.
    #[serde(alias = "organizationName")]
    #[validate(custom(function = "not_blank"), length(max = 255))]
    pub organization_name: String,
    /// Submitting employee.
    #[serde(alias = "createdBy")]
    pub created_by: EmployeeId,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be empty".into()));
    }
    Ok(())
}

impl StoreTrigger {
    /// Turn the checked metadata and the raw event into a store input.
    pub fn into_new_version(self, payload: Value) -> NewVersion {
        NewVersion {
            lead_id: self.lead_id,
            metadata: SowMetadata {
                reference_number: self.sow_template_reference_number.trim().to_owned(),
                meeting_id: self.meeting_id,
                lead_name: self.lead_name.trim().to_owned(),
                organization_id: self.organization_id,
                organization_name: self.organization_name.trim().to_owned(),
            },
            payload,
            created_by: self.created_by,
        }
    }
}

/// Validate a SOW store request and build the version to append.
///
/// The entire event, metadata included, becomes the stored payload.
///
/// # Errors
///
/// Returns [`InvalidEventError`] naming the first missing or invalid field.
pub fn parse_store_trigger(raw: Value) -> Result<NewVersion, InvalidEventError> {
    if !raw.is_object() {
        return Err(InvalidEventError::NotAnObject);
    }
    let trigger = StoreTrigger::deserialize(&raw)
        .map_err(|e| InvalidEventError::Malformed(e.to_string()))?;
    trigger
        .validate()
        .map_err(|e| InvalidEventError::Validation(e.to_string()))?;
    Ok(trigger.into_new_version(raw))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn orders_questions_numerically() {
        let raw = json!({
            "meeting_id": "M1",
            "answers": {
                "Q10": "Budget?", "A10": "50k",
                "Q2": "Goal?", "A2": "Automate",
                "Q1": "Who?", "A1": "Ops"
            }
        });
        let parsed = EventParser::parse(&raw).unwrap();
        let numbers: Vec<u32> = parsed.answers.iter().map(|a| a.question_number).collect();
        assert_eq!(numbers, vec![1, 2, 10]);
        assert_eq!(parsed.answers[1].question_id, "Q2");
        assert_eq!(parsed.answers[1].answer_text, "Automate");
        assert_eq!(parsed.meeting_id.as_str(), "M1");
    }

    #[test]
    fn skips_questions_without_answers() {
        let raw = json!({
            "meetingId": 77,
            "answers": {
                "Q1": "a?", "A1": "yes",
                "Q5": "b?",
                "Q6": "c?", "A6": "   ",
                "notes": "ignored",
                "Q0": "zero?", "A0": "no",
                "Qx": "bad", "Ax": "bad"
            }
        });
        let parsed = EventParser::parse(&raw).unwrap();
        assert_eq!(parsed.meeting_id.as_str(), "77");
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].question_number, 1);
    }

    #[test]
    fn rejects_missing_meeting_and_bad_answers() {
        assert_eq!(
            EventParser::parse(&json!({"answers": {"Q1": "a", "A1": "b"}})),
            Err(InvalidEventError::MissingField("meeting_id"))
        );
        assert_eq!(
            EventParser::parse(&json!({"meeting_id": "M1"})),
            Err(InvalidEventError::MissingField("answers"))
        );
        assert!(matches!(
            EventParser::parse(&json!({"meeting_id": "M1", "answers": ["Q1"]})),
            Err(InvalidEventError::InvalidField { field: "answers", .. })
        ));
        assert!(matches!(
            EventParser::parse(&json!({"meeting_id": "M1", "answers": {}})),
            Err(InvalidEventError::InvalidField { field: "answers", .. })
        ));
        assert!(matches!(
            EventParser::parse(&json!({"meeting_id": " ", "answers": {"Q1": "a"}})),
            Err(InvalidEventError::InvalidField { field: "meeting_id", .. })
        ));
        assert_eq!(
            EventParser::parse(&json!([1, 2])),
            Err(InvalidEventError::NotAnObject)
        );
    }

    fn trigger() -> Value {
        json!({
            "sow_template_reference_number": "R1",
            "meeting_id": "M1",
            "lead_id": "L1",
            "lead_name": "Acme Corp",
            "organization_id": 7,
            "organization_name": "Acme",
            "created_by": "42",
            "sections": []
        })
    }

    #[test]
    fn store_trigger_keeps_full_payload() {
        let raw = trigger();
        let new = parse_store_trigger(raw.clone()).unwrap();
        assert_eq!(new.lead_id.as_str(), "L1");
        assert_eq!(new.created_by, EmployeeId(42));
        assert_eq!(new.metadata.organization_id, OrganizationId(7));
        assert_eq!(new.metadata.reference_number, "R1");
        assert_eq!(new.payload, raw);
    }

    #[test]
    fn store_trigger_accepts_camel_case_aliases() {
        let raw = json!({
            "referenceNumber": "R9",
            "meetingId": "M1",
            "leadId": 12,
            "leadName": "Acme",
            "organizationId": "7",
            "organizationName": "Acme",
            "createdBy": 42
        });
        let new = parse_store_trigger(raw).unwrap();
        assert_eq!(new.lead_id.as_str(), "12");
        assert_eq!(new.metadata.reference_number, "R9");
    }

    #[test]
    fn store_trigger_rejects_missing_or_blank_fields() {
        let mut missing = trigger();
        missing.as_object_mut().unwrap().remove("lead_name");
        let err = parse_store_trigger(missing).unwrap_err();
        assert!(matches!(err, InvalidEventError::Malformed(ref m) if m.contains("lead_name")));

        let mut blank = trigger();
        blank["organization_name"] = json!("  ");
        let err = parse_store_trigger(blank).unwrap_err();
        assert!(
            matches!(err, InvalidEventError::Validation(ref m) if m.contains("organization_name"))
        );

        let mut empty_lead = trigger();
        empty_lead["lead_id"] = json!("");
        assert!(matches!(
            parse_store_trigger(empty_lead),
            Err(InvalidEventError::Malformed(_))
        ));
    }

    #[test]
    fn question_id_keeps_the_raw_key() {
        let raw = json!({
            "meeting_id": "M1",
            "answers": {"Q01": "Goal?", "A01": "Automate", "Q1": "Dup?", "A1": "dup"}
        });
        let parsed = EventParser::parse(&raw).unwrap();
        assert_eq!(parsed.answers.len(), 1);
        assert_eq!(parsed.answers[0].question_number, 1);
        assert_eq!(parsed.answers[0].question_id, "Q01");
    }

    #[test]
    fn rejects_question_numbers_the_store_cannot_hold() {
        let too_big = json!({
            "meeting_id": "M1",
            "answers": {"Q2147483648": "a?", "A2147483648": "b"}
        });
        assert!(matches!(
            EventParser::parse(&too_big),
            Err(InvalidEventError::InvalidField { field: "answers", .. })
        ));

        let largest = json!({
            "meeting_id": "M1",
            "answers": {"Q2147483647": "a?", "A2147483647": "b"}
        });
        let parsed = EventParser::parse(&largest).unwrap();
        assert_eq!(parsed.answers[0].question_number, 2_147_483_647);

        let digits = format!("{}1", "0".repeat(MAX_QUESTION_KEY_LEN));
        let mut answers = Map::new();
        answers.insert(format!("Q{digits}"), json!("a?"));
        answers.insert(format!("A{digits}"), json!("b"));
        let padded = json!({"meeting_id": "M1", "answers": answers});
        assert!(matches!(
            EventParser::parse(&padded),
            Err(InvalidEventError::InvalidField { field: "answers", .. })
        ));
    }

    #[test]
    fn rejects_overlong_meeting_id() {
        let raw = json!({"meeting_id": "M".repeat(65), "answers": {"Q1": "a", "A1": "b"}});
        assert!(matches!(
            EventParser::parse(&raw),
            Err(InvalidEventError::InvalidField { field: "meeting_id", .. })
        ));
    }

    #[test]
    fn store_trigger_enforces_column_widths() {
        let mut long_name = trigger();
        long_name["lead_name"] = json!("x".repeat(256));
        let err = parse_store_trigger(long_name).unwrap_err();
        assert!(matches!(err, InvalidEventError::Validation(ref m) if m.contains("lead_name")));

        let mut long_org = trigger();
        long_org["organization_name"] = json!("x".repeat(256));
        assert!(matches!(
            parse_store_trigger(long_org),
            Err(InvalidEventError::Validation(_))
        ));

        let mut long_reference = trigger();
        long_reference["sow_template_reference_number"] = json!("R".repeat(129));
        let err = parse_store_trigger(long_reference).unwrap_err();
        assert!(matches!(
            err,
            InvalidEventError::Validation(ref m) if m.contains("sow_template_reference_number")
        ));

        let mut long_lead = trigger();
        long_lead["lead_id"] = json!("L".repeat(65));
        assert!(matches!(
            parse_store_trigger(long_lead),
            Err(InvalidEventError::Malformed(_))
        ));

        let mut long_meeting = trigger();
        long_meeting["meeting_id"] = json!("M".repeat(65));
        assert!(matches!(
            parse_store_trigger(long_meeting),
            Err(InvalidEventError::Malformed(_))
        ));

        let mut at_limit = trigger();
        at_limit["lead_name"] = json!("x".repeat(255));
        at_limit["lead_id"] = json!("L".repeat(64));
        at_limit["sow_template_reference_number"] = json!("R".repeat(128));
        assert!(parse_store_trigger(at_limit).is_ok());
    }
}
