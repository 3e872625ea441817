//! Meeting question/answer records produced by the event parser.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::MeetingId;

/// One answered question from a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AnswerRecord {
    /// The `n` in `Q<n>`.
    pub question_number: u32,
    /// Normalized question key, e.g. `Q3`.
    pub question_id: String,
    /// Question text.
    pub question_text: String,
    /// Answer text.
    pub answer_text: String,
}

/// Normalized meeting answers, ordered by question number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ParsedAnswers {
    /// Meeting the answers belong to.
    #[ts(type = "string")]
    pub meeting_id: MeetingId,
    /// Answers in ascending question-number order.
    pub answers: Vec<AnswerRecord>,
}
