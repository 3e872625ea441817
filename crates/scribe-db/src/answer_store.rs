//! Meeting answer persistence.
//!
//! Stores the normalized `Q<n>` / `A<n>` pairs from a meeting event in the
//! `meeting_answers` table, keyed by `(meeting_id, question_number)`.
//! Re-submitting a meeting overwrites answers that already exist and keeps
//! the rest.

use scribe_types::{AnswerRecord, MeetingId, ParsedAnswers};
use sqlx::PgPool;

use crate::error::StoreError;

/// Operations on the `meeting_answers` table.
pub struct MeetingAnswerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> MeetingAnswerStore<'a> {
    /// Create a new answer store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Upsert every answer of a meeting in a single transaction.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRow`] if a question number does not fit
    /// the column type, and [`StoreError::Postgres`] if the write fails.
    pub async fn save(&self, parsed: &ParsedAnswers) -> Result<u64, StoreError> {
        if parsed.answers.is_empty() {
            return Ok(0);
        }

        let len = parsed.answers.len();
        let mut numbers = Vec::with_capacity(len);
        let mut ids = Vec::with_capacity(len);
        let mut questions = Vec::with_capacity(len);
        let mut answers = Vec::with_capacity(len);

        for record in &parsed.answers {
            numbers.push(i32::try_from(record.question_number).map_err(|e| {
                StoreError::InvalidRow(format!(
                    "question number {} out of range: {e}",
                    record.question_number
                ))
            })?);
            ids.push(record.question_id.clone());
            questions.push(record.question_text.clone());
            answers.push(record.answer_text.clone());
        }

        let mut tx = self.pool.begin().await?;

        let written = sqlx::query(
            r"INSERT INTO meeting_answers (meeting_id, question_number, question_id, question_text, answer_text)
              SELECT $1::TEXT, * FROM UNNEST($2::INTEGER[], $3::TEXT[], $4::TEXT[], $5::TEXT[])
              ON CONFLICT (meeting_id, question_number) DO UPDATE
                SET question_id = EXCLUDED.question_id,
                    question_text = EXCLUDED.question_text,
                    answer_text = EXCLUDED.answer_text,
                    updated_at = now()",
        )
        .bind(parsed.meeting_id.as_str())
        .bind(&numbers)
        .bind(&ids)
        .bind(&questions)
        .bind(&answers)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        tracing::debug!(
            meeting_id = %parsed.meeting_id,
            count = written,
            "Saved meeting answers (batch UNNEST)"
        );
        Ok(written)
    }

    /// Return all stored answers of a meeting, ordered by question number.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails and
    /// [`StoreError::InvalidRow`] if a stored question number is negative.
    pub async fn get(&self, meeting_id: &MeetingId) -> Result<Vec<AnswerRecord>, StoreError> {
        let rows = sqlx::query_as::<_, MeetingAnswerRow>(
            r"SELECT meeting_id, question_number, question_id, question_text, answer_text
              FROM meeting_answers
              WHERE meeting_id = $1
              ORDER BY question_number",
        )
        .bind(meeting_id.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(AnswerRecord::try_from).collect()
    }
}

/// A row from the `meeting_answers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MeetingAnswerRow {
    /// Meeting id.
    pub meeting_id: String,
    /// The `n` in `Q<n>`.
    pub question_number: i32,
    /// Original question key.
    pub question_id: String,
    /// Question text.
    pub question_text: String,
    /// Answer text.
    pub answer_text: String,
}

impl TryFrom<MeetingAnswerRow> for AnswerRecord {
    type Error = StoreError;

    fn try_from(row: MeetingAnswerRow) -> Result<Self, Self::Error> {
        let question_number = u32::try_from(row.question_number).map_err(|e| {
            StoreError::InvalidRow(format!(
                "meeting_answers({}, {}): {e}",
                row.meeting_id, row.question_number
            ))
        })?;
        Ok(Self {
            question_number,
            question_id: row.question_id,
            question_text: row.question_text,
            answer_text: row.answer_text,
        })
    }
}
