//! `PostgreSQL` store for versioned SOW payloads.
//!
//! Every lead owns an append-only chain of records in `sow_versions`.
//! Exactly one record per chain carries `is_latest = TRUE`; each record
//! points at its predecessor through `parent_sow_id`.
//!
//! # Appending a version
//!
//! ```text
//! BEGIN
//!   pg_advisory_xact_lock(hashtext(lead_id))     -- serialize per lead
//!   SELECT ... WHERE is_latest FOR UPDATE         -- 0 or 1 rows, 2+ = corrupt
//!   UPDATE ... SET is_latest = FALSE
//!     WHERE id = $prev AND is_latest              -- compare-and-set
//!   INSERT ... (version = prev + 1, parent = prev) RETURNING *
//! COMMIT                                          -- or ROLLBACK on any error
//! ```
//!
//! Writers for different leads take different advisory locks and never
//! block each other. The partial unique index `uq_lead_latest` and the
//! `uq_lead_version` constraint back the same invariants at the storage
//! layer.

use scribe_types::{
    EmployeeId, LeadId, MeetingId, NewVersion, OrganizationId, RecordId, SowMetadata,
    VersionedRecord,
};
use sqlx::{PgConnection, PgPool};

use crate::error::StoreError;
use crate::repository::{Entity, Page, PageResult, Repository};

/// Columns selected for every `sow_versions` read.
const RECORD_COLUMNS: &str = "id, lead_id, version_number, is_latest, parent_sow_id, \
     sow_template_reference_number, meeting_id, lead_name, organization_id, organization_name, \
     raw_payload, created_by, created_at, updated_by, updated_at";

/// Operations on the `sow_versions` table.
pub struct VersionStore<'a> {
    pool: &'a PgPool,
}

impl<'a> VersionStore<'a> {
    /// Create a new version store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append a new version to the lead's chain and return it.
    ///
    /// The previous latest record (if any) is demoted and becomes the new
    /// record's parent. The whole sequence runs in one transaction that is
    /// rolled back on any failure, so readers never observe a half-applied
    /// transition.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Corruption`] if the chain already has two latest records.
    /// - [`StoreError::ConcurrentUpdate`] if the compare-and-set flip misses.
    /// - [`StoreError::DuplicateVersion`] on a `(lead_id, version_number)` clash.
    /// - [`StoreError::Postgres`] for any other database failure.
    pub async fn insert_version(&self, new: &NewVersion) -> Result<VersionedRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        match append_in_tx(&mut *tx, new).await {
            Ok(record) => {
                tx.commit().await?;
                tracing::info!(
                    lead_id = %record.lead_id,
                    version = record.version_number,
                    record_id = %record.id,
                    parent_id = ?record.parent_id.map(RecordId::into_inner),
                    reference = record.metadata.reference_number.as_str(),
                    "Inserted SOW version"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::error!(
                    lead_id = %new.lead_id,
                    error = %e,
                    "SOW version insert failed, rolling back"
                );
                if let Err(rollback_err) = tx.rollback().await {
                    tracing::warn!(error = %rollback_err, "rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Return the latest record of a lead's chain, or `None` if the lead has
    /// no history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corruption`] if more than one record is marked
    /// latest, and [`StoreError::Postgres`] if the query fails.
    pub async fn get_latest(&self, lead_id: &LeadId) -> Result<Option<VersionedRecord>, StoreError> {
        let rows = sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM sow_versions
              WHERE lead_id = $1 AND is_latest
              ORDER BY version_number DESC"
        ))
        .bind(lead_id.as_str())
        .fetch_all(self.pool)
        .await?;

        single_latest(lead_id, rows)?
            .map(VersionedRecord::try_from)
            .transpose()
    }

    /// Return every version of a lead's chain, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn list_versions(&self, lead_id: &LeadId) -> Result<Vec<VersionedRecord>, StoreError> {
        let rows = sqlx::query_as::<_, VersionRow>(&format!(
            "SELECT {RECORD_COLUMNS} FROM sow_versions
              WHERE lead_id = $1
              ORDER BY version_number DESC"
        ))
        .bind(lead_id.as_str())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(VersionedRecord::try_from).collect()
    }

    /// Fetch a single record by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the query fails.
    pub async fn get_version(&self, id: RecordId) -> Result<Option<VersionedRecord>, StoreError> {
        Repository::<VersionRow>::new(self.pool)
            .fetch_by_key(id.into_inner())
            .await?
            .map(VersionedRecord::try_from)
            .transpose()
    }

    /// Page through all records across every lead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPage`] or [`StoreError::Postgres`].
    pub async fn list_records(&self, page: &Page) -> Result<PageResult<VersionedRecord>, StoreError> {
        let result = Repository::<VersionRow>::new(self.pool).fetch_page(page).await?;
        let items = result
            .items
            .into_iter()
            .map(VersionedRecord::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(PageResult {
            items,
            total_count: result.total_count,
        })
    }
}

/// Run the lock / read / flip / insert sequence on an open transaction.
async fn append_in_tx(
    conn: &mut PgConnection,
    new: &NewVersion,
) -> Result<VersionedRecord, StoreError> {
    let lead = new.lead_id.as_str();

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(lead)
        .execute(&mut *conn)
        .await?;

    let current = sqlx::query_as::<_, VersionRow>(&format!(
        "SELECT {RECORD_COLUMNS} FROM sow_versions
          WHERE lead_id = $1 AND is_latest
          FOR UPDATE"
    ))
    .bind(lead)
    .fetch_all(&mut *conn)
    .await?;

    let previous = single_latest(&new.lead_id, current)?;

    let (version_number, parent_id) = match &previous {
        Some(prev) => {
            let flipped = sqlx::query(
                r"UPDATE sow_versions
                  SET is_latest = FALSE, updated_by = $2, updated_at = now()
                  WHERE id = $1 AND is_latest",
            )
            .bind(prev.id)
            .bind(new.created_by.into_inner())
            .execute(&mut *conn)
            .await?;
            if flipped.rows_affected() != 1 {
                return Err(StoreError::ConcurrentUpdate {
                    lead_id: new.lead_id.clone(),
                });
            }
            let next = prev
                .version_number
                .checked_add(1)
                .ok_or_else(|| StoreError::VersionOverflow {
                    lead_id: new.lead_id.clone(),
                })?;
            (next, Some(prev.id))
        }
        None => (1, None),
    };

    let row = sqlx::query_as::<_, VersionRow>(&format!(
        "INSERT INTO sow_versions
           (sow_template_reference_number, meeting_id, lead_id, lead_name, organization_id,
            organization_name, version_number, is_latest, parent_sow_id, raw_payload, created_by)
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8, $9, $10)
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(&new.metadata.reference_number)
    .bind(new.metadata.meeting_id.as_str())
    .bind(lead)
    .bind(&new.metadata.lead_name)
    .bind(new.metadata.organization_id.into_inner())
    .bind(&new.metadata.organization_name)
    .bind(version_number)
    .bind(parent_id)
    .bind(&new.payload)
    .bind(new.created_by.into_inner())
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| StoreError::from_insert(e, &new.lead_id, version_number))?;

    VersionedRecord::try_from(row)
}

/// Reduce the latest-marked rows of a chain to at most one.
fn single_latest<T>(lead_id: &LeadId, mut rows: Vec<T>) -> Result<Option<T>, StoreError> {
    if rows.len() > 1 {
        return Err(StoreError::Corruption {
            lead_id: lead_id.clone(),
            latest_count: rows.len(),
        });
    }
    Ok(rows.pop())
}

/// A row from the `sow_versions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionRow {
    /// Record id.
    pub id: i64,
    /// Lead the chain belongs to.
    pub lead_id: String,
    /// Position in the chain.
    pub version_number: i32,
    /// Latest marker.
    pub is_latest: bool,
    /// Predecessor record id.
    pub parent_sow_id: Option<i64>,
    /// Template reference number.
    pub sow_template_reference_number: String,
    /// Meeting id.
    pub meeting_id: String,
    /// Lead display name.
    pub lead_name: String,
    /// Organization id.
    pub organization_id: i64,
    /// Organization display name.
    pub organization_name: String,
    /// Stored payload.
    pub raw_payload: serde_json::Value,
    /// Creator employee id.
    pub created_by: i64,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last updater employee id.
    pub updated_by: Option<i64>,
    /// Last update timestamp.
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Entity for VersionRow {
    const TABLE: &'static str = "sow_versions";
    const KEY: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "lead_id",
        "version_number",
        "is_latest",
        "parent_sow_id",
        "sow_template_reference_number",
        "meeting_id",
        "lead_name",
        "organization_id",
        "organization_name",
        "raw_payload",
        "created_by",
        "created_at",
        "updated_by",
        "updated_at",
    ];
}

impl TryFrom<VersionRow> for VersionedRecord {
    type Error = StoreError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let lead_id = LeadId::new(row.lead_id)
            .map_err(|e| StoreError::InvalidRow(format!("sow_versions.id={}: {e}", row.id)))?;
        let meeting_id = MeetingId::new(row.meeting_id)
            .map_err(|e| StoreError::InvalidRow(format!("sow_versions.id={}: {e}", row.id)))?;
        Ok(Self {
            id: RecordId(row.id),
            lead_id,
            version_number: row.version_number,
            is_latest: row.is_latest,
            parent_id: row.parent_sow_id.map(RecordId),
            metadata: SowMetadata {
                reference_number: row.sow_template_reference_number,
                meeting_id,
                lead_name: row.lead_name,
                organization_id: OrganizationId(row.organization_id),
                organization_name: row.organization_name,
            },
            payload: row.raw_payload,
            created_by: EmployeeId(row.created_by),
            created_at: row.created_at,
            updated_by: row.updated_by.map(EmployeeId),
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lead() -> LeadId {
        LeadId::new("L1").unwrap()
    }

    #[test]
    fn single_latest_accepts_zero_or_one() {
        assert_eq!(single_latest::<u8>(&lead(), vec![]).ok(), Some(None));
        assert_eq!(single_latest(&lead(), vec![7_u8]).ok(), Some(Some(7)));
    }

    #[test]
    fn single_latest_reports_corruption() {
        let err = single_latest(&lead(), vec![1_u8, 2]);
        assert!(matches!(
            err,
            Err(StoreError::Corruption { latest_count: 2, .. })
        ));
    }

    #[test]
    fn row_columns_match_select_list() {
        let joined = VersionRow::COLUMNS.join(", ");
        let normalized: String = RECORD_COLUMNS.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(joined, normalized);
    }
}
