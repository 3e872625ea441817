//! Error types for the data layer.
//!
//! All store failures are propagated via [`StoreError`], which wraps the
//! underlying [`sqlx`] errors and adds the version-chain faults the store
//! detects itself.

use scribe_types::LeadId;

/// `PostgreSQL` SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A `PostgreSQL` operation failed.
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A `PostgreSQL` migration failed.
    #[error("PostgreSQL migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// More than one record of a chain is marked latest.
    #[error("version chain for lead {lead_id} is corrupt: {latest_count} records marked latest")]
    Corruption {
        /// The affected chain.
        lead_id: LeadId,
        /// How many latest records were found.
        latest_count: usize,
    },

    /// The `(lead_id, version_number)` pair already exists.
    #[error("version {version_number} already exists for lead {lead_id}")]
    DuplicateVersion {
        /// The affected chain.
        lead_id: LeadId,
        /// The version that collided.
        version_number: i32,
    },

    /// The latest record changed between read and flip.
    #[error("latest version of lead {lead_id} changed concurrently")]
    ConcurrentUpdate {
        /// The affected chain.
        lead_id: LeadId,
    },

    /// The chain has reached the largest representable version number.
    #[error("version counter for lead {lead_id} overflowed")]
    VersionOverflow {
        /// The affected chain.
        lead_id: LeadId,
    },

    /// A stored row could not be converted into a domain value.
    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    /// Invalid paging parameters.
    #[error("invalid page request: {0}")]
    InvalidPage(String),
}

impl StoreError {
    /// Map a unique-constraint violation on insert to
    /// [`StoreError::DuplicateVersion`]; other errors pass through.
    pub(crate) fn from_insert(err: sqlx::Error, lead_id: &LeadId, version_number: i32) -> Self {
        let is_unique_violation = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNIQUE_VIOLATION);
        if is_unique_violation {
            Self::DuplicateVersion {
                lead_id: lead_id.clone(),
                version_number,
            }
        } else {
            Self::Postgres(err)
        }
    }
}
