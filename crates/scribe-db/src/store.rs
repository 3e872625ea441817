//! Backend-agnostic record store handle.
//!
//! Async fns in traits are not object-safe, so the backends are dispatched
//! through an enum. Handlers hold one [`RecordStore`] and never see which
//! backend is behind it.

use std::sync::Arc;

use scribe_types::{
    AnswerRecord, EmployeeId, LeadId, MeetingId, NewVersion, ParsedAnswers, RecordId,
    VersionedRecord,
};

use crate::answer_store::MeetingAnswerStore;
use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::postgres::PostgresPool;
use crate::repository::{EmployeeRow, Page, PageResult, Repository};
use crate::version_store::VersionStore;

/// Name used when a creator id does not resolve to an employee.
pub const UNKNOWN_EMPLOYEE: &str = "Unknown";

/// A record store backed by `PostgreSQL` or by process memory.
#[derive(Clone)]
pub enum RecordStore {
    /// Durable storage.
    Postgres(PostgresPool),
    /// Volatile storage for local runs and tests.
    Memory(Arc<MemoryStore>),
}

impl RecordStore {
    /// Wrap a fresh, empty in-memory store.
    pub fn memory() -> Self {
        Self::Memory(Arc::new(MemoryStore::new()))
    }

    /// Short backend name for logs and health output.
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Postgres(_) => "postgres",
            Self::Memory(_) => "memory",
        }
    }

    /// Check that the backend can serve requests.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Postgres`] if the database cannot be reached.
    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            Self::Postgres(pg) => pg.ping().await,
            Self::Memory(_) => Ok(()),
        }
    }

    /// Append a new version to the lead's chain.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`StoreError`].
    pub async fn insert_version(&self, new: &NewVersion) -> Result<VersionedRecord, StoreError> {
        match self {
            Self::Postgres(pg) => VersionStore::new(pg.pool()).insert_version(new).await,
            Self::Memory(mem) => mem.insert_version(new).await,
        }
    }

    /// Return the latest version of a lead, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corruption`] if the chain has several latest
    /// records, or the backend's query error.
    pub async fn get_latest(&self, lead_id: &LeadId) -> Result<Option<VersionedRecord>, StoreError> {
        match self {
            Self::Postgres(pg) => VersionStore::new(pg.pool()).get_latest(lead_id).await,
            Self::Memory(mem) => mem.get_latest(lead_id).await,
        }
    }

    /// Return a single record by id.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`StoreError`].
    pub async fn get_version(&self, id: RecordId) -> Result<Option<VersionedRecord>, StoreError> {
        match self {
            Self::Postgres(pg) => VersionStore::new(pg.pool()).get_version(id).await,
            Self::Memory(mem) => Ok(mem.get_version(id).await),
        }
    }

    /// Return every version of a lead, newest first.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`StoreError`].
    pub async fn list_versions(&self, lead_id: &LeadId) -> Result<Vec<VersionedRecord>, StoreError> {
        match self {
            Self::Postgres(pg) => VersionStore::new(pg.pool()).list_versions(lead_id).await,
            Self::Memory(mem) => Ok(mem.list_versions(lead_id).await),
        }
    }

    /// Page through all records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPage`] for bad paging parameters, or the
    /// backend's query error.
    pub async fn list_records(&self, page: &Page) -> Result<PageResult<VersionedRecord>, StoreError> {
        match self {
            Self::Postgres(pg) => VersionStore::new(pg.pool()).list_records(page).await,
            Self::Memory(mem) => mem.list_records(page).await,
        }
    }

    /// Resolve an employee's display name, falling back to
    /// [`UNKNOWN_EMPLOYEE`] when the id is unknown or the lookup fails.
    pub async fn creator_name(&self, id: EmployeeId) -> String {
        let found = match self {
            Self::Postgres(pg) => Repository::<EmployeeRow>::new(pg.pool())
                .fetch_by_key(id.into_inner())
                .await
                .map(|row| row.map(|r| r.employee_name)),
            Self::Memory(mem) => Ok(mem.employee_name(id).await),
        };
        match found {
            Ok(Some(name)) => name,
            Ok(None) => {
                tracing::warn!(employee_id = %id, "employee not found");
                String::from(UNKNOWN_EMPLOYEE)
            }
            Err(e) => {
                tracing::warn!(employee_id = %id, error = %e, "employee lookup failed");
                String::from(UNKNOWN_EMPLOYEE)
            }
        }
    }

    /// Persist the normalized answers of one meeting.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`StoreError`].
    pub async fn save_meeting_answers(&self, parsed: &ParsedAnswers) -> Result<u64, StoreError> {
        match self {
            Self::Postgres(pg) => MeetingAnswerStore::new(pg.pool()).save(parsed).await,
            Self::Memory(mem) => Ok(mem.save_meeting_answers(parsed).await),
        }
    }

    /// Return the stored answers of one meeting.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`StoreError`].
    pub async fn meeting_answers(&self, meeting_id: &MeetingId) -> Result<Vec<AnswerRecord>, StoreError> {
        match self {
            Self::Postgres(pg) => MeetingAnswerStore::new(pg.pool()).get(meeting_id).await,
            Self::Memory(mem) => Ok(mem.meeting_answers(meeting_id).await),
        }
    }
}
