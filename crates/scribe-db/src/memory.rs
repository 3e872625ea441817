//! In-process record store.
//!
//! Mirrors the `PostgreSQL` stores with plain collections so the service can
//! run without a database and tests can exercise the versioning rules
//! without Docker. Each lead's chain sits behind its own mutex: appends to
//! one lead serialize, appends to different leads do not contend.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;
use scribe_types::{
    AnswerRecord, EmployeeId, LeadId, MeetingId, NewVersion, ParsedAnswers, RecordId,
    VersionedRecord,
};
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::repository::{Entity, Page, PageResult};
use crate::version_store::VersionRow;

/// One lead's version chain.
type Chain = Arc<Mutex<Vec<VersionedRecord>>>;

/// In-memory implementation of the version, answer and employee stores.
#[derive(Debug)]
pub struct MemoryStore {
    chains: RwLock<BTreeMap<LeadId, Chain>>,
    next_id: AtomicI64,
    employees: RwLock<BTreeMap<EmployeeId, String>>,
    meeting_answers: RwLock<BTreeMap<MeetingId, BTreeMap<u32, AnswerRecord>>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store. Record ids start at 1.
    pub fn new() -> Self {
        Self {
            chains: RwLock::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
            employees: RwLock::new(BTreeMap::new()),
            meeting_answers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register an employee name for creator lookups.
    #[must_use]
    pub fn with_employee(mut self, id: EmployeeId, name: impl Into<String>) -> Self {
        self.employees.get_mut().insert(id, name.into());
        self
    }

    /// Load records as-is, bypassing every chain check.
    ///
    /// Used to seed fixtures, including deliberately broken chains.
    pub async fn restore(&self, records: Vec<VersionedRecord>) {
        let mut max_id = 0_i64;
        for record in records {
            max_id = max_id.max(record.id.into_inner());
            let chain = self.chain(&record.lead_id).await;
            chain.lock().await.push(record);
        }
        self.next_id
            .fetch_max(max_id.saturating_add(1), Ordering::SeqCst);
    }

    /// Append a new version to the lead's chain and return it.
    ///
    /// All checks run before anything is mutated, so a failed append leaves
    /// the chain untouched.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Corruption`] if the chain already has two latest records.
    /// - [`StoreError::DuplicateVersion`] if the next version number is taken.
    /// - [`StoreError::VersionOverflow`] if the counter cannot advance.
    pub async fn insert_version(&self, new: &NewVersion) -> Result<VersionedRecord, StoreError> {
        let chain = self.chain(&new.lead_id).await;
        let mut records = chain.lock().await;

        let latest: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_latest)
            .map(|(i, _)| i)
            .collect();
        if latest.len() > 1 {
            return Err(StoreError::Corruption {
                lead_id: new.lead_id.clone(),
                latest_count: latest.len(),
            });
        }
        let previous = latest.first().copied();

        let (version_number, parent_id) = match previous.and_then(|i| records.get(i)) {
            Some(prev) => {
                let next = prev.version_number.checked_add(1).ok_or_else(|| {
                    StoreError::VersionOverflow {
                        lead_id: new.lead_id.clone(),
                    }
                })?;
                (next, Some(prev.id))
            }
            None => (1, None),
        };

        if records.iter().any(|r| r.version_number == version_number) {
            return Err(StoreError::DuplicateVersion {
                lead_id: new.lead_id.clone(),
                version_number,
            });
        }

        let now = Utc::now();
        if let Some(prev) = previous.and_then(|i| records.get_mut(i)) {
            prev.is_latest = false;
            prev.updated_by = Some(new.created_by);
            prev.updated_at = Some(now);
        }

        let record = VersionedRecord {
            id: RecordId(self.next_id.fetch_add(1, Ordering::SeqCst)),
            lead_id: new.lead_id.clone(),
            version_number,
            is_latest: true,
            parent_id,
            metadata: new.metadata.clone(),
            payload: new.payload.clone(),
            created_by: new.created_by,
            created_at: now,
            updated_by: None,
            updated_at: None,
        };
        records.push(record.clone());

        tracing::info!(
            lead_id = %record.lead_id,
            version = record.version_number,
            record_id = %record.id,
            "Inserted SOW version (memory)"
        );
        Ok(record)
    }

    /// Return the latest record of a lead's chain.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Corruption`] if more than one record is latest.
    pub async fn get_latest(&self, lead_id: &LeadId) -> Result<Option<VersionedRecord>, StoreError> {
        let Some(chain) = self.existing_chain(lead_id).await else {
            return Ok(None);
        };
        let records = chain.lock().await;
        let mut latest: Vec<&VersionedRecord> = records.iter().filter(|r| r.is_latest).collect();
        if latest.len() > 1 {
            return Err(StoreError::Corruption {
                lead_id: lead_id.clone(),
                latest_count: latest.len(),
            });
        }
        Ok(latest.pop().cloned())
    }

    /// Return every version of a lead's chain, newest first.
    pub async fn list_versions(&self, lead_id: &LeadId) -> Vec<VersionedRecord> {
        let Some(chain) = self.existing_chain(lead_id).await else {
            return Vec::new();
        };
        let mut records = chain.lock().await.clone();
        records.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        records
    }

    /// Fetch a single record by id.
    pub async fn get_version(&self, id: RecordId) -> Option<VersionedRecord> {
        for chain in self.all_chains().await {
            if let Some(found) = chain.lock().await.iter().find(|r| r.id == id) {
                return Some(found.clone());
            }
        }
        None
    }

    /// Page through all records across every lead.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidPage`] for bad paging parameters.
    pub async fn list_records(&self, page: &Page) -> Result<PageResult<VersionedRecord>, StoreError> {
        let (limit, offset) = page.limit_offset()?;
        let column = page.sort_column(VersionRow::COLUMNS, VersionRow::KEY);

        let mut all = Vec::new();
        for chain in self.all_chains().await {
            all.extend(chain.lock().await.iter().cloned());
        }
        all.sort_by(|a, b| {
            let ord = compare_by_column(column, a, b).then_with(|| a.id.cmp(&b.id));
            if page.descending { ord.reverse() } else { ord }
        });

        let total_count = i64::try_from(all.len()).unwrap_or(i64::MAX);
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        let items = all.into_iter().skip(skip).take(take).collect();
        Ok(PageResult { items, total_count })
    }

    /// Look up an employee's display name.
    pub async fn employee_name(&self, id: EmployeeId) -> Option<String> {
        self.employees.read().await.get(&id).cloned()
    }

    /// Upsert every answer of a meeting. Returns the number of answers written.
    pub async fn save_meeting_answers(&self, parsed: &ParsedAnswers) -> u64 {
        let mut meetings = self.meeting_answers.write().await;
        let stored = meetings.entry(parsed.meeting_id.clone()).or_default();
        for record in &parsed.answers {
            stored.insert(record.question_number, record.clone());
        }
        u64::try_from(parsed.answers.len()).unwrap_or(u64::MAX)
    }

    /// Return all stored answers of a meeting, ordered by question number.
    pub async fn meeting_answers(&self, meeting_id: &MeetingId) -> Vec<AnswerRecord> {
        self.meeting_answers
            .read()
            .await
            .get(meeting_id)
            .map(|stored| stored.values().cloned().collect())
            .unwrap_or_default()
    }

    async fn chain(&self, lead_id: &LeadId) -> Chain {
        if let Some(chain) = self.existing_chain(lead_id).await {
            return chain;
        }
        let mut chains = self.chains.write().await;
        Arc::clone(chains.entry(lead_id.clone()).or_default())
    }

    async fn existing_chain(&self, lead_id: &LeadId) -> Option<Chain> {
        self.chains.read().await.get(lead_id).map(Arc::clone)
    }

    async fn all_chains(&self) -> Vec<Chain> {
        self.chains.read().await.values().map(Arc::clone).collect()
    }
}

/// Order two records by one of the `sow_versions` columns.
fn compare_by_column(column: &str, a: &VersionedRecord, b: &VersionedRecord) -> core::cmp::Ordering {
    match column {
        "lead_id" => a.lead_id.cmp(&b.lead_id),
        "version_number" => a.version_number.cmp(&b.version_number),
        "is_latest" => a.is_latest.cmp(&b.is_latest),
        "parent_sow_id" => a.parent_id.cmp(&b.parent_id),
        "sow_template_reference_number" => {
            a.metadata.reference_number.cmp(&b.metadata.reference_number)
        }
        "meeting_id" => a.metadata.meeting_id.cmp(&b.metadata.meeting_id),
        "lead_name" => a.metadata.lead_name.cmp(&b.metadata.lead_name),
        "organization_id" => a.metadata.organization_id.cmp(&b.metadata.organization_id),
        "organization_name" => a.metadata.organization_name.cmp(&b.metadata.organization_name),
        "created_by" => a.created_by.cmp(&b.created_by),
        "created_at" => a.created_at.cmp(&b.created_at),
        "updated_by" => a.updated_by.cmp(&b.updated_by),
        "updated_at" => a.updated_at.cmp(&b.updated_at),
        _ => a.id.cmp(&b.id),
    }
}
