//! Versioned SOW records and the inputs used to create them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{EmployeeId, LeadId, MeetingId, OrganizationId, RecordId};

/// Metadata denormalized onto every SOW version at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SowMetadata {
    /// Free-text template reference the SOW was filled against.
    pub reference_number: String,
    /// Meeting the answers were captured in.
    #[ts(type = "string")]
    pub meeting_id: MeetingId,
    /// Lead display name.
    pub lead_name: String,
    /// Owning organization.
    #[ts(type = "number")]
    pub organization_id: OrganizationId,
    /// Owning organization display name.
    pub organization_name: String,
}

/// Everything needed to append a new version to a lead's chain.
///
/// The store assigns `id`, `version_number`, `is_latest`, `parent_id` and
/// `created_at`; callers never choose them.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVersion {
    /// Chain the version is appended to.
    pub lead_id: LeadId,
    /// Denormalized metadata.
    pub metadata: SowMetadata,
    /// The full answer set as submitted.
    pub payload: serde_json::Value,
    /// Employee who submitted this version.
    pub created_by: EmployeeId,
}

/// One immutable snapshot of a lead's SOW payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VersionedRecord {
    /// Store-assigned unique id.
    #[ts(type = "number")]
    pub id: RecordId,
    /// Chain this record belongs to.
    #[ts(type = "string")]
    pub lead_id: LeadId,
    /// 1-based position within the chain.
    pub version_number: i32,
    /// Whether this is the current version of the chain.
    pub is_latest: bool,
    /// The record that was latest immediately before this one.
    #[ts(type = "number | null")]
    pub parent_id: Option<RecordId>,
    /// Denormalized metadata.
    #[serde(flatten)]
    pub metadata: SowMetadata,
    /// The full answer set as submitted.
    pub payload: serde_json::Value,
    /// Employee who submitted this version.
    #[ts(type = "number")]
    pub created_by: EmployeeId,
    /// When this version was written.
    pub created_at: DateTime<Utc>,
    /// Last employee to touch the record, if any.
    #[ts(type = "number | null")]
    pub updated_by: Option<EmployeeId>,
    /// When the record was last touched, if ever.
    pub updated_at: Option<DateTime<Utc>>,
}

/// Confirmation returned to the caller after a successful store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StoreReceipt {
    /// Human-readable confirmation.
    pub message: String,
    /// Chain the version was appended to.
    #[ts(type = "string")]
    pub lead_id: LeadId,
    /// Version number that was assigned.
    pub version_number: i32,
    /// Id of the newly written record.
    #[ts(type = "number")]
    pub record_id: RecordId,
}

impl StoreReceipt {
    /// Build the receipt for a freshly inserted record.
    pub fn for_record(record: &VersionedRecord) -> Self {
        Self {
            message: format!(
                "SOW JSON stored for lead_id {} under reference {} as version {}.",
                record.lead_id, record.metadata.reference_number, record.version_number
            ),
            lead_id: record.lead_id.clone(),
            version_number: record.version_number,
            record_id: record.id,
        }
    }
}
