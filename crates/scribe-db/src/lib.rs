//! Data layer for the Scribe SOW service.
//!
//! Every SOW submission becomes an immutable record in a per-lead version
//! chain. The store owns version numbering and the single-latest marker;
//! callers only hand in the payload and metadata.
//!
//! # Architecture
//!
//! ```text
//! RecordStore
//!     |
//!     +-- Postgres(PostgresPool)
//!     |     |-- VersionStore        (sow_versions chain)
//!     |     |-- MeetingAnswerStore  (meeting_answers upsert)
//!     |     +-- Repository<E>       (keyed lookups, paging)
//!     |
//!     +-- Memory(MemoryStore)       (same rules, no database)
//! ```
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`version_store`] -- Transactional version chain writes and reads
//! - [`answer_store`] -- Meeting answer persistence
//! - [`repository`] -- Generic keyed reads and paging
//! - [`memory`] -- In-process backend
//! - [`store`] -- Backend dispatch
//! - [`error`] -- Shared error types

pub mod answer_store;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod version_store;

// Re-export primary types for convenience.
pub use answer_store::{MeetingAnswerRow, MeetingAnswerStore};
pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgres::{PostgresConfig, PostgresPool};
pub use repository::{
    DEFAULT_PAGE_LIMIT, EmployeeRow, Entity, MAX_PAGE_LIMIT, Page, PageResult, Repository,
};
pub use store::{RecordStore, UNKNOWN_EMPLOYEE};
pub use version_store::{VersionRow, VersionStore};
