//! Document database access.
//!
//! [`DocumentStore`] is the only view the engine has of the database: it
//! enumerates records, reads the sub-records that may carry photo groups and
//! writes migrated groups back.

mod firestore;
mod wire;

pub use firestore::FirestoreStore;

use crate::models::{PhotoGroup, RecordId, SubRecord, SubRecordRef};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Record-oriented access to the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Establish a privileged session. Failure is fatal to the run.
    async fn authenticate(&self) -> Result<()>;

    /// Every top-level record.
    async fn list_records(&self) -> Result<Vec<RecordId>>;

    /// The record's singleton sub-record, if it exists.
    async fn get_singleton(&self, record: &RecordId) -> Result<Option<SubRecord>>;

    /// Every child sub-record of the record.
    async fn list_children(&self, record: &RecordId) -> Result<Vec<SubRecord>>;

    /// Merge the migrated group and a migration timestamp onto an existing
    /// sub-record, leaving its other fields untouched.
    async fn update_group(
        &self,
        target: &SubRecordRef,
        group: &PhotoGroup,
        migrated_at: DateTime<Utc>,
    ) -> Result<()>;
}
