//! Record traversal: find every photo group under a record, migrate it and
//! persist the result.
//!
//! A failure to read, decode or persist one sub-record is logged and
//! counted, and traversal moves on to the next sub-record. Fatal errors,
//! such as a session that can no longer be renewed, end the traversal.

use super::group::GroupMigrator;
use super::summary::RecordReport;
use super::Mode;
use crate::docstore::DocumentStore;
use crate::models::{GroupField, RecordId, Segment, SubRecord};
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct TraversalController {
    store: Arc<dyn DocumentStore>,
    migrator: GroupMigrator,
    verbose: bool,
}

impl TraversalController {
    pub fn new(store: Arc<dyn DocumentStore>, migrator: GroupMigrator) -> Self {
        Self {
            store,
            migrator,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Migrate the singleton and every child of one record.
    ///
    /// Returns `Err` only for errors that are fatal to the whole run.
    pub async fn process_record(&self, record: &RecordId) -> Result<RecordReport> {
        let mut report = RecordReport::default();
        if self.verbose {
            info!("--- Record {} ---", record);
        }

        match self.store.get_singleton(record).await {
            Ok(Some(sub)) => self.process_sub_record(&sub, &mut report).await?,
            Ok(None) => debug!("Record {} has no singleton sub-record", record),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Failed to read singleton of record {}: {}", record, e);
                report.record_errors += 1;
            }
        }

        match self.store.list_children(record).await {
            Ok(children) => {
                for child in &children {
                    self.process_sub_record(child, &mut report).await?;
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!("Failed to list children of record {}: {}", record, e);
                report.record_errors += 1;
            }
        }

        Ok(report)
    }

    async fn process_sub_record(&self, sub: &SubRecord, report: &mut RecordReport) -> Result<()> {
        let target = &sub.reference;
        let group = match &sub.group {
            GroupField::Present(group) => group,
            GroupField::Absent => return Ok(()),
            GroupField::Invalid(reason) => {
                warn!("Skipping {}: unexpected photo group shape: {}", target, reason);
                report.record_errors += 1;
                return Ok(());
            }
        };

        let result = self
            .migrator
            .migrate_group(group, &target.owner, target.segment)
            .await;
        report.fields_migrated += result.migrated_count();
        report.field_errors += result.error_count();

        if !result.changed {
            return Ok(());
        }

        if self.migrator.mode() == Mode::Execute {
            match self
                .store
                .update_group(target, &result.updated, Utc::now())
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!("Failed to persist {}: {}", target, e);
                    report.record_errors += 1;
                    return Ok(());
                }
            }
        }

        match target.segment {
            Segment::Singleton => report.singleton_updated += 1,
            Segment::Child => report.child_updated += 1,
        }
        Ok(())
    }
}
