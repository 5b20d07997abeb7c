//! Per-group migration: classify, fetch and upload every slot of a group.
//!
//! Failures are isolated at the slot boundary. A slot that cannot be fetched
//! or uploaded keeps its legacy value and is reported as an error; the other
//! slots carry on.

use super::Mode;
use crate::classify::{Classification, Classifier, LegacyRef};
use crate::models::{PhotoGroup, RecordId, Segment, Slot};
use crate::storage::{KeyGenerator, LegacySource, TargetSink};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Marker prepended to placeholder URLs produced in dry-run mode.
pub const DRY_RUN_MARKER: &str = "(dry) ";

/// What happened to one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStatus {
    SkipEmpty,
    SkipAlreadyMigrated,
    Migrated { from: String, to: String },
    Error { from: String, message: String },
}

impl FieldStatus {
    pub fn label(&self) -> &'static str {
        match self {
            FieldStatus::SkipEmpty => "skip-empty",
            FieldStatus::SkipAlreadyMigrated => "skip-already-migrated",
            FieldStatus::Migrated { .. } => "migrated",
            FieldStatus::Error { .. } => "error",
        }
    }
}

/// Outcome for one slot of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldOutcome {
    pub slot: Slot,
    pub status: FieldStatus,
}

/// Result of migrating one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    /// Input group with migrated slots overwritten.
    pub updated: PhotoGroup,
    /// Whether any slot was migrated.
    pub changed: bool,
    /// One outcome per slot, in slot order.
    pub outcomes: Vec<FieldOutcome>,
}

impl GroupResult {
    pub fn migrated_count(&self) -> u64 {
        self.count(|s| matches!(s, FieldStatus::Migrated { .. }))
    }

    pub fn error_count(&self) -> u64 {
        self.count(|s| matches!(s, FieldStatus::Error { .. }))
    }

    fn count(&self, pred: impl Fn(&FieldStatus) -> bool) -> u64 {
        self.outcomes.iter().filter(|o| pred(&o.status)).count() as u64
    }
}

/// Applies classify → fetch → upload to every slot of a group.
pub struct GroupMigrator {
    source: Arc<dyn LegacySource>,
    sink: Arc<dyn TargetSink>,
    classifier: Classifier,
    keys: KeyGenerator,
    mode: Mode,
    verbose: bool,
}

impl GroupMigrator {
    pub fn new(source: Arc<dyn LegacySource>, sink: Arc<dyn TargetSink>, mode: Mode) -> Self {
        let classifier = Classifier::new(sink.public_base());
        Self {
            source,
            sink,
            classifier,
            keys: KeyGenerator::new(),
            mode,
            verbose: false,
        }
    }

    /// Log every migrated slot at info level instead of debug.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub async fn migrate_group(
        &self,
        group: &PhotoGroup,
        owner: &RecordId,
        segment: Segment,
    ) -> GroupResult {
        let mut updated = group.clone();
        let mut changed = false;
        let mut outcomes = Vec::with_capacity(group.len());

        for (slot, value) in group.iter() {
            let status = match self.classifier.classify(value) {
                Classification::Empty => FieldStatus::SkipEmpty,
                Classification::AlreadyMigrated => FieldStatus::SkipAlreadyMigrated,
                Classification::Legacy(reference) => {
                    match self.transfer(&reference, owner, segment, slot).await {
                        Ok(url) => {
                            if self.verbose {
                                info!("  [{}] {} migrated -> {}", segment, slot, url);
                            } else {
                                debug!("[{}] {} migrated -> {}", segment, slot, url);
                            }
                            updated.insert(slot, Some(url.clone()));
                            changed = true;
                            FieldStatus::Migrated {
                                from: reference.as_str().to_string(),
                                to: url,
                            }
                        }
                        Err(e) => {
                            error!(
                                "  ERROR migrating {}/{} for record {}: {}",
                                segment, slot, owner, e
                            );
                            FieldStatus::Error {
                                from: reference.as_str().to_string(),
                                message: e.to_string(),
                            }
                        }
                    }
                }
            };
            outcomes.push(FieldOutcome { slot, status });
        }

        GroupResult {
            updated,
            changed,
            outcomes,
        }
    }

    /// Fetch one legacy asset and place it in the target store.
    ///
    /// Dry runs still fetch, so download failures surface, but only
    /// synthesize the URL the upload would have produced.
    async fn transfer(
        &self,
        reference: &LegacyRef,
        owner: &RecordId,
        segment: Segment,
        slot: Slot,
    ) -> Result<String> {
        let asset = self.source.fetch(reference).await?;
        let key = self
            .keys
            .next_key(segment, owner, slot, &asset.content_type);

        match self.mode {
            Mode::DryRun => Ok(format!(
                "{}{}/{}",
                DRY_RUN_MARKER,
                self.classifier.target_public_base(),
                key
            )),
            Mode::Execute => self.sink.upload(&asset, &key).await,
        }
    }
}
