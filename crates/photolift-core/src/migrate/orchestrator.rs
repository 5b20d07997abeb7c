//! Run orchestration: authenticate, enumerate, process, summarize.

use super::group::GroupMigrator;
use super::summary::RunSummary;
use super::traversal::TraversalController;
use super::Mode;
use crate::config::MigrationConfig;
use crate::docstore::{DocumentStore, FirestoreStore};
use crate::network::HttpClient;
use crate::storage::{FirebaseStorageSource, LegacySource, R2Sink, TargetSink};
use crate::{MigrateError, Result};
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Stages of a run. Sign-in and enumeration failures end a run early, as
/// does a fatal error while processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Authenticating,
    Enumerating,
    Processing,
    Summarizing,
    Complete(Mode),
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Authenticating => f.write_str("authenticating"),
            RunPhase::Enumerating => f.write_str("enumerating"),
            RunPhase::Processing => f.write_str("processing"),
            RunPhase::Summarizing => f.write_str("summarizing"),
            RunPhase::Complete(Mode::DryRun) => f.write_str("dry-run complete"),
            RunPhase::Complete(Mode::Execute) => f.write_str("execute complete"),
        }
    }
}

/// Options fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub mode: Mode,
    pub verbose: bool,
    /// Records processed at once; 1 is a strictly sequential pass.
    pub concurrency: usize,
}

impl RunOptions {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            verbose: false,
            concurrency: 1,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

/// Drives one bounded pass over every record.
pub struct Orchestrator {
    store: Arc<dyn DocumentStore>,
    traversal: TraversalController,
    options: RunOptions,
}

impl Orchestrator {
    /// Wire an orchestrator from explicit collaborators.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        source: Arc<dyn LegacySource>,
        sink: Arc<dyn TargetSink>,
        options: RunOptions,
    ) -> Self {
        let migrator = GroupMigrator::new(source, sink, options.mode).with_verbose(options.verbose);
        let traversal =
            TraversalController::new(store.clone(), migrator).with_verbose(options.verbose);
        Self {
            store,
            traversal,
            options,
        }
    }

    /// Wire an orchestrator against Firestore, Firebase Storage and R2.
    pub fn from_config(config: &MigrationConfig, options: RunOptions) -> Result<Self> {
        let http = HttpClient::new()?;
        let store = FirestoreStore::new(http.clone(), config.database.clone());
        let source = FirebaseStorageSource::new(http.clone(), config.legacy.bucket.clone());
        let sink = R2Sink::new(http, &config.target)?;
        Ok(Self::new(
            Arc::new(store),
            Arc::new(source),
            Arc::new(sink),
            options,
        ))
    }

    /// Run to completion.
    ///
    /// Returns `Err` only for fatal failures: sign-in, enumeration, or a
    /// session lost mid-run. Field- and record-level failures are counted in
    /// the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        let mode = self.options.mode;
        info!("=== Legacy -> target photo migration ({}) ===", mode);

        enter(RunPhase::Authenticating);
        self.store.authenticate().await.map_err(|e| match e {
            MigrateError::Auth { .. } => e,
            other => MigrateError::Auth {
                message: other.to_string(),
            },
        })?;
        info!("Auth OK");

        enter(RunPhase::Enumerating);
        let records = self.store.list_records().await?;
        info!("Found {} records.", records.len());

        enter(RunPhase::Processing);
        let mut summary = RunSummary::new(mode);
        let mut reports = stream::iter(records.iter())
            .map(|record| self.traversal.process_record(record))
            .buffer_unordered(self.options.concurrency.max(1));
        while let Some(report) = reports.next().await {
            summary.absorb(report?);
        }

        enter(RunPhase::Summarizing);
        info!(
            "Visited {} records: {} files migrated, {} field errors, {} record errors",
            summary.records, summary.fields_migrated, summary.field_errors, summary.record_errors
        );

        enter(RunPhase::Complete(mode));
        Ok(summary)
    }
}

fn enter(phase: RunPhase) {
    tracing::debug!("phase: {}", phase);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_labels() {
        assert_eq!(RunPhase::Complete(Mode::DryRun).to_string(), "dry-run complete");
        assert_eq!(RunPhase::Complete(Mode::Execute).to_string(), "execute complete");
        assert_eq!(RunPhase::Authenticating.to_string(), "authenticating");
    }

    #[test]
    fn test_concurrency_floor() {
        let options = RunOptions::new(Mode::Execute).with_concurrency(0);
        assert_eq!(options.concurrency, 1);
    }
}
