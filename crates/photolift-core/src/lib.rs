//! Photolift Core - one-way photo migration between blob stores.
//!
//! Walks every record in a document database, finds the photo groups on its
//! singleton and child sub-records, copies each legacy asset to the target
//! store and rewrites the stored reference. Already-migrated references are
//! recognised and skipped, so a run can be repeated safely.
//!
//! # Example
//!
//! ```rust,ignore
//! use photolift_core::{MigrationConfig, Mode, Orchestrator, RunOptions};
//!
//! #[tokio::main]
//! async fn main() -> photolift_core::Result<()> {
//!     let config = MigrationConfig::from_env()?;
//!     let orchestrator = Orchestrator::from_config(&config, RunOptions::new(Mode::DryRun))?;
//!
//!     let summary = orchestrator.run().await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod docstore;
pub mod error;
pub mod migrate;
pub mod models;
pub mod network;
pub mod storage;

// Re-export commonly used types
pub use classify::{classify, Classification, Classifier, LegacyRef};
pub use config::MigrationConfig;
pub use docstore::{DocumentStore, FirestoreStore};
pub use error::{MigrateError, Result};
pub use migrate::{
    FieldOutcome, FieldStatus, GroupMigrator, GroupResult, Mode, Orchestrator, RecordReport,
    RunOptions, RunPhase, RunSummary, TraversalController, DRY_RUN_MARKER,
};
pub use models::{GroupField, PhotoGroup, RecordId, Segment, Slot, SubRecord, SubRecordRef};
pub use storage::{FetchedAsset, FirebaseStorageSource, LegacySource, R2Sink, TargetSink};
