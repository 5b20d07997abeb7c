//! The migration engine.
//!
//! Layers, innermost first:
//! - [`GroupMigrator`]: one photo group, slot by slot
//! - [`TraversalController`]: one record, its singleton and children
//! - [`Orchestrator`]: the whole run, from sign-in to summary

mod group;
mod orchestrator;
mod summary;
mod traversal;

pub use group::{FieldOutcome, FieldStatus, GroupMigrator, GroupResult, DRY_RUN_MARKER};
pub use orchestrator::{Orchestrator, RunOptions, RunPhase};
pub use summary::{RecordReport, RunSummary};
pub use traversal::TraversalController;

use serde::Serialize;
use std::fmt;

/// Whether the run writes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Classify and fetch, synthesize target URLs, write nothing.
    DryRun,
    /// Upload and persist.
    Execute,
}

impl Mode {
    pub fn summary_label(&self) -> &'static str {
        match self {
            Mode::DryRun => "DRY",
            Mode::Execute => "EXECUTED",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::DryRun => f.write_str("DRY RUN"),
            Mode::Execute => f.write_str("EXECUTION"),
        }
    }
}
