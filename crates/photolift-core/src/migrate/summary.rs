//! Run-wide counters.

use super::Mode;
use serde::Serialize;
use std::fmt;

/// Counters for one record's traversal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecordReport {
    pub singleton_updated: u64,
    pub child_updated: u64,
    pub fields_migrated: u64,
    pub field_errors: u64,
    /// Sub-records that could not be read, decoded or persisted.
    pub record_errors: u64,
}

/// Aggregate counts for a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: Mode,
    pub records: u64,
    pub singleton_updated: u64,
    pub child_updated: u64,
    pub fields_migrated: u64,
    pub field_errors: u64,
    pub record_errors: u64,
}

impl RunSummary {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            records: 0,
            singleton_updated: 0,
            child_updated: 0,
            fields_migrated: 0,
            field_errors: 0,
            record_errors: 0,
        }
    }

    /// Fold one visited record into the totals.
    pub fn absorb(&mut self, report: RecordReport) {
        self.records += 1;
        self.singleton_updated += report.singleton_updated;
        self.child_updated += report.child_updated;
        self.fields_migrated += report.fields_migrated;
        self.field_errors += report.field_errors;
        self.record_errors += report.record_errors;
    }

    /// Counters only, ignoring the mode.
    pub fn counts(&self) -> [u64; 6] {
        [
            self.records,
            self.singleton_updated,
            self.child_updated,
            self.fields_migrated,
            self.field_errors,
            self.record_errors,
        ]
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: [(&str, String); 7] = [
            ("Records", self.records.to_string()),
            ("SingletonDocsUpdated", self.singleton_updated.to_string()),
            ("ChildDocsUpdated", self.child_updated.to_string()),
            ("FilesMigrated", self.fields_migrated.to_string()),
            ("Errors", self.field_errors.to_string()),
            ("RecordErrors", self.record_errors.to_string()),
            ("Mode", self.mode.summary_label().to_string()),
        ];
        let width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in rows {
            writeln!(f, "  {:<width$}  {}", key, value, width = width)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb_accumulates() {
        let mut summary = RunSummary::new(Mode::Execute);
        summary.absorb(RecordReport {
            singleton_updated: 1,
            child_updated: 2,
            fields_migrated: 4,
            field_errors: 1,
            record_errors: 0,
        });
        summary.absorb(RecordReport::default());
        assert_eq!(summary.counts(), [2, 1, 2, 4, 1, 0]);
    }

    #[test]
    fn test_display_table() {
        let summary = RunSummary::new(Mode::DryRun);
        let rendered = summary.to_string();
        assert!(rendered.contains("FilesMigrated"));
        assert!(rendered.lines().last().unwrap().ends_with("DRY"));
        assert_eq!(rendered.lines().count(), 7);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(RunSummary::new(Mode::Execute)).unwrap();
        assert_eq!(json["mode"], "execute");
        assert_eq!(json["fields_migrated"], 0);
    }
}
