//! Records and the sub-records that carry photo groups.

use super::{PhotoGroup, Segment};
use std::fmt;

/// Opaque identifier of a top-level record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Address of a sub-record inside the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubRecordRef {
    /// Owning top-level record.
    pub owner: RecordId,
    /// Singleton or child.
    pub segment: Segment,
    /// Document path relative to the database root,
    /// e.g. `clients/abc/checks/xyz`.
    pub path: String,
}

impl fmt::Display for SubRecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// The photo-group field of a sub-record as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupField {
    /// The sub-record has no photo group.
    Absent,
    Present(PhotoGroup),
    /// The field exists but does not fit the slot schema.
    Invalid(String),
}

/// A sub-record as read from the document store.
#[derive(Debug, Clone, PartialEq)]
pub struct SubRecord {
    pub reference: SubRecordRef,
    pub group: GroupField,
}
