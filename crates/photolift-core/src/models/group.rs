//! Photo groups: a fixed set of named slots, each holding one reference.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Semantic slot label inside a photo group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Front,
    Back,
    Left,
    Right,
    Side,
}

impl Slot {
    pub const ALL: [Slot; 5] = [Slot::Front, Slot::Back, Slot::Left, Slot::Right, Slot::Side];

    pub fn as_str(&self) -> &'static str {
        match self {
            Slot::Front => "front",
            Slot::Back => "back",
            Slot::Left => "left",
            Slot::Right => "right",
            Slot::Side => "side",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.as_str() == s)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key namespace identifying where a photo group came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    /// Group on the record's singleton sub-record.
    Singleton,
    /// Group on one of the record's child sub-records.
    Child,
}

impl Segment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Singleton => crate::config::RecordLayout::SINGLETON_SEGMENT,
            Segment::Child => crate::config::RecordLayout::CHILD_SEGMENT,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping of slot to reference.
///
/// A slot mapped to `None` was stored as null; an empty string is kept as
/// `Some("")` so write-back reproduces what was read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoGroup(BTreeMap<Slot, Option<String>>);

impl PhotoGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, slot: Slot, reference: impl Into<String>) -> Self {
        self.0.insert(slot, Some(reference.into()));
        self
    }

    pub fn insert(&mut self, slot: Slot, reference: Option<String>) {
        self.0.insert(slot, reference);
    }

    /// Reference stored in `slot`, `None` when absent or null.
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.0.get(&slot).and_then(|v| v.as_deref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Slot, Option<&str>)> {
        self.0.iter().map(|(slot, value)| (*slot, value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
