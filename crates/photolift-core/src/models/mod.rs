//! Domain types shared across the engine.

mod group;
mod record;

pub use group::{PhotoGroup, Segment, Slot};
pub use record::{GroupField, RecordId, SubRecord, SubRecordRef};
