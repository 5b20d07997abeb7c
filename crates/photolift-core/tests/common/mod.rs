//! In-memory stores for exercising the engine without a network.

#![allow(dead_code)]

pub mod stub;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use photolift_core::{
    DocumentStore, FetchedAsset, GroupField, LegacyRef, LegacySource, MigrateError, PhotoGroup,
    RecordId, Result, Segment, SubRecord, SubRecordRef, TargetSink,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

pub const PUBLIC_BASE: &str = "https://target.example/pub";

#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    pub singleton: Option<GroupField>,
    pub children: Vec<(String, GroupField)>,
}

/// Document store backed by a map; updates are applied in place.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<RecordId, MemoryRecord>>,
    updates: Mutex<Vec<(SubRecordRef, PhotoGroup)>>,
    failing_updates: HashSet<String>,
    reject_auth: bool,
    fail_enumeration: bool,
    session_lost_at: Option<RecordId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(self, id: &str, record: MemoryRecord) -> Self {
        self.records.lock().unwrap().insert(RecordId::from(id), record);
        self
    }

    pub fn rejecting_auth(mut self) -> Self {
        self.reject_auth = true;
        self
    }

    pub fn failing_enumeration(mut self) -> Self {
        self.fail_enumeration = true;
        self
    }

    /// Fail every read from record `id` onwards as if the session could not
    /// be renewed.
    pub fn losing_session_at(mut self, id: &str) -> Self {
        self.session_lost_at = Some(RecordId::from(id));
        self
    }

    fn check_session(&self, record: &RecordId) -> Result<()> {
        match &self.session_lost_at {
            Some(lost) if record >= lost => Err(MigrateError::Auth {
                message: "TOKEN_EXPIRED".to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Make `update_group` fail for the sub-record at `path`.
    pub fn failing_update(mut self, path: &str) -> Self {
        self.failing_updates.insert(path.to_string());
        self
    }

    pub fn updates(&self) -> Vec<(SubRecordRef, PhotoGroup)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn record(&self, id: &str) -> MemoryRecord {
        self.records.lock().unwrap()[&RecordId::from(id)].clone()
    }

    fn singleton_path(record: &RecordId) -> String {
        format!("clients/{}/anamnesi/initial", record)
    }

    fn child_path(record: &RecordId, child: &str) -> String {
        format!("clients/{}/checks/{}", record, child)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn authenticate(&self) -> Result<()> {
        if self.reject_auth {
            return Err(MigrateError::Auth {
                message: "INVALID_PASSWORD".to_string(),
            });
        }
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<RecordId>> {
        if self.fail_enumeration {
            return Err(MigrateError::Database {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(self.records.lock().unwrap().keys().cloned().collect())
    }

    async fn get_singleton(&self, record: &RecordId) -> Result<Option<SubRecord>> {
        self.check_session(record)?;
        let records = self.records.lock().unwrap();
        Ok(records
            .get(record)
            .and_then(|r| r.singleton.clone())
            .map(|group| SubRecord {
                reference: SubRecordRef {
                    owner: record.clone(),
                    segment: Segment::Singleton,
                    path: Self::singleton_path(record),
                },
                group,
            }))
    }

    async fn list_children(&self, record: &RecordId) -> Result<Vec<SubRecord>> {
        let records = self.records.lock().unwrap();
        let children = records.get(record).map(|r| r.children.clone()).unwrap_or_default();
        Ok(children
            .into_iter()
            .map(|(id, group)| SubRecord {
                reference: SubRecordRef {
                    owner: record.clone(),
                    segment: Segment::Child,
                    path: Self::child_path(record, &id),
                },
                group,
            })
            .collect())
    }

    async fn update_group(
        &self,
        target: &SubRecordRef,
        group: &PhotoGroup,
        _migrated_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.failing_updates.contains(&target.path) {
            return Err(MigrateError::Database {
                status: 403,
                message: "PERMISSION_DENIED".to_string(),
            });
        }

        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&target.owner)
            .ok_or_else(|| MigrateError::Other(format!("no record {}", target.owner)))?;
        let updated = GroupField::Present(group.clone());
        match target.segment {
            Segment::Singleton => record.singleton = Some(updated),
            Segment::Child => {
                let id = target.path.rsplit('/').next().unwrap_or_default();
                if let Some(slot) = record.children.iter_mut().find(|(c, _)| c == id) {
                    slot.1 = updated;
                }
            }
        }
        self.updates
            .lock()
            .unwrap()
            .push((target.clone(), group.clone()));
        Ok(())
    }
}

/// Legacy store that serves any reference unless told to fail it.
#[derive(Debug, Default)]
pub struct MemorySource {
    failures: HashMap<String, u16>,
    fetched: Mutex<Vec<String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `status` for the reference `reference`.
    pub fn failing(mut self, reference: &str, status: u16) -> Self {
        self.failures.insert(reference.to_string(), status);
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl LegacySource for MemorySource {
    async fn fetch(&self, reference: &LegacyRef) -> Result<FetchedAsset> {
        self.fetched
            .lock()
            .unwrap()
            .push(reference.as_str().to_string());
        if let Some(status) = self.failures.get(reference.as_str()) {
            return Err(MigrateError::DownloadFailed { status: *status });
        }
        Ok(FetchedAsset {
            bytes: Bytes::from(reference.as_str().as_bytes().to_vec()),
            content_type: "image/jpeg".to_string(),
        })
    }
}

/// Target store that records uploaded keys.
#[derive(Debug, Default)]
pub struct MemorySink {
    uploads: Mutex<Vec<String>>,
    reject_uploads: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(mut self) -> Self {
        self.reject_uploads = true;
        self
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl TargetSink for MemorySink {
    fn public_base(&self) -> &str {
        PUBLIC_BASE
    }

    async fn upload(&self, _asset: &FetchedAsset, key: &str) -> Result<String> {
        if self.reject_uploads {
            return Err(MigrateError::UploadFailed {
                key: key.to_string(),
                status: Some(403),
                message: "AccessDenied".to_string(),
            });
        }
        self.uploads.lock().unwrap().push(key.to_string());
        Ok(format!("{}/{}", PUBLIC_BASE, key))
    }
}

/// Record with one singleton group and the given child groups.
pub fn record(singleton: Option<PhotoGroup>, children: Vec<PhotoGroup>) -> MemoryRecord {
    MemoryRecord {
        singleton: singleton.map(GroupField::Present),
        children: children
            .into_iter()
            .enumerate()
            .map(|(i, g)| (format!("check{}", i), GroupField::Present(g)))
            .collect(),
    }
}
