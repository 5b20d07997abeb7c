//! Blob store access: reading from the legacy store, writing to the target.
//!
//! The engine talks to both stores through the [`LegacySource`] and
//! [`TargetSink`] traits so the migration logic can run against in-memory
//! stores in tests.

mod key;
mod legacy;
mod target;

pub use key::{extension_for, KeyGenerator};
pub use legacy::FirebaseStorageSource;
pub use target::R2Sink;

use crate::classify::LegacyRef;
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// A downloaded asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAsset {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Read access to the legacy blob store.
#[async_trait]
pub trait LegacySource: Send + Sync {
    /// Download the asset a legacy reference points at.
    ///
    /// A non-success status is [`crate::MigrateError::DownloadFailed`].
    /// No retries are attempted.
    async fn fetch(&self, reference: &LegacyRef) -> Result<FetchedAsset>;
}

/// Write access to the target blob store.
#[async_trait]
pub trait TargetSink: Send + Sync {
    /// Public base URL of the store, without a trailing slash.
    fn public_base(&self) -> &str;

    /// Store `asset` under `key` and return its public URL.
    async fn upload(&self, asset: &FetchedAsset, key: &str) -> Result<String>;
}
