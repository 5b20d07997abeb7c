//! Reference classification.
//!
//! Decides, for a single stored reference, whether it is empty, already
//! resident in the target store, or a legacy reference that needs to move.
//! Classification is pure and total: anything that is not recognisably a
//! target or legacy URL is treated as a legacy store-relative path.

use crate::config::{normalize_base, LegacyStoreConfig, TargetStoreConfig};
use url::Url;

/// A reference that still points at the legacy store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LegacyRef {
    /// Full URL on the legacy store's public endpoint; fetched as-is.
    FullyQualified(String),
    /// Store-internal object path; a download URL must be built for it.
    Relative(String),
}

impl LegacyRef {
    /// The reference exactly as stored.
    pub fn as_str(&self) -> &str {
        match self {
            LegacyRef::FullyQualified(s) | LegacyRef::Relative(s) => s,
        }
    }
}

/// Outcome of classifying one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Empty,
    AlreadyMigrated,
    Legacy(LegacyRef),
}

/// Classifier bound to a target public base.
#[derive(Debug, Clone)]
pub struct Classifier {
    target_public_base: String,
}

impl Classifier {
    pub fn new(target_public_base: &str) -> Self {
        Self {
            target_public_base: normalize_base(target_public_base),
        }
    }

    pub fn target_public_base(&self) -> &str {
        &self.target_public_base
    }

    pub fn classify(&self, reference: Option<&str>) -> Classification {
        let value = match reference.map(str::trim) {
            None | Some("") => return Classification::Empty,
            Some(v) => v,
        };

        if self.is_target(value) {
            return Classification::AlreadyMigrated;
        }

        if is_legacy_url(value) {
            Classification::Legacy(LegacyRef::FullyQualified(value.to_string()))
        } else {
            Classification::Legacy(LegacyRef::Relative(value.to_string()))
        }
    }

    /// Whether `value` already lives in the target store.
    pub fn is_target(&self, value: &str) -> bool {
        let base = &self.target_public_base;
        if !base.is_empty()
            && value
                .strip_prefix(base.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        {
            return true;
        }

        host_of(value).is_some_and(|host| {
            let suffix = TargetStoreConfig::PUBLIC_DOMAIN_SUFFIX;
            host == suffix || host.ends_with(&format!(".{}", suffix))
        })
    }
}

/// Convenience form of [`Classifier::classify`].
pub fn classify(reference: Option<&str>, target_public_base: &str) -> Classification {
    Classifier::new(target_public_base).classify(reference)
}

/// Whether `value` is a full URL on the legacy store's public endpoint.
pub fn is_legacy_url(value: &str) -> bool {
    host_of(value).is_some_and(|host| host == LegacyStoreConfig::PUBLIC_HOST)
}

fn host_of(value: &str) -> Option<String> {
    let url = Url::parse(value).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str().map(|h| h.to_ascii_lowercase())
}
