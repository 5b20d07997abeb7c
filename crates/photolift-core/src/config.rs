//! Centralized configuration for photolift.
//!
//! Constant tables for network timeouts, store endpoints and the document
//! layout, plus [`MigrationConfig`], the explicit runtime configuration built
//! once at startup.

use crate::{MigrateError, Result};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
    pub const USER_AGENT: &'static str = "photolift/0.1";
}

/// Legacy store (Firebase Storage) endpoint conventions.
pub struct LegacyStoreConfig;

impl LegacyStoreConfig {
    pub const PUBLIC_HOST: &'static str = "firebasestorage.googleapis.com";
    pub const DOWNLOAD_QUERY: &'static str = "alt=media";
    pub const DEFAULT_CONTENT_TYPE: &'static str = "application/octet-stream";
}

/// Target store (Cloudflare R2) conventions.
pub struct TargetStoreConfig;

impl TargetStoreConfig {
    /// Hosts ending with this suffix are R2 public-development URLs.
    pub const PUBLIC_DOMAIN_SUFFIX: &'static str = "r2.dev";
    pub const REGION: &'static str = "auto";
    pub const SERVICE: &'static str = "s3";
}

/// Document database (Firestore) endpoints and record layout.
pub struct RecordLayout;

impl RecordLayout {
    pub const AUTH_BASE: &'static str = "https://identitytoolkit.googleapis.com/v1";
    pub const TOKEN_BASE: &'static str = "https://securetoken.googleapis.com/v1";
    /// ID tokens this close to expiry are renewed before use.
    pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(120);
    pub const FIRESTORE_BASE: &'static str = "https://firestore.googleapis.com/v1";
    pub const PAGE_SIZE: u32 = 300;

    pub const RECORDS: &'static str = "clients";
    pub const SINGLETON_COLLECTION: &'static str = "anamnesi";
    pub const SINGLETON_DOC: &'static str = "initial";
    pub const CHILDREN: &'static str = "checks";

    pub const GROUP_FIELD: &'static str = "photoURLs";
    pub const MIGRATED_AT_FIELD: &'static str = "migratedAt";

    pub const SINGLETON_SEGMENT: &'static str = "anamnesi_photos";
    pub const CHILD_SEGMENT: &'static str = "check_photos";
}

/// Environment keys read by [`MigrationConfig::from_lookup`].
pub struct EnvKeys;

impl EnvKeys {
    pub const API_KEY: &'static str = "VITE_API_KEY";
    pub const PROJECT_ID: &'static str = "VITE_PROJECT_ID";
    pub const STORAGE_BUCKET: &'static str = "VITE_STORAGE_BUCKET";
    pub const ADMIN_EMAIL: &'static str = "ADMIN_EMAIL";
    pub const ADMIN_PASSWORD: &'static str = "ADMIN_PASSWORD";
    pub const R2_ACCOUNT_ID: &'static str = "VITE_R2_ACCOUNT_ID";
    pub const R2_ACCESS_KEY_ID: &'static str = "VITE_R2_ACCESS_KEY_ID";
    pub const R2_SECRET_ACCESS_KEY: &'static str = "VITE_R2_SECRET_ACCESS_KEY";
    pub const R2_BUCKET_NAME: &'static str = "VITE_R2_BUCKET_NAME";
    pub const R2_PUBLIC_URL: &'static str = "VITE_R2_PUBLIC_URL";
    pub const R2_ENDPOINT: &'static str = "VITE_R2_ENDPOINT";

    pub const REQUIRED: [&'static str; 10] = [
        Self::API_KEY,
        Self::PROJECT_ID,
        Self::STORAGE_BUCKET,
        Self::ADMIN_EMAIL,
        Self::ADMIN_PASSWORD,
        Self::R2_ACCOUNT_ID,
        Self::R2_ACCESS_KEY_ID,
        Self::R2_SECRET_ACCESS_KEY,
        Self::R2_BUCKET_NAME,
        Self::R2_PUBLIC_URL,
    ];
}

/// Document database identity and admin credentials.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub api_key: String,
    pub project_id: String,
    pub admin_email: String,
    pub admin_password: String,
}

/// Legacy store identity.
#[derive(Debug, Clone)]
pub struct LegacyConfig {
    pub bucket: String,
}

/// Target store identity and credentials.
#[derive(Clone)]
pub struct TargetConfig {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Public base URL without a trailing slash.
    pub public_base: String,
    /// S3 API endpoint without a trailing slash.
    pub endpoint: String,
}

/// Complete runtime configuration.
#[derive(Clone)]
pub struct MigrationConfig {
    pub database: DatabaseConfig,
    pub legacy: LegacyConfig,
    pub target: TargetConfig,
}

// Secrets stay out of logs.
impl std::fmt::Debug for MigrationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationConfig")
            .field("project_id", &self.database.project_id)
            .field("admin_email", &self.database.admin_email)
            .field("legacy_bucket", &self.legacy.bucket)
            .field("target_bucket", &self.target.bucket)
            .field("target_endpoint", &self.target.endpoint)
            .field("public_base", &self.target.public_base)
            .finish_non_exhaustive()
    }
}

impl MigrationConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Every missing or empty required key is reported in a single
    /// [`MigrateError::MissingConfig`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = EnvKeys::REQUIRED
            .iter()
            .filter(|key| get(key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(MigrateError::MissingConfig(missing));
        }

        let require = |key: &str| {
            get(key).ok_or_else(|| MigrateError::MissingConfig(vec![key.to_string()]))
        };

        let account_id = require(EnvKeys::R2_ACCOUNT_ID)?;
        let endpoint = get(EnvKeys::R2_ENDPOINT)
            .unwrap_or_else(|| format!("https://{}.r2.cloudflarestorage.com", account_id));
        let public_base = normalize_base(&require(EnvKeys::R2_PUBLIC_URL)?);
        if url::Url::parse(&public_base).is_err() {
            return Err(MigrateError::Config {
                message: format!("{} is not a valid URL: {}", EnvKeys::R2_PUBLIC_URL, public_base),
            });
        }

        Ok(Self {
            database: DatabaseConfig {
                api_key: require(EnvKeys::API_KEY)?,
                project_id: require(EnvKeys::PROJECT_ID)?,
                admin_email: require(EnvKeys::ADMIN_EMAIL)?,
                admin_password: require(EnvKeys::ADMIN_PASSWORD)?,
            },
            legacy: LegacyConfig {
                bucket: require(EnvKeys::STORAGE_BUCKET)?,
            },
            target: TargetConfig {
                account_id,
                access_key_id: require(EnvKeys::R2_ACCESS_KEY_ID)?,
                secret_access_key: require(EnvKeys::R2_SECRET_ACCESS_KEY)?,
                bucket: require(EnvKeys::R2_BUCKET_NAME)?,
                public_base,
                endpoint: normalize_base(&endpoint),
            },
        })
    }
}

/// Strip trailing slashes from a base URL.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_env() -> HashMap<&'static str, String> {
        EnvKeys::REQUIRED
            .iter()
            .map(|k| (*k, format!("value-{}", k.to_lowercase())))
            .chain([(EnvKeys::R2_PUBLIC_URL, "https://media.example.com/".to_string())])
            .collect()
    }

    #[test]
    fn test_from_lookup_complete() {
        let env = full_env();
        let config = MigrationConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.target.public_base, "https://media.example.com");
        assert_eq!(
            config.target.endpoint,
            "https://value-vite_r2_account_id.r2.cloudflarestorage.com"
        );
        assert_eq!(config.legacy.bucket, "value-vite_storage_bucket");
    }

    #[test]
    fn test_from_lookup_reports_all_missing() {
        let mut env = full_env();
        env.remove(EnvKeys::ADMIN_PASSWORD);
        env.insert(EnvKeys::R2_BUCKET_NAME, "   ".to_string());

        match MigrationConfig::from_lookup(|k| env.get(k).cloned()) {
            Err(MigrateError::MissingConfig(keys)) => {
                assert_eq!(keys, vec!["ADMIN_PASSWORD", "VITE_R2_BUCKET_NAME"]);
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_endpoint_override() {
        let mut env = full_env();
        env.insert(EnvKeys::R2_ENDPOINT, "http://127.0.0.1:9000/".to_string());
        let config = MigrationConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.target.endpoint, "http://127.0.0.1:9000");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let env = full_env();
        let config = MigrationConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("value-vite_r2_secret_access_key"));
        assert!(!rendered.contains("value-admin_password"));
    }

    #[test]
    fn test_normalize_base() {
        assert_eq!(normalize_base("https://x.dev/pub//"), "https://x.dev/pub");
        assert_eq!(normalize_base("https://x.dev/pub"), "https://x.dev/pub");
    }
}
