//! Firebase Storage download client.

use super::{FetchedAsset, LegacySource};
use crate::classify::LegacyRef;
use crate::config::LegacyStoreConfig;
use crate::network::HttpClient;
use crate::{MigrateError, Result};
use async_trait::async_trait;
use reqwest::{header, StatusCode};
use tracing::debug;

/// Reads assets from a Firebase Storage bucket's public endpoint.
#[derive(Debug, Clone)]
pub struct FirebaseStorageSource {
    http: HttpClient,
    bucket: String,
}

impl FirebaseStorageSource {
    pub fn new(http: HttpClient, bucket: impl Into<String>) -> Self {
        Self {
            http,
            bucket: bucket.into(),
        }
    }

    /// Resolve a legacy reference to a download URL.
    ///
    /// Relative paths are percent-encoded as a single object name (so `/`
    /// becomes `%2F`) and given the media query; full URLs pass through.
    pub fn download_url(&self, reference: &LegacyRef) -> String {
        match reference {
            LegacyRef::FullyQualified(url) => url.clone(),
            LegacyRef::Relative(path) => format!(
                "https://{}/v0/b/{}/o/{}?{}",
                LegacyStoreConfig::PUBLIC_HOST,
                self.bucket,
                urlencoding::encode(path),
                LegacyStoreConfig::DOWNLOAD_QUERY
            ),
        }
    }
}

#[async_trait]
impl LegacySource for FirebaseStorageSource {
    async fn fetch(&self, reference: &LegacyRef) -> Result<FetchedAsset> {
        let url = self.download_url(reference);
        let response = self.http.get(&url).await.map_err(|e| match e {
            MigrateError::RateLimited { .. } => MigrateError::DownloadFailed {
                status: StatusCode::TOO_MANY_REQUESTS.as_u16(),
            },
            other => other,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MigrateError::DownloadFailed {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(LegacyStoreConfig::DEFAULT_CONTENT_TYPE)
            .to_string();

        let bytes = response.bytes().await.map_err(|e| MigrateError::Network {
            message: format!("Reading body of {} failed: {}", reference.as_str(), e),
            source: Some(e),
        })?;

        debug!("Fetched {} bytes ({}) for {}", bytes.len(), content_type, reference.as_str());
        Ok(FetchedAsset {
            bytes,
            content_type,
        })
    }
}
