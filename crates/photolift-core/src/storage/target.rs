//! Cloudflare R2 (S3-compatible) upload client.

use super::{FetchedAsset, TargetSink};
use crate::config::{TargetConfig, TargetStoreConfig};
use crate::network::sigv4::{encode_path, payload_hash};
use crate::network::{HttpClient, SigV4Signer, SignableRequest};
use crate::{MigrateError, Result};
use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use url::Url;

/// Longest response body quoted in an upload error.
const MAX_ERROR_BODY: usize = 512;

/// Writes assets to an R2 bucket with path-style, SigV4-signed PUTs.
#[derive(Debug, Clone)]
pub struct R2Sink {
    http: HttpClient,
    signer: SigV4Signer,
    endpoint: Url,
    bucket: String,
    public_base: String,
}

impl R2Sink {
    pub fn new(http: HttpClient, config: &TargetConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| MigrateError::Config {
            message: format!("Invalid target endpoint {}: {}", config.endpoint, e),
        })?;
        if endpoint.host_str().is_none() {
            return Err(MigrateError::Config {
                message: format!("Target endpoint has no host: {}", config.endpoint),
            });
        }

        Ok(Self {
            http,
            signer: SigV4Signer::new(
                &config.access_key_id,
                &config.secret_access_key,
                TargetStoreConfig::REGION,
                TargetStoreConfig::SERVICE,
            ),
            endpoint,
            bucket: config.bucket.clone(),
            public_base: config.public_base.clone(),
        })
    }

    /// `host[:port]` exactly as the HTTP client will send it.
    fn host_header(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn object_path(&self, key: &str) -> String {
        let prefix = self.endpoint.path().trim_end_matches('/');
        encode_path(&format!("{}/{}/{}", prefix, self.bucket, key))
    }

    /// Public URL of an object, with the key encoded the same way as the
    /// stored path.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, encode_path(key))
    }

    async fn put_object(&self, asset: &FetchedAsset, key: &str) -> Result<()> {
        let now = Utc::now();
        let path = self.object_path(key);
        let hash = payload_hash(&asset.bytes);

        let mut headers = vec![
            ("content-type".to_string(), asset.content_type.clone()),
            ("x-amz-content-sha256".to_string(), hash.clone()),
            ("x-amz-date".to_string(), SigV4Signer::amz_date(now)),
        ];

        let mut signed = headers.clone();
        signed.push(("host".to_string(), self.host_header()));
        let authorization = self.signer.authorization(
            &SignableRequest {
                method: "PUT",
                canonical_uri: &path,
                canonical_query: "",
                headers: &signed,
                payload_hash: &hash,
            },
            now,
        );
        headers.push(("authorization".to_string(), authorization));

        let url = format!(
            "{}://{}{}",
            self.endpoint.scheme(),
            self.host_header(),
            path
        );

        let response = self
            .http
            .put_bytes(&url, &headers, asset.bytes.to_vec())
            .await
            .map_err(|e| MigrateError::UploadFailed {
                key: key.to_string(),
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MigrateError::UploadFailed {
                key: key.to_string(),
                status: Some(status.as_u16()),
                message: truncate(&body, MAX_ERROR_BODY),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl TargetSink for R2Sink {
    fn public_base(&self) -> &str {
        &self.public_base
    }

    async fn upload(&self, asset: &FetchedAsset, key: &str) -> Result<String> {
        self.put_object(asset, key).await?;
        debug!("Uploaded {} bytes to {}", asset.bytes.len(), key);
        Ok(self.public_url(key))
    }
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
