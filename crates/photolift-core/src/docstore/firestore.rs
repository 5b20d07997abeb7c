//! Firestore REST client.
//!
//! Signs in with an admin email/password through the Identity Toolkit API and
//! then talks to the Firestore v1 REST API with the returned ID token.

use super::wire::{
    decode_group_field, encode_group, encode_timestamp, token_lifetime_secs, Document,
    ListDocumentsResponse, RefreshResponse, SignInResponse,
};
use super::DocumentStore;
use crate::config::{DatabaseConfig, RecordLayout};
use crate::models::{PhotoGroup, RecordId, Segment, SubRecord, SubRecordRef};
use crate::network::HttpClient;
use crate::{MigrateError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Signed-in admin session.
struct Session {
    id_token: String,
    refresh_token: String,
    expires_at: Instant,
}

impl Session {
    fn new(id_token: String, refresh_token: String, expires_in: Option<&str>) -> Self {
        Self {
            id_token,
            refresh_token,
            expires_at: Instant::now() + Duration::from_secs(token_lifetime_secs(expires_in)),
        }
    }

    fn expires_soon(&self) -> bool {
        Instant::now() + RecordLayout::TOKEN_REFRESH_MARGIN >= self.expires_at
    }
}

/// Firestore-backed [`DocumentStore`].
///
/// The ID token is renewed through the Secure Token API shortly before it
/// expires, and once more if the database answers 401.
pub struct FirestoreStore {
    http: HttpClient,
    config: DatabaseConfig,
    auth_base: String,
    token_base: String,
    documents_root: String,
    session: RwLock<Option<Session>>,
}

impl std::fmt::Debug for FirestoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreStore")
            .field("project_id", &self.config.project_id)
            .field("documents_root", &self.documents_root)
            .finish_non_exhaustive()
    }
}

impl FirestoreStore {
    pub fn new(http: HttpClient, config: DatabaseConfig) -> Self {
        Self::with_base_urls(
            http,
            config,
            RecordLayout::AUTH_BASE,
            RecordLayout::TOKEN_BASE,
            RecordLayout::FIRESTORE_BASE,
        )
    }

    /// Point the client at other Identity Toolkit, Secure Token and Firestore
    /// roots, e.g. an emulator.
    pub fn with_base_urls(
        http: HttpClient,
        config: DatabaseConfig,
        auth_base: &str,
        token_base: &str,
        firestore_base: &str,
    ) -> Self {
        let documents_root = format!(
            "{}/projects/{}/databases/(default)/documents",
            firestore_base.trim_end_matches('/'),
            config.project_id
        );
        Self {
            http,
            config,
            auth_base: auth_base.trim_end_matches('/').to_string(),
            token_base: token_base.trim_end_matches('/').to_string(),
            documents_root,
            session: RwLock::new(None),
        }
    }

    /// Current ID token, renewed first when it is about to expire.
    async fn token(&self) -> Result<String> {
        let stale = {
            let session = self.session.read().await;
            let session = session.as_ref().ok_or_else(not_signed_in)?;
            if !session.expires_soon() {
                return Ok(session.id_token.clone());
            }
            session.id_token.clone()
        };
        self.refresh(&stale).await
    }

    /// Exchange the refresh token for a new ID token.
    ///
    /// When another task already replaced `stale`, its token is returned
    /// without a second exchange. A rejected exchange is a
    /// [`MigrateError::Auth`] error; transport failures keep their own kind.
    async fn refresh(&self, stale: &str) -> Result<String> {
        let mut guard = self.session.write().await;
        let session = guard.as_mut().ok_or_else(not_signed_in)?;
        if session.id_token != stale && !session.expires_soon() {
            return Ok(session.id_token.clone());
        }

        let url = format!("{}/token?key={}", self.token_base, self.config.api_key);
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", session.refresh_token.as_str()),
        ];
        let response = self.http.post_form(&url, &form).await?;
        if !response.status().is_success() {
            let (_, message) = error_details(response).await;
            return Err(MigrateError::Auth {
                message: format!("Session renewal rejected: {}", message),
            });
        }

        let renewed: RefreshResponse = response.json().await.map_err(|e| MigrateError::Auth {
            message: format!("Unreadable token refresh response: {}", e),
        })?;
        *session = Session::new(
            renewed.id_token,
            renewed.refresh_token,
            renewed.expires_in.as_deref(),
        );
        info!("Session renewed");
        Ok(session.id_token.clone())
    }

    /// GET `url`, or PATCH it when a body is given, with the session token.
    ///
    /// A 401 renews the session and repeats the request once.
    async fn send_authorized(&self, url: &str, body: Option<&Value>) -> Result<Response> {
        let mut token = self.token().await?;
        let mut renewed = false;
        loop {
            let response = match body {
                Some(body) => self.http.patch_json_bearer(url, &token, body).await?,
                None => self.http.get_bearer(url, &token).await?,
            };
            if response.status() != StatusCode::UNAUTHORIZED || renewed {
                return Ok(response);
            }
            debug!("ID token rejected, renewing session");
            token = self.refresh(&token).await?;
            renewed = true;
        }
    }

    fn document_url(&self, path: &str) -> String {
        let encoded: Vec<String> = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        format!("{}/{}", self.documents_root, encoded.join("/"))
    }

    /// List every document of a collection, following pagination.
    async fn list_collection(&self, path: &str, mask: Option<&str>) -> Result<Vec<Document>> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = format!(
                "{}?pageSize={}",
                self.document_url(path),
                RecordLayout::PAGE_SIZE
            );
            if let Some(field) = mask {
                url.push_str(&format!("&mask.fieldPaths={}", urlencoding::encode(field)));
            }
            if let Some(page) = &page_token {
                url.push_str(&format!("&pageToken={}", urlencoding::encode(page)));
            }

            let response = self.send_authorized(&url, None).await?;
            let page: ListDocumentsResponse = expect_success(response).await?.json().await?;
            documents.extend(page.documents);

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        debug!("Listed {} documents under {}", documents.len(), path);
        Ok(documents)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn authenticate(&self) -> Result<()> {
        let url = format!(
            "{}/accounts:signInWithPassword?key={}",
            self.auth_base, self.config.api_key
        );
        let body = json!({
            "email": self.config.admin_email,
            "password": self.config.admin_password,
            "returnSecureToken": true,
        });

        let response = self
            .http
            .post_json(&url, &body)
            .await
            .map_err(|e| MigrateError::Auth {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let (_, message) = error_details(response).await;
            return Err(MigrateError::Auth { message });
        }

        let signed_in: SignInResponse = response.json().await.map_err(|e| MigrateError::Auth {
            message: format!("Unreadable sign-in response: {}", e),
        })?;
        info!(
            "Signed in as {} ({})",
            self.config.admin_email,
            signed_in.local_id.as_deref().unwrap_or("unknown uid")
        );
        *self.session.write().await = Some(Session::new(
            signed_in.id_token,
            signed_in.refresh_token,
            signed_in.expires_in.as_deref(),
        ));
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<RecordId>> {
        let documents = self.list_collection(RecordLayout::RECORDS, None).await?;
        Ok(documents
            .iter()
            .map(|doc| RecordId(doc.id().to_string()))
            .collect())
    }

    async fn get_singleton(&self, record: &RecordId) -> Result<Option<SubRecord>> {
        let path = format!(
            "{}/{}/{}/{}",
            RecordLayout::RECORDS,
            record,
            RecordLayout::SINGLETON_COLLECTION,
            RecordLayout::SINGLETON_DOC
        );
        let url = format!(
            "{}?mask.fieldPaths={}",
            self.document_url(&path),
            RecordLayout::GROUP_FIELD
        );

        let response = self.send_authorized(&url, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let document: Document = expect_success(response).await?.json().await?;

        Ok(Some(SubRecord {
            reference: SubRecordRef {
                owner: record.clone(),
                segment: Segment::Singleton,
                path,
            },
            group: decode_group_field(&document.fields, RecordLayout::GROUP_FIELD),
        }))
    }

    async fn list_children(&self, record: &RecordId) -> Result<Vec<SubRecord>> {
        let collection = format!(
            "{}/{}/{}",
            RecordLayout::RECORDS,
            record,
            RecordLayout::CHILDREN
        );
        let documents = self
            .list_collection(&collection, Some(RecordLayout::GROUP_FIELD))
            .await?;

        Ok(documents
            .into_iter()
            .map(|doc| SubRecord {
                reference: SubRecordRef {
                    owner: record.clone(),
                    segment: Segment::Child,
                    path: format!("{}/{}", collection, doc.id()),
                },
                group: decode_group_field(&doc.fields, RecordLayout::GROUP_FIELD),
            })
            .collect())
    }

    async fn update_group(
        &self,
        target: &SubRecordRef,
        group: &PhotoGroup,
        migrated_at: DateTime<Utc>,
    ) -> Result<()> {
        let url = format!(
            "{}?updateMask.fieldPaths={}&updateMask.fieldPaths={}&currentDocument.exists=true",
            self.document_url(&target.path),
            RecordLayout::GROUP_FIELD,
            RecordLayout::MIGRATED_AT_FIELD
        );
        let mut fields = serde_json::Map::new();
        fields.insert(RecordLayout::GROUP_FIELD.to_string(), encode_group(group));
        fields.insert(
            RecordLayout::MIGRATED_AT_FIELD.to_string(),
            encode_timestamp(migrated_at),
        );
        let body = json!({ "fields": fields });

        let response = self.send_authorized(&url, Some(&body)).await?;
        expect_success(response).await?;
        debug!("Updated {}", target.path);
        Ok(())
    }
}

fn not_signed_in() -> MigrateError {
    MigrateError::Auth {
        message: "not signed in".to_string(),
    }
}

async fn expect_success(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let (status, message) = error_details(response).await;
    Err(MigrateError::Database { status, message })
}

/// Status and the most useful message from an error response.
///
/// Google APIs answer with `{"error": {"message": ...}}`; anything else is
/// quoted verbatim.
async fn error_details(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&text)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or(text);
    (status, message)
}
