//! Google Drive implementation of VersionedBlobStore
//!
//! Uses the Drive v3 REST API. Drive keeps a revision for every content update,
//! which gives restore-to-time its history.

use crate::{DocumentRecord, DocumentStoreError, DocumentStoreResult, Revision, VersionedBlobStore};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error};
use uuid::Uuid;

const FILE_FIELDS: &str = "id,name,modifiedTime";
const JSON_FILES_QUERY: &str = "mimeType='application/json' and trashed=false";
const JSON_MIME: &str = "application/json";

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DocumentRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RevisionList {
    #[serde(default)]
    revisions: Vec<Revision>,
    next_page_token: Option<String>,
}

/// Google Drive implementation of VersionedBlobStore
#[derive(Debug, Clone)]
pub struct DriveBlobStore {
    /// OAuth access token with Drive file scope
    access_token: String,

    /// Base URL for the Google APIs
    api_base_url: String,

    /// HTTP client
    client: Client,
}

impl DriveBlobStore {
    /// Create a new DriveBlobStore instance
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> DocumentStoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocumentStoreError::ConfigurationError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            access_token: access_token.into(),
            api_base_url: "https://www.googleapis.com".to_string(),
            client,
        })
    }

    /// Point the store at a different API host.
    pub fn with_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn files_endpoint(&self) -> String {
        format!("{}/drive/v3/files", self.api_base_url)
    }

    fn file_endpoint(&self, id: &str) -> String {
        format!("{}/{}", self.files_endpoint(), id)
    }

    fn upload_endpoint(&self) -> String {
        format!("{}/upload/drive/v3/files", self.api_base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.access_token)
    }

    async fn send(&self, request: RequestBuilder) -> DocumentStoreResult<Response> {
        self.authorized(request).send().await.map_err(|e| {
            error!("Drive request failed: {}", e);
            DocumentStoreError::Network(e.to_string())
        })
    }

    /// Maps a non-success response to the matching store error.
    async fn check(response: Response, subject: &str, action: &str) -> DocumentStoreResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        match status {
            StatusCode::NOT_FOUND => Err(DocumentStoreError::NotFound(subject.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DocumentStoreError::PermissionDenied(format!("{} {}", action, subject)))
            }
            _ => {
                let error_text = response.text().await.unwrap_or_default();
                error!("Failed to {} {}: {}", action, subject, error_text);
                Err(DocumentStoreError::BackendError(anyhow::anyhow!(
                    "Failed to {} {}: Status {}, Error: {}",
                    action,
                    subject,
                    status,
                    error_text
                )))
            }
        }
    }

    async fn read_record(response: Response) -> DocumentStoreResult<DocumentRecord> {
        response
            .json()
            .await
            .map_err(|e| DocumentStoreError::BackendError(e.into()))
    }

    async fn read_bytes(response: Response) -> DocumentStoreResult<Vec<u8>> {
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| DocumentStoreError::BackendError(e.into()))
    }

    /// Builds a `multipart/related` body of JSON metadata followed by JSON content.
    fn multipart_body(boundary: &str, metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
        let mut body = Vec::with_capacity(content.len() + 256);
        body.extend_from_slice(
            format!(
                "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{m}\r\n--{b}\r\nContent-Type: {mime}\r\n\r\n",
                b = boundary,
                m = metadata,
                mime = JSON_MIME
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--", boundary).as_bytes());
        body
    }
}

#[async_trait]
impl VersionedBlobStore for DriveBlobStore {
    async fn list(&self) -> DocumentStoreResult<Vec<DocumentRecord>> {
        debug!("Listing documents");
        let request = self.client.get(self.files_endpoint()).query(&[
            ("q", JSON_FILES_QUERY),
            ("fields", "files(id,name,modifiedTime)"),
            ("orderBy", "modifiedTime desc"),
            ("pageSize", "50"),
        ]);
        let response = Self::check(self.send(request).await?, "files", "list").await?;
        let list: FileList = response
            .json()
            .await
            .map_err(|e| DocumentStoreError::BackendError(e.into()))?;
        Ok(list.files)
    }

    async fn create(&self, name: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord> {
        debug!("Creating document {}", name);
        let boundary = format!("kgweave-{}", Uuid::new_v4().simple());
        let metadata = json!({ "name": name, "mimeType": JSON_MIME });
        let request = self
            .client
            .post(self.upload_endpoint())
            .query(&[("uploadType", "multipart"), ("fields", FILE_FIELDS)])
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(Self::multipart_body(&boundary, &metadata, content));
        let response = Self::check(self.send(request).await?, name, "create").await?;
        Self::read_record(response).await
    }

    async fn get(&self, id: &str) -> DocumentStoreResult<DocumentRecord> {
        debug!("Retrieving metadata for {}", id);
        let request = self.client.get(self.file_endpoint(id)).query(&[("fields", FILE_FIELDS)]);
        let response = Self::check(self.send(request).await?, id, "get").await?;
        Self::read_record(response).await
    }

    async fn get_content(&self, id: &str) -> DocumentStoreResult<Vec<u8>> {
        debug!("Retrieving content for {}", id);
        let request = self.client.get(self.file_endpoint(id)).query(&[("alt", "media")]);
        let response = Self::check(self.send(request).await?, id, "download").await?;
        Self::read_bytes(response).await
    }

    async fn update(&self, id: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord> {
        debug!("Updating content for {}", id);
        let request = self
            .client
            .patch(format!("{}/{}", self.upload_endpoint(), id))
            .query(&[("uploadType", "media"), ("fields", FILE_FIELDS)])
            .header(reqwest::header::CONTENT_TYPE, JSON_MIME)
            .body(content.to_vec());
        let response = Self::check(self.send(request).await?, id, "update").await?;
        Self::read_record(response).await
    }

    async fn copy(&self, id: &str, name: &str) -> DocumentStoreResult<DocumentRecord> {
        debug!("Copying {} as {}", id, name);
        let request = self
            .client
            .post(format!("{}/copy", self.file_endpoint(id)))
            .query(&[("fields", FILE_FIELDS)])
            .json(&json!({ "name": name }));
        let response = Self::check(self.send(request).await?, id, "copy").await?;
        Self::read_record(response).await
    }

    async fn list_revisions(&self, id: &str) -> DocumentStoreResult<Vec<Revision>> {
        let mut revisions = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut query = vec![("fields", "revisions(id,modifiedTime),nextPageToken".to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let request = self
                .client
                .get(format!("{}/revisions", self.file_endpoint(id)))
                .query(&query);
            let response = Self::check(self.send(request).await?, id, "list revisions of").await?;
            let page: RevisionList = response
                .json()
                .await
                .map_err(|e| DocumentStoreError::BackendError(e.into()))?;
            revisions.extend(page.revisions);
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        debug!(document_id = id, count = revisions.len(), "Listed revisions");
        Ok(revisions)
    }

    async fn get_revision(&self, id: &str, revision_id: &str) -> DocumentStoreResult<Vec<u8>> {
        debug!("Retrieving revision {} of {}", revision_id, id);
        let request = self
            .client
            .get(format!("{}/revisions/{}", self.file_endpoint(id), revision_id))
            .query(&[("alt", "media")]);
        let response = Self::check(self.send(request).await?, id, "download revision of").await?;
        Self::read_bytes(response).await
    }
}
