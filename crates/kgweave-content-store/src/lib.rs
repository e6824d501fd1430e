//! kgweave Content Store
//!
//! Provides the versioned blob store abstraction used to persist graph documents,
//! two implementations of it, and the [`DocumentVersionManager`] that maps document
//! lifecycle intents (create, open, save, save-as, restore-to-time) onto it.
//!
//! Revision history belongs to the store. Saving appends a revision; nothing here
//! tracks versions locally.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifies a persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub name: String,
    pub modified_time: DateTime<Utc>,
}

/// An immutable history entry of a document, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub id: String,
    pub modified_time: DateTime<Utc>,
}

/// Errors that can occur during document store operations
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No revision of document {document_id} exists at or before {timestamp}")]
    NoRevisionFound {
        document_id: String,
        timestamp: DateTime<Utc>,
    },

    /// The request never produced a response. Not retried, since a retried save could
    /// append a duplicate revision.
    #[error("Network failure: {0}")]
    Network(String),

    #[error("Storage backend error: {0}")]
    BackendError(#[from] anyhow::Error), // Catch-all for backend-specific issues

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid document content: {0}")]
    InvalidContent(#[from] kgweave_core::GraphError),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

/// Result type for VersionedBlobStore operations
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

/// Contract for stores that keep named JSON blobs with an append-only revision log.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VersionedBlobStore: Send + Sync + std::fmt::Debug {
    /// Lists JSON documents, most recently modified first.
    async fn list(&self) -> DocumentStoreResult<Vec<DocumentRecord>>;

    /// Stores a new blob under `name`.
    async fn create(&self, name: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord>;

    /// Metadata of an existing blob.
    async fn get(&self, id: &str) -> DocumentStoreResult<DocumentRecord>;

    /// Current content of an existing blob.
    async fn get_content(&self, id: &str) -> DocumentStoreResult<Vec<u8>>;

    /// Replaces the current content, appending a revision.
    async fn update(&self, id: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord>;

    /// Duplicates a blob under a new identity and name.
    async fn copy(&self, id: &str, name: &str) -> DocumentStoreResult<DocumentRecord>;

    /// Every revision of a blob, in the store's own order.
    async fn list_revisions(&self, id: &str) -> DocumentStoreResult<Vec<Revision>>;

    /// Content of one revision.
    async fn get_revision(&self, id: &str, revision_id: &str) -> DocumentStoreResult<Vec<u8>>;

    /// Checks that the store answers requests.
    async fn health_check(&self) -> DocumentStoreResult<()> {
        self.list().await.map(|_| ())
    }
}

// Re-export modules so they can be used from other crates
pub mod drive;
pub mod manager;
pub mod memory;

pub use drive::DriveBlobStore;
pub use manager::{select_revision, DocumentVersionManager, OpenedDocument, RestoreOutcome};
pub use memory::InMemoryBlobStore;
