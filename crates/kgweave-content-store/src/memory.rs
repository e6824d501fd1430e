//! In-memory implementation of VersionedBlobStore
//!
//! Keeps every saved version of every document. Intended for development and tests.
//! All data is lost when the instance is dropped.

use crate::{DocumentRecord, DocumentStoreError, DocumentStoreResult, Revision, VersionedBlobStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Source of modification timestamps.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Maximum number of entries returned by `list`.
const LIST_PAGE_SIZE: usize = 50;

#[derive(Debug, Clone)]
struct StoredRevision {
    id: String,
    modified_time: DateTime<Utc>,
    content: Vec<u8>,
}

#[derive(Debug, Clone)]
struct StoredFile {
    name: String,
    // Append-only; the last entry is the current content.
    revisions: Vec<StoredRevision>,
}

impl StoredFile {
    fn current(&self) -> &StoredRevision {
        // Files are created with one revision and never lose any.
        &self.revisions[self.revisions.len() - 1]
    }

    fn record(&self, id: &str) -> DocumentRecord {
        DocumentRecord {
            id: id.to_string(),
            name: self.name.clone(),
            modified_time: self.current().modified_time,
        }
    }
}

/// In-memory implementation of VersionedBlobStore
#[derive(Clone)]
pub struct InMemoryBlobStore {
    files: Arc<RwLock<HashMap<String, StoredFile>>>,
    clock: Clock,
}

impl Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryBlobStore").finish_non_exhaustive()
    }
}

impl InMemoryBlobStore {
    /// Create a new in-memory store stamping revisions with the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(Utc::now))
    }

    /// Create a store whose revision timestamps come from `clock`.
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            files: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    fn new_revision(&self, content: &[u8]) -> StoredRevision {
        StoredRevision {
            id: Uuid::new_v4().to_string(),
            modified_time: (self.clock)(),
            content: content.to_vec(),
        }
    }

    fn insert_file(files: &mut HashMap<String, StoredFile>, file: StoredFile) -> DocumentRecord {
        let id = Uuid::new_v4().simple().to_string();
        let record = file.record(&id);
        files.insert(id, file);
        record
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VersionedBlobStore for InMemoryBlobStore {
    async fn list(&self) -> DocumentStoreResult<Vec<DocumentRecord>> {
        let files = self.files.read().await;
        let mut records: Vec<DocumentRecord> = files.iter().map(|(id, file)| file.record(id)).collect();
        records.sort_by(|a, b| b.modified_time.cmp(&a.modified_time).then_with(|| a.id.cmp(&b.id)));
        records.truncate(LIST_PAGE_SIZE);
        Ok(records)
    }

    async fn create(&self, name: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord> {
        let file = StoredFile {
            name: name.to_string(),
            revisions: vec![self.new_revision(content)],
        };
        let mut files = self.files.write().await;
        let record = Self::insert_file(&mut files, file);
        debug!(document_id = %record.id, name, "Created document");
        Ok(record)
    }

    async fn get(&self, id: &str) -> DocumentStoreResult<DocumentRecord> {
        let files = self.files.read().await;
        files
            .get(id)
            .map(|file| file.record(id))
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))
    }

    async fn get_content(&self, id: &str) -> DocumentStoreResult<Vec<u8>> {
        let files = self.files.read().await;
        files
            .get(id)
            .map(|file| file.current().content.clone())
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))
    }

    async fn update(&self, id: &str, content: &[u8]) -> DocumentStoreResult<DocumentRecord> {
        let revision = self.new_revision(content);
        let mut files = self.files.write().await;
        let file = files
            .get_mut(id)
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;
        debug!(document_id = id, revision_id = %revision.id, "Appending revision");
        file.revisions.push(revision);
        Ok(file.record(id))
    }

    async fn copy(&self, id: &str, name: &str) -> DocumentStoreResult<DocumentRecord> {
        let mut files = self.files.write().await;
        let content = files
            .get(id)
            .map(|file| file.current().content.clone())
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;
        // A copy starts its own history.
        let file = StoredFile {
            name: name.to_string(),
            revisions: vec![self.new_revision(&content)],
        };
        Ok(Self::insert_file(&mut files, file))
    }

    async fn list_revisions(&self, id: &str) -> DocumentStoreResult<Vec<Revision>> {
        let files = self.files.read().await;
        let file = files
            .get(id)
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;
        Ok(file
            .revisions
            .iter()
            .map(|r| Revision {
                id: r.id.clone(),
                modified_time: r.modified_time,
            })
            .collect())
    }

    async fn get_revision(&self, id: &str, revision_id: &str) -> DocumentStoreResult<Vec<u8>> {
        let files = self.files.read().await;
        let file = files
            .get(id)
            .ok_or_else(|| DocumentStoreError::NotFound(id.to_string()))?;
        file.revisions
            .iter()
            .find(|r| r.id == revision_id)
            .map(|r| r.content.clone())
            .ok_or_else(|| DocumentStoreError::NotFound(format!("{}@{}", id, revision_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Mutex;

    /// A clock that advances one minute per reading.
    fn ticking_clock() -> Clock {
        let now = Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
        Arc::new(move || {
            let mut now = now.lock().unwrap();
            let current = *now;
            *now = current + Duration::minutes(1);
            current
        })
    }

    #[tokio::test]
    async fn test_create_and_read_back() {
        let store = InMemoryBlobStore::new();
        let record = store.create("kg-a.json", b"{\"nodes\":[]}").await.unwrap();

        assert_eq!(record.name, "kg-a.json");
        assert_eq!(store.get(&record.id).await.unwrap(), record);
        assert_eq!(store.get_content(&record.id).await.unwrap(), b"{\"nodes\":[]}");
    }

    #[tokio::test]
    async fn test_missing_document() {
        let store = InMemoryBlobStore::new();
        for result in [
            store.get_content("nope").await.map(|_| ()),
            store.update("nope", b"{}").await.map(|_| ()),
            store.copy("nope", "x").await.map(|_| ()),
            store.list_revisions("nope").await.map(|_| ()),
        ] {
            assert!(matches!(result, Err(DocumentStoreError::NotFound(_))));
        }
    }

    #[tokio::test]
    async fn test_update_appends_revision() {
        let store = InMemoryBlobStore::with_clock(ticking_clock());
        let record = store.create("doc.json", b"v1").await.unwrap();
        let updated = store.update(&record.id, b"v2").await.unwrap();

        assert_eq!(updated.id, record.id);
        assert!(updated.modified_time > record.modified_time);

        let revisions = store.list_revisions(&record.id).await.unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(store.get_revision(&record.id, &revisions[0].id).await.unwrap(), b"v1");
        assert_eq!(store.get_content(&record.id).await.unwrap(), b"v2");
    }

    #[tokio::test]
    async fn test_copy_leaves_original_untouched() {
        let store = InMemoryBlobStore::with_clock(ticking_clock());
        let original = store.create("doc.json", b"v1").await.unwrap();
        let copy = store.copy(&original.id, "copy-doc.json").await.unwrap();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "copy-doc.json");
        assert_eq!(store.get_content(&copy.id).await.unwrap(), b"v1");
        assert_eq!(store.get(&original.id).await.unwrap(), original);
        assert_eq!(store.list_revisions(&copy.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = InMemoryBlobStore::with_clock(ticking_clock());
        let first = store.create("first.json", b"{}").await.unwrap();
        let second = store.create("second.json", b"{}").await.unwrap();
        store.update(&first.id, b"{}").await.unwrap();

        let names: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["first.json".to_string(), second.name]);
    }
}
