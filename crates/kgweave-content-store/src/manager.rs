//! Document lifecycle on top of a versioned blob store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kgweave_core::GraphContent;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{DocumentRecord, DocumentStoreError, DocumentStoreResult, Revision, VersionedBlobStore};

/// A fetched document together with its parsed content.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedDocument {
    pub record: DocumentRecord,
    pub content: GraphContent,
}

/// Result of a restore-to-time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored_from_revision: String,
    /// The record after the restored content was written back.
    pub record: DocumentRecord,
}

/// Picks the latest revision at or before `timestamp`.
///
/// On equal `modified_time` the revision listed first by the store wins.
pub fn select_revision(revisions: &[Revision], timestamp: DateTime<Utc>) -> Option<&Revision> {
    let mut selected: Option<&Revision> = None;
    for revision in revisions.iter().filter(|r| r.modified_time <= timestamp) {
        match selected {
            Some(current) if revision.modified_time <= current.modified_time => {}
            _ => selected = Some(revision),
        }
    }
    selected
}

/// Maps create/open/save/save-as/restore onto a [`VersionedBlobStore`].
#[derive(Debug, Clone)]
pub struct DocumentVersionManager {
    store: Arc<dyn VersionedBlobStore>,
}

impl DocumentVersionManager {
    pub fn new(store: Arc<dyn VersionedBlobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn VersionedBlobStore> {
        &self.store
    }

    /// JSON documents, most recently modified first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> DocumentStoreResult<Vec<DocumentRecord>> {
        self.store.list().await
    }

    #[instrument(skip(self, content), fields(node_count = content.nodes.len()))]
    pub async fn create(&self, name: &str, content: &GraphContent) -> DocumentStoreResult<DocumentRecord> {
        let record = self.store.create(name, &content.to_json_bytes()?).await?;
        info!(document_id = %record.id, "Created document");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn open(&self, id: &str) -> DocumentStoreResult<OpenedDocument> {
        let record = self.store.get(id).await?;
        let bytes = self.store.get_content(id).await?;
        let content = GraphContent::from_json_slice(&bytes)?;
        info!(
            document_id = %record.id,
            node_count = content.nodes.len(),
            edge_count = content.edges.len(),
            "Opened document"
        );
        Ok(OpenedDocument { record, content })
    }

    /// Opens the most recently modified document.
    #[instrument(skip(self))]
    pub async fn open_latest(&self) -> DocumentStoreResult<OpenedDocument> {
        let latest = self
            .store
            .list()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DocumentStoreError::NotFound("no documents".to_string()))?;
        self.open(&latest.id).await
    }

    #[instrument(skip(self, content), fields(node_count = content.nodes.len()))]
    pub async fn save(&self, id: &str, content: &GraphContent) -> DocumentStoreResult<DocumentRecord> {
        let record = self.store.update(id, &content.to_json_bytes()?).await?;
        info!(document_id = %record.id, modified_time = %record.modified_time, "Saved document");
        Ok(record)
    }

    /// Duplicates `id` under `new_name`. The original is left as it is.
    #[instrument(skip(self))]
    pub async fn save_as(&self, id: &str, new_name: &str) -> DocumentStoreResult<DocumentRecord> {
        let record = self.store.copy(id, new_name).await?;
        info!(source_id = id, document_id = %record.id, "Copied document");
        Ok(record)
    }

    /// Writes the content of the latest revision at or before `timestamp` back as a new save.
    ///
    /// The restored content is not returned; callers re-open the document to read it.
    #[instrument(skip(self, timestamp), fields(timestamp = %timestamp))]
    pub async fn restore_to_time(&self, id: &str, timestamp: DateTime<Utc>) -> DocumentStoreResult<RestoreOutcome> {
        let revisions = self.store.list_revisions(id).await?;
        let revision = select_revision(&revisions, timestamp).ok_or_else(|| {
            warn!(document_id = id, revisions = revisions.len(), "No revision at or before timestamp");
            DocumentStoreError::NoRevisionFound {
                document_id: id.to_string(),
                timestamp,
            }
        })?;

        let content = self.store.get_revision(id, &revision.id).await?;
        let record = self.store.update(id, &content).await?;
        info!(document_id = id, revision_id = %revision.id, "Restored document");

        Ok(RestoreOutcome {
            restored_from_revision: revision.id.clone(),
            record,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockVersionedBlobStore;
    use chrono::TimeZone;
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    fn revision(id: &str, time: DateTime<Utc>) -> Revision {
        Revision {
            id: id.to_string(),
            modified_time: time,
        }
    }

    fn hourly_revisions() -> Vec<Revision> {
        vec![revision("r9", at(9, 0)), revision("r10", at(10, 0)), revision("r11", at(11, 0))]
    }

    #[test]
    fn test_select_revision_picks_latest_not_after() {
        let revisions = hourly_revisions();
        assert_eq!(select_revision(&revisions, at(10, 30)).unwrap().id, "r10");
        assert_eq!(select_revision(&revisions, at(11, 0)).unwrap().id, "r11");
        assert!(select_revision(&revisions, at(8, 0)).is_none());
    }

    #[test]
    fn test_select_revision_ignores_store_order() {
        let mut revisions = hourly_revisions();
        revisions.reverse();
        assert_eq!(select_revision(&revisions, at(10, 30)).unwrap().id, "r10");
    }

    #[test]
    fn test_select_revision_tie_prefers_first_listed() {
        let revisions = vec![revision("a", at(10, 0)), revision("b", at(10, 0))];
        assert_eq!(select_revision(&revisions, at(12, 0)).unwrap().id, "a");
    }

    #[tokio::test]
    async fn test_restore_writes_selected_revision_back() {
        let mut store = MockVersionedBlobStore::new();
        store
            .expect_list_revisions()
            .with(eq("doc"))
            .times(1)
            .returning(|_| Ok(hourly_revisions()));
        store
            .expect_get_revision()
            .with(eq("doc"), eq("r10"))
            .times(1)
            .returning(|_, _| Ok(b"{\"prompt\":\"ten\"}".to_vec()));
        store
            .expect_update()
            .withf(|id, content| id == "doc" && content == b"{\"prompt\":\"ten\"}")
            .times(1)
            .returning(|id, _| {
                Ok(DocumentRecord {
                    id: id.to_string(),
                    name: "kg.json".to_string(),
                    modified_time: at(12, 0),
                })
            });

        let manager = DocumentVersionManager::new(Arc::new(store));
        let outcome = manager.restore_to_time("doc", at(10, 30)).await.unwrap();
        assert_eq!(outcome.restored_from_revision, "r10");
        assert_eq!(outcome.record.modified_time, at(12, 0));
    }

    #[tokio::test]
    async fn test_restore_before_history_fails_without_writing() {
        let mut store = MockVersionedBlobStore::new();
        store
            .expect_list_revisions()
            .returning(|_| Ok(hourly_revisions()));
        store.expect_get_revision().never();
        store.expect_update().never();

        let manager = DocumentVersionManager::new(Arc::new(store));
        let err = manager.restore_to_time("doc", at(8, 0)).await.unwrap_err();
        assert!(matches!(
            err,
            DocumentStoreError::NoRevisionFound { ref document_id, timestamp }
                if document_id == "doc" && timestamp == at(8, 0)
        ));
    }

    #[tokio::test]
    async fn test_open_latest_on_empty_store() {
        let mut store = MockVersionedBlobStore::new();
        store.expect_list().returning(|| Ok(Vec::new()));

        let manager = DocumentVersionManager::new(Arc::new(store));
        assert!(matches!(manager.open_latest().await, Err(DocumentStoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_content() {
        let mut store = MockVersionedBlobStore::new();
        store.expect_get().returning(|id| {
            Ok(DocumentRecord {
                id: id.to_string(),
                name: "broken.json".to_string(),
                modified_time: at(9, 0),
            })
        });
        store.expect_get_content().returning(|_| Ok(b"not json".to_vec()));

        let manager = DocumentVersionManager::new(Arc::new(store));
        assert!(matches!(manager.open("x").await, Err(DocumentStoreError::InvalidContent(_))));
    }
}
