//! The graph session: one logical editor over the graph merge store.
//!
//! A session owns the current graph, its layout and prompt, and the document that
//! is currently open. All operations take the session lock for their whole
//! duration, so at most one lifecycle operation is in flight. The graph is only
//! touched after the completion or store round trip has fully succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, instrument};

use kgweave_content_store::{DocumentRecord, DocumentVersionManager, RestoreOutcome};
use kgweave_core::{
    probe_import, GraphAction, GraphBuilder, GraphContent, GraphStore, Layout, MergeSummary, TripleSource,
};

use crate::completion::CompletionSource;
use crate::error::{ServerError, ServerResult};

const PROMPT_NAME_CHARS: usize = 16;

lazy_static! {
    // Whitespace runs and characters file systems reject
    static ref NAME_UNSAFE: Regex = Regex::new(r#"[\s/\\:*?"<>|]+"#).unwrap();
}

/// Default name for a new document: `kg-<start of prompt>.json`, or `kg-<millis>.json`
/// when there is no prompt.
pub fn default_document_name(prompt: &str, now: DateTime<Utc>) -> String {
    let cleaned = NAME_UNSAFE.replace_all(prompt, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        format!("kg-{}.json", now.timestamp_millis())
    } else {
        format!("kg-{}.json", cleaned.chars().take(PROMPT_NAME_CHARS).collect::<String>().trim_end())
    }
}

/// Default name for a save-as copy.
pub fn default_copy_name(current_name: &str) -> String {
    format!("copy-{}", current_name)
}

/// Result of a generate call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOutcome {
    pub content: GraphContent,
    /// Triples the extractor accepted, before deduplication.
    pub triples_added: usize,
    pub merge: MergeSummary,
}

#[derive(Debug, Default)]
struct SessionState {
    graph: GraphStore,
    layout: String,
    prompt: String,
    current: Option<DocumentRecord>,
}

impl SessionState {
    fn content(&self) -> GraphContent {
        GraphContent::new(self.graph.document(), self.layout.clone(), self.prompt.clone())
    }

    /// Replaces the graph with stored content. Layout and prompt follow when present.
    fn load(&mut self, content: GraphContent) {
        self.graph.dispatch(GraphAction::ClearGraph);
        if !content.layout.is_empty() {
            self.layout = content.layout.clone();
        }
        if !content.prompt.is_empty() {
            self.prompt = content.prompt.clone();
        }
        self.graph.dispatch(GraphAction::AddNodesAndEdges(content.document().into()));
    }
}

/// One editing session over a graph and the document store.
#[derive(Debug)]
pub struct GraphSession {
    state: Mutex<SessionState>,
    builder: GraphBuilder,
    completion: Arc<dyn CompletionSource>,
    documents: DocumentVersionManager,
}

impl GraphSession {
    pub fn new(builder: GraphBuilder, completion: Arc<dyn CompletionSource>, documents: DocumentVersionManager) -> Self {
        Self {
            state: Mutex::new(SessionState {
                layout: Layout::default().as_str().to_string(),
                ..Default::default()
            }),
            builder,
            completion,
            documents,
        }
    }

    /// Current graph, layout and prompt.
    pub async fn content(&self) -> GraphContent {
        self.state.lock().await.content()
    }

    /// The document opened or saved last, if any.
    pub async fn current_document(&self) -> Option<DocumentRecord> {
        self.state.lock().await.current.clone()
    }

    /// Asks the completion source for tuples about `prompt` and merges them.
    #[instrument(skip(self))]
    pub async fn generate(&self, prompt: &str) -> ServerResult<GenerateOutcome> {
        if prompt.trim().is_empty() {
            return Err(ServerError::ValidationError("prompt must not be empty".to_string()));
        }
        let mut state = self.state.lock().await;

        let text = self.completion.complete(prompt).await?;
        let triples = TripleSource::Text(text).triples()?;
        let candidate = self.builder.build(&triples);
        let merge = state.graph.dispatch(GraphAction::AddNodesAndEdges(candidate));
        state.prompt = prompt.to_string();

        info!(
            triples = triples.len(),
            nodes_added = merge.nodes_added,
            edges_added = merge.edges_added,
            "Merged generated graph"
        );
        Ok(GenerateOutcome {
            content: state.content(),
            triples_added: triples.len(),
            merge,
        })
    }

    /// Merges an imported canonical document or tuple array into the graph.
    #[instrument(skip(self, value))]
    pub async fn import(&self, value: &Value) -> ServerResult<MergeSummary> {
        let payload = probe_import(value)?;
        let candidate = payload.into_candidate(&self.builder);
        let mut state = self.state.lock().await;
        let merge = state.graph.dispatch(GraphAction::AddNodesAndEdges(candidate));
        info!(nodes_added = merge.nodes_added, edges_added = merge.edges_added, "Imported graph");
        Ok(merge)
    }

    pub async fn clear(&self) {
        self.state.lock().await.graph.dispatch(GraphAction::ClearGraph);
    }

    /// Switches to a known layout, by persisted or display name.
    pub async fn set_layout(&self, name: &str) -> ServerResult<Layout> {
        let layout: Layout = name.parse().map_err(ServerError::ValidationError)?;
        self.state.lock().await.layout = layout.as_str().to_string();
        Ok(layout)
    }

    pub async fn list_documents(&self) -> ServerResult<Vec<DocumentRecord>> {
        Ok(self.documents.list().await?)
    }

    /// Stores the current content as a new document and makes it current.
    #[instrument(skip(self))]
    pub async fn new_document(&self, name: Option<String>) -> ServerResult<DocumentRecord> {
        let mut state = self.state.lock().await;
        let name = name
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| default_document_name(&state.prompt, Utc::now()));
        let record = self.documents.create(&name, &state.content()).await?;
        state.current = Some(record.clone());
        Ok(record)
    }

    /// Loads a stored document into the session, replacing the graph.
    #[instrument(skip(self))]
    pub async fn open_document(&self, id: &str) -> ServerResult<(DocumentRecord, GraphContent)> {
        let mut state = self.state.lock().await;
        let opened = self.documents.open(id).await?;
        state.load(opened.content);
        state.current = Some(opened.record.clone());
        Ok((opened.record, state.content()))
    }

    /// Opens the most recently modified document.
    #[instrument(skip(self))]
    pub async fn open_latest(&self) -> ServerResult<(DocumentRecord, GraphContent)> {
        let mut state = self.state.lock().await;
        let opened = self.documents.open_latest().await?;
        state.load(opened.content);
        state.current = Some(opened.record.clone());
        Ok((opened.record, state.content()))
    }

    /// Writes the current content to document `id`.
    #[instrument(skip(self))]
    pub async fn save(&self, id: &str) -> ServerResult<DocumentRecord> {
        let mut state = self.state.lock().await;
        let record = self.documents.save(id, &state.content()).await?;
        state.current = Some(record.clone());
        Ok(record)
    }

    /// Copies document `id` under `name`, or `copy-<name of id>`, and makes the copy current.
    #[instrument(skip(self))]
    pub async fn save_as(&self, id: &str, name: Option<String>) -> ServerResult<DocumentRecord> {
        let mut state = self.state.lock().await;
        let name = match name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => {
                let source_name = match &state.current {
                    Some(current) if current.id == id => current.name.clone(),
                    _ => self.documents.store().get(id).await?.name,
                };
                default_copy_name(&source_name)
            }
        };
        let record = self.documents.save_as(id, &name).await?;
        state.current = Some(record.clone());
        Ok(record)
    }

    /// Restores document `id` to how it was at `timestamp` and reloads it into the session.
    #[instrument(skip(self))]
    pub async fn restore_to_time(
        &self,
        id: &str,
        timestamp: DateTime<Utc>,
    ) -> ServerResult<(RestoreOutcome, GraphContent)> {
        let mut state = self.state.lock().await;
        let outcome = self.documents.restore_to_time(id, timestamp).await?;
        let reopened = self.documents.open(id).await?;
        state.load(reopened.content);
        state.current = Some(reopened.record);
        Ok((outcome, state.content()))
    }
}
