//! Persisted document content and the import/export codec.
//!
//! The on-disk shape is `{nodes, edges, layout, prompt}`. Imports accept either
//! that shape or an array of tuple records; the two are told apart by probing the
//! top-level JSON value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{GraphError, GraphResult};
use crate::graph::{CandidateGraph, Edge, GraphDocument, Node};
use crate::layout::Layout;
use crate::normalizer::{normalize_records, type_name};
use crate::triple::{normalize_id, Triple};

fn default_layout() -> String {
    Layout::default().as_str().to_string()
}

/// Content of a stored document.
///
/// `layout` is kept as a raw string so names this build does not know about
/// still round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphContent {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default = "default_layout")]
    pub layout: String,
    #[serde(default)]
    pub prompt: String,
}

impl Default for GraphContent {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            layout: default_layout(),
            prompt: String::new(),
        }
    }
}

impl GraphContent {
    pub fn new(document: &GraphDocument, layout: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            nodes: document.nodes.clone(),
            edges: document.edges.clone(),
            layout: layout.into(),
            prompt: prompt.into(),
        }
    }

    /// The node/edge part of the content.
    pub fn document(&self) -> GraphDocument {
        GraphDocument {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }

    /// Candidate nodes and edges with ids and endpoints in normalized form, so an
    /// imported `"Paris"` dedups against a generated `paris`.
    ///
    /// Nodes whose id normalizes to nothing are dropped; the store then drops
    /// edges pointing at them.
    pub fn into_candidate(self) -> CandidateGraph {
        let nodes = self
            .nodes
            .into_iter()
            .filter_map(|node| {
                let id = normalize_id(&node.id);
                (!id.is_empty()).then(|| Node { id, ..node })
            })
            .collect();
        let edges = self
            .edges
            .into_iter()
            .map(|edge| Edge {
                source: normalize_id(&edge.source),
                target: normalize_id(&edge.target),
                label: edge.label,
            })
            .collect();
        CandidateGraph { nodes, edges }
    }

    pub fn to_json_bytes(&self) -> GraphResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parses stored bytes. Empty input is read as an empty document.
    pub fn from_json_slice(bytes: &[u8]) -> GraphResult<Self> {
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// The two import shapes, collapsed into something the graph store can merge.
#[derive(Debug, Clone, PartialEq)]
pub enum ImportPayload {
    /// A canonical document; merged as-is.
    Document(GraphContent),
    /// Tuple records; still need the graph builder.
    Tuples(Vec<Triple>),
}

/// Decides which parser applies to an imported JSON value.
pub fn probe_import(value: &Value) -> GraphResult<ImportPayload> {
    match value {
        Value::Object(map) if map.contains_key("nodes") || map.contains_key("edges") => {
            let content: GraphContent = serde_json::from_value(value.clone())
                .map_err(|e| GraphError::MalformedImport(format!("invalid graph document: {}", e)))?;
            Ok(ImportPayload::Document(content))
        }
        Value::Array(_) => Ok(ImportPayload::Tuples(normalize_records(value)?)),
        other => Err(GraphError::MalformedImport(format!(
            "expected a graph document or an array of tuple records, found {}",
            type_name(other)
        ))),
    }
}

/// Parses raw import bytes and probes their shape.
pub fn parse_import(bytes: &[u8]) -> GraphResult<ImportPayload> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| GraphError::MalformedImport(format!("not valid JSON: {}", e)))?;
    probe_import(&value)
}

/// Exports edges as `{subject, relation, object}` records using node labels.
pub fn export_tuples(document: &GraphDocument) -> Vec<Triple> {
    let labels: HashMap<&str, &str> = document
        .nodes
        .iter()
        .map(|n| (n.id.as_str(), n.label.as_str()))
        .collect();
    let label_of = |id: &str| labels.get(id).copied().unwrap_or(id).to_string();

    document
        .edges
        .iter()
        .map(|e| Triple {
            subject: label_of(&e.source),
            relation: e.label.clone(),
            object: label_of(&e.target),
        })
        .collect()
}
