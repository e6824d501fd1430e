//! Node, edge and document types for the knowledge graph.

use serde::{Deserialize, Serialize};

/// A graph vertex. `id` is the normalized entity name and the dedup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A directed, labelled connection between two node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub label: String,
}

/// Dedup key of an edge: the ordered `(source, target, label)` triple.
pub type EdgeKey = (String, String, String);

impl Edge {
    pub fn key(&self) -> EdgeKey {
        (self.source.clone(), self.target.clone(), self.label.clone())
    }
}

/// The deduplicated node/edge aggregate.
///
/// Nodes are unique by id and edges unique by [`EdgeKey`], both in insertion
/// order. Every edge endpoint names a node in the same document. Mutation goes
/// through [`crate::store::GraphStore`] only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl GraphDocument {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Nodes and edges produced by the builder or read from an import, not yet merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl From<GraphDocument> for CandidateGraph {
    fn from(doc: GraphDocument) -> Self {
        Self {
            nodes: doc.nodes,
            edges: doc.edges,
        }
    }
}
