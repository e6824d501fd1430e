//! The graph merge store: an explicit reducer over [`GraphDocument`].

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::graph::{CandidateGraph, EdgeKey, GraphDocument};

/// The two transitions the store accepts.
#[derive(Debug, Clone)]
pub enum GraphAction {
    AddNodesAndEdges(CandidateGraph),
    ClearGraph,
}

/// Counts of what a merge actually inserted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSummary {
    pub nodes_added: usize,
    pub edges_added: usize,
    pub edges_dropped: usize,
}

/// Sole owner of the current graph document.
///
/// The document only grows through [`GraphAction::AddNodesAndEdges`] and is only
/// reset through [`GraphAction::ClearGraph`]. Neither transition can fail.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    document: GraphDocument,
    node_ids: HashSet<String>,
    edge_keys: HashSet<EdgeKey>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self) -> &GraphDocument {
        &self.document
    }

    /// Applies one transition.
    pub fn dispatch(&mut self, action: GraphAction) -> MergeSummary {
        match action {
            GraphAction::AddNodesAndEdges(candidate) => self.merge(candidate),
            GraphAction::ClearGraph => {
                debug!(
                    nodes = self.document.nodes.len(),
                    edges = self.document.edges.len(),
                    "Clearing graph"
                );
                *self = Self::default();
                MergeSummary::default()
            }
        }
    }

    fn merge(&mut self, candidate: CandidateGraph) -> MergeSummary {
        let mut summary = MergeSummary::default();

        // First write wins: an existing node keeps its label and color.
        for node in candidate.nodes {
            if self.node_ids.insert(node.id.clone()) {
                self.document.nodes.push(node);
                summary.nodes_added += 1;
            }
        }

        for edge in candidate.edges {
            if !self.node_ids.contains(&edge.source) || !self.node_ids.contains(&edge.target) {
                summary.edges_dropped += 1;
                continue;
            }
            if self.edge_keys.insert(edge.key()) {
                self.document.edges.push(edge);
                summary.edges_added += 1;
            }
        }

        debug!(
            nodes_added = summary.nodes_added,
            edges_added = summary.edges_added,
            edges_dropped = summary.edges_dropped,
            "Merged candidate graph"
        );
        summary
    }
}

/// Functional form of [`GraphStore::dispatch`]: returns the next document.
pub fn reduce(state: &GraphDocument, action: GraphAction) -> GraphDocument {
    let mut store = GraphStore::new();
    store.dispatch(GraphAction::AddNodesAndEdges(state.clone().into()));
    store.dispatch(action);
    store.document
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Edge, Node};
    use pretty_assertions::assert_eq;

    fn node(id: &str, label: &str, color: &str) -> Node {
        Node {
            id: id.to_string(),
            label: label.to_string(),
            color: color.to_string(),
            kind: None,
        }
    }

    fn edge(s: &str, t: &str, l: &str) -> Edge {
        Edge {
            source: s.to_string(),
            target: t.to_string(),
            label: l.to_string(),
        }
    }

    #[test]
    fn test_first_write_wins_for_nodes() {
        let mut store = GraphStore::new();
        store.dispatch(GraphAction::AddNodesAndEdges(CandidateGraph {
            nodes: vec![node("paris", "Paris", "#111111")],
            edges: vec![],
        }));
        let summary = store.dispatch(GraphAction::AddNodesAndEdges(CandidateGraph {
            nodes: vec![node("paris", "PARIS", "#222222")],
            edges: vec![],
        }));

        assert_eq!(summary.nodes_added, 0);
        assert_eq!(store.document().nodes, vec![node("paris", "Paris", "#111111")]);
    }

    #[test]
    fn test_dangling_edges_are_dropped() {
        let mut store = GraphStore::new();
        let summary = store.dispatch(GraphAction::AddNodesAndEdges(CandidateGraph {
            nodes: vec![node("a", "A", "#1")],
            edges: vec![edge("a", "b", "r"), edge("a", "a", "self")],
        }));

        assert_eq!(summary.edges_dropped, 1);
        assert_eq!(store.document().edges, vec![edge("a", "a", "self")]);
    }

    #[test]
    fn test_edge_endpoints_may_come_from_earlier_merge() {
        let mut store = GraphStore::new();
        store.dispatch(GraphAction::AddNodesAndEdges(CandidateGraph {
            nodes: vec![node("a", "A", "#1"), node("b", "B", "#2")],
            edges: vec![],
        }));
        store.dispatch(GraphAction::AddNodesAndEdges(CandidateGraph {
            nodes: vec![],
            edges: vec![edge("a", "b", "r"), edge("a", "b", "r")],
        }));
        assert_eq!(store.document().edges.len(), 1);
    }

    #[test]
    fn test_clear_resets_indices() {
        let mut store = GraphStore::new();
        let candidate = CandidateGraph {
            nodes: vec![node("a", "A", "#1")],
            edges: vec![edge("a", "a", "r")],
        };
        store.dispatch(GraphAction::AddNodesAndEdges(candidate.clone()));
        store.dispatch(GraphAction::ClearGraph);
        assert!(store.document().is_empty());

        let summary = store.dispatch(GraphAction::AddNodesAndEdges(candidate));
        assert_eq!(summary.nodes_added, 1);
        assert_eq!(summary.edges_added, 1);
    }

    #[test]
    fn test_reduce_matches_dispatch() {
        let start = GraphDocument {
            nodes: vec![node("a", "A", "#1")],
            edges: vec![],
        };
        let next = reduce(
            &start,
            GraphAction::AddNodesAndEdges(CandidateGraph {
                nodes: vec![node("b", "B", "#2")],
                edges: vec![edge("a", "b", "r")],
            }),
        );
        assert_eq!(next.nodes.len(), 2);
        assert_eq!(next.edges, vec![edge("a", "b", "r")]);
        assert_eq!(reduce(&next, GraphAction::ClearGraph), GraphDocument::default());
    }
}
