//! Converts triples into candidate nodes and edges.
//!
//! Node identity is [`normalize_id`] of the entity name; the first label seen for an
//! id wins. Colors are a pure function of the inferred kind and the node id, so the
//! same input always produces the same palette assignment.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::debug;

use crate::graph::{CandidateGraph, Edge, EdgeKey, Node};
use crate::triple::{normalize_id, Triple};

/// Palette for nodes first seen in subject position.
pub const SUBJECT_PALETTE: &[&str] = &["#4285F4", "#7E57C2", "#3949AB", "#00838F", "#5C6BC0"];
/// Palette for nodes first seen in object position.
pub const OBJECT_PALETTE: &[&str] = &["#34A853", "#FB8C00", "#E53935", "#F9A825", "#8D6E63"];
/// Palette indexed by first-letter bucket.
pub const INITIAL_PALETTE: &[&str] = &[
    "#EF5350", "#AB47BC", "#5C6BC0", "#29B6F6", "#26A69A", "#9CCC65", "#FFCA28", "#8D6E63",
];
/// Color used by [`ColorRule::Fixed`] when none is configured.
pub const DEFAULT_COLOR: &str = "#9AA0A6";

/// Kind-inference and color rule applied to newly synthesized nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ColorRule {
    /// Kind is the role of the first occurrence: `subject` or `object`.
    #[default]
    ByRole,
    /// Kind is a bucket of the id's first character.
    ByInitial,
    /// Every node gets the same color and kind `default`.
    Fixed(String),
}

impl ColorRule {
    /// Returns `(kind, color)` for a node id first seen in `role`.
    fn classify(&self, id: &str, role: Role) -> (String, String) {
        match self {
            ColorRule::ByRole => {
                let (kind, palette) = match role {
                    Role::Subject => ("subject", SUBJECT_PALETTE),
                    Role::Object => ("object", OBJECT_PALETTE),
                };
                (kind.to_string(), pick(palette, stable_index(kind, id)))
            }
            ColorRule::ByInitial => {
                let bucket = initial_bucket(id);
                let kind = match bucket {
                    Some(b) => format!("initial-{}", b),
                    None => "initial-other".to_string(),
                };
                let idx = bucket.map(|b| b as usize).unwrap_or(INITIAL_PALETTE.len() - 1);
                (kind, pick(INITIAL_PALETTE, idx))
            }
            ColorRule::Fixed(color) => ("default".to_string(), color.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Role {
    Subject,
    Object,
}

/// Turns triples into a [`CandidateGraph`].
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    rule: ColorRule,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new(ColorRule::default())
    }
}

impl GraphBuilder {
    pub fn new(rule: ColorRule) -> Self {
        Self { rule }
    }

    /// Builds candidate nodes and edges in triple order.
    ///
    /// Within the batch, nodes are unique by id and edges by key. The subject
    /// node is always emitted before the object node and both before the edge
    /// that references them.
    pub fn build(&self, triples: &[Triple]) -> CandidateGraph {
        let mut nodes: Vec<Node> = Vec::new();
        let mut node_ids: HashSet<String> = HashSet::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_keys: HashSet<EdgeKey> = HashSet::new();

        for triple in triples {
            let source = self.ensure_node(&mut nodes, &mut node_ids, &triple.subject, Role::Subject);
            let target = self.ensure_node(&mut nodes, &mut node_ids, &triple.object, Role::Object);

            let edge = Edge {
                source,
                target,
                label: triple.relation.clone(),
            };
            if edge_keys.insert(edge.key()) {
                edges.push(edge);
            }
        }

        debug!(
            triples = triples.len(),
            nodes = nodes.len(),
            edges = edges.len(),
            "Built candidate graph"
        );
        CandidateGraph { nodes, edges }
    }

    fn ensure_node(
        &self,
        nodes: &mut Vec<Node>,
        node_ids: &mut HashSet<String>,
        name: &str,
        role: Role,
    ) -> String {
        let id = normalize_id(name);
        if node_ids.insert(id.clone()) {
            let (kind, color) = self.rule.classify(&id, role);
            nodes.push(Node {
                id: id.clone(),
                label: name.trim().to_string(),
                color,
                kind: Some(kind),
            });
        }
        id
    }
}

fn pick(palette: &[&str], idx: usize) -> String {
    palette[idx % palette.len()].to_string()
}

/// Index derived from a SHA-256 digest of `kind:id`, stable across runs and platforms.
fn stable_index(kind: &str, id: &str) -> usize {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(id.as_bytes());
    let digest = hasher.finalize();
    u16::from_be_bytes([digest[0], digest[1]]) as usize
}

/// Buckets `a..z` into 7 groups of four letters; digits and others return `None`.
fn initial_bucket(id: &str) -> Option<u8> {
    let first = id.chars().next()?;
    if first.is_ascii_lowercase() {
        Some((first as u8 - b'a') / 4)
    } else {
        None
    }
}
