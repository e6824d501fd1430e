//! kgweave core
//!
//! Turns noisy model output or imported JSON into a deduplicated knowledge graph.
//! Everything in this crate is synchronous and free of I/O:
//!
//! text / JSON → [`TripleSource`] → [`Triple`]s → [`GraphBuilder`] → [`CandidateGraph`]
//! → [`GraphStore`] → [`GraphDocument`]

pub mod builder;
pub mod document;
pub mod error;
pub mod extractor;
pub mod graph;
pub mod layout;
pub mod normalizer;
pub mod source;
pub mod store;
pub mod triple;

// Re-export key types
pub use builder::{ColorRule, GraphBuilder, DEFAULT_COLOR};
pub use document::{export_tuples, parse_import, probe_import, GraphContent, ImportPayload};
pub use error::{GraphError, GraphResult};
pub use extractor::extract_triples;
pub use graph::{CandidateGraph, Edge, EdgeKey, GraphDocument, Node};
pub use layout::Layout;
pub use normalizer::normalize_records;
pub use source::TripleSource;
pub use store::{reduce, GraphAction, GraphStore, MergeSummary};
pub use triple::{normalize_id, Triple};
