//! The two triple producers behind one type.

use serde_json::Value;

use crate::builder::GraphBuilder;
use crate::document::ImportPayload;
use crate::error::GraphResult;
use crate::extractor::extract_triples;
use crate::graph::CandidateGraph;
use crate::normalizer::normalize_records;
use crate::triple::Triple;

/// Raw input that yields canonical triples.
#[derive(Debug, Clone)]
pub enum TripleSource {
    /// Model completion text.
    Text(String),
    /// An array of tuple-shaped JSON records.
    Json(Value),
}

impl TripleSource {
    /// Produces triples in source order. Only a non-array JSON source fails.
    pub fn triples(&self) -> GraphResult<Vec<Triple>> {
        match self {
            TripleSource::Text(text) => Ok(extract_triples(text)),
            TripleSource::Json(value) => normalize_records(value),
        }
    }

    /// Produces triples and runs them through `builder`.
    pub fn build(&self, builder: &GraphBuilder) -> GraphResult<CandidateGraph> {
        Ok(builder.build(&self.triples()?))
    }
}

impl ImportPayload {
    /// Candidate nodes and edges for this payload. Documents keep labels and colors
    /// but have their ids normalized.
    pub fn into_candidate(self, builder: &GraphBuilder) -> CandidateGraph {
        match self {
            ImportPayload::Document(content) => content.into_candidate(),
            ImportPayload::Tuples(triples) => builder.build(&triples),
        }
    }
}
