//! Tolerant mapping of imported JSON tuple records onto [`Triple`]s.

use serde_json::Value;
use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::triple::Triple;

/// Accepted keys for the subject position, checked in order.
pub const SUBJECT_ALIASES: &[&str] = &["subject", "from", "source", "head", "entity1", "s"];
/// Accepted keys for the relation position, checked in order.
pub const RELATION_ALIASES: &[&str] = &["relation", "rel", "predicate", "relationship", "label", "edge", "p"];
/// Accepted keys for the object position, checked in order.
pub const OBJECT_ALIASES: &[&str] = &["object", "to", "target", "tail", "entity2", "o"];

/// Normalizes an array of tuple-shaped records.
///
/// Each element may be an object using any of the alias keys, or a plain
/// three-element array. Records that cannot be resolved are skipped; only a
/// non-array top-level value is an error.
pub fn normalize_records(value: &Value) -> GraphResult<Vec<Triple>> {
    let records = value.as_array().ok_or_else(|| {
        GraphError::MalformedImport(format!(
            "expected an array of tuple records, found {}",
            type_name(value)
        ))
    })?;

    let triples: Vec<Triple> = records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| match normalize_record(record) {
            Ok(triple) => Some(triple),
            Err(e) => {
                debug!(index = idx, error = %e, "Skipping import record");
                None
            }
        })
        .collect();

    debug!(records = records.len(), triples = triples.len(), "Normalized import records");
    Ok(triples)
}

/// Resolves one record into a triple.
pub fn normalize_record(record: &Value) -> GraphResult<Triple> {
    match record {
        Value::Object(map) => {
            let resolve = |aliases: &[&str]| {
                aliases
                    .iter()
                    .find_map(|key| map.get(*key).and_then(coerce_to_string))
            };
            match (
                resolve(SUBJECT_ALIASES),
                resolve(RELATION_ALIASES),
                resolve(OBJECT_ALIASES),
            ) {
                (Some(s), Some(r), Some(o)) => Triple::new(s, r, o),
                _ => Err(GraphError::malformed_input(
                    record.to_string(),
                    "missing subject, relation or object",
                )),
            }
        }
        Value::Array(items) if items.len() == 3 => {
            let fields: Vec<String> = items.iter().filter_map(coerce_to_string).collect();
            if fields.len() != 3 {
                return Err(GraphError::malformed_input(record.to_string(), "null tuple field"));
            }
            Triple::new(&fields[0], &fields[1], &fields[2])
        }
        other => Err(GraphError::malformed_input(
            other.to_string(),
            format!("unsupported record type {}", type_name(other)),
        )),
    }
}

/// String form of a JSON scalar or compound value; `null` resolves to nothing.
fn coerce_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        compound => Some(compound.to_string()),
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
