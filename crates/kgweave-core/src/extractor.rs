//! Tuple extraction from free-form model output.
//!
//! The model is prompted to emit one `(subject, relation, object)` tuple per line,
//! usually under an enumerated list. Real output is noisy: list markers, prose lines,
//! JSON-ish `["a", "b", "c"]` arrays and parentheticals inside fields all show up.
//! Every top-level balanced `(...)` or `[...]` group is a candidate unit. A unit
//! becomes a [`Triple`] if it splits into exactly three non-empty fields; otherwise
//! the groups nested inside it are tried instead.

use tracing::debug;

use crate::error::{GraphError, GraphResult};
use crate::triple::Triple;

/// Extracts all well-formed triples from `text`, in source order.
///
/// Malformed units are skipped. Duplicates are kept.
pub fn extract_triples(text: &str) -> Vec<Triple> {
    let mut triples = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        for unit in candidate_units(line) {
            collect_unit(unit, line_no + 1, &mut triples);
        }
    }

    debug!(count = triples.len(), "Extracted triples from text");
    triples
}

fn collect_unit(unit: &str, line: usize, triples: &mut Vec<Triple>) {
    match parse_unit(unit) {
        Ok(triple) => triples.push(triple),
        Err(e) => {
            let nested = candidate_units(unit);
            if nested.is_empty() {
                debug!(line, error = %e, "Skipping tuple unit");
            }
            for inner in nested {
                collect_unit(inner, line, triples);
            }
        }
    }
}

fn is_opener(ch: char) -> bool {
    ch == '(' || ch == '['
}

/// Returns the inner text of every top-level balanced group in `text`.
///
/// An opener that is never closed is skipped and scanning resumes right after it.
fn candidate_units(text: &str) -> Vec<&str> {
    let mut units = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find(is_opener) {
        let inner = &rest[open + 1..];
        match closing_index(inner) {
            Some(close) => {
                units.push(&inner[..close]);
                rest = &inner[close + 1..];
            }
            None => rest = inner,
        }
    }
    units
}

/// Byte index of the bracket that closes a group whose opener precedes `inner`.
fn closing_index(inner: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quotes = false;

    for (idx, ch) in inner.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' | '[' if !in_quotes => depth += 1,
            ')' | ']' if !in_quotes => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

/// Parses the inside of one tuple unit, e.g. `Paris, capitalOf, France`.
pub fn parse_unit(unit: &str) -> GraphResult<Triple> {
    let fields = split_fields(unit);
    if fields.len() != 3 {
        return Err(GraphError::malformed_input(
            unit,
            format!("expected 3 fields, found {}", fields.len()),
        ));
    }

    let cleaned: Vec<&str> = fields.iter().map(|f| clean_field(f)).collect();
    Triple::new(cleaned[0], cleaned[1], cleaned[2])
}

/// Splits on commas outside double quotes and outside nested groups.
fn split_fields(unit: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut in_quotes = false;
    let mut depth = 0usize;
    let mut start = 0;

    for (idx, ch) in unit.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '(' | '[' if !in_quotes => depth += 1,
            ')' | ']' if !in_quotes => depth = depth.saturating_sub(1),
            ',' if !in_quotes && depth == 0 => {
                fields.push(&unit[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    fields.push(&unit[start..]);
    fields
}

fn clean_field(field: &str) -> &str {
    field
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
}
