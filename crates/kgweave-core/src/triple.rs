//! The canonical (subject, relation, object) statement shared by every producer.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

use crate::error::{GraphError, GraphResult};

/// A normalized relational statement.
///
/// Fields are trimmed and guaranteed non-empty; construct through [`Triple::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: String,
    pub relation: String,
    pub object: String,
}

impl Triple {
    /// Builds a triple from raw fields, trimming each one.
    ///
    /// Fails with [`GraphError::MalformedInput`] if any field is empty after trimming.
    pub fn new(
        subject: impl AsRef<str>,
        relation: impl AsRef<str>,
        object: impl AsRef<str>,
    ) -> GraphResult<Self> {
        let subject = subject.as_ref().trim();
        let relation = relation.as_ref().trim();
        let object = object.as_ref().trim();

        for (name, value) in [("subject", subject), ("relation", relation), ("object", object)] {
            if value.is_empty() {
                return Err(GraphError::malformed_input(
                    format!("({}, {}, {})", subject, relation, object),
                    format!("empty {}", name),
                ));
            }
        }

        Ok(Self {
            subject: subject.to_string(),
            relation: relation.to_string(),
            object: object.to_string(),
        })
    }
}

impl Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.subject, self.relation, self.object)
    }
}

/// Case-normalized, whitespace-collapsed form of an entity name, used as node id.
pub fn normalize_id(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_fields() {
        let triple = Triple::new("  Paris ", "capitalOf\t", " France").unwrap();
        assert_eq!(triple.subject, "Paris");
        assert_eq!(triple.relation, "capitalOf");
        assert_eq!(triple.object, "France");
    }

    #[test]
    fn test_new_rejects_blank_field() {
        let err = Triple::new("Paris", "   ", "France").unwrap_err();
        assert!(matches!(err, GraphError::MalformedInput { .. }));
        assert!(err.to_string().contains("empty relation"));
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("New   York\tCity"), "new york city");
        assert_eq!(normalize_id("  PARIS "), "paris");
        assert_eq!(normalize_id(""), "");
    }

    #[test]
    fn test_display() {
        let triple = Triple::new("a", "b", "c").unwrap();
        assert_eq!(triple.to_string(), "(a, b, c)");
    }
}
