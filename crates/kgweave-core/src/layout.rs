//! Named layouts understood by the graph renderer.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Layout {
    /// Force-directed ("Simple")
    #[default]
    Fcose,
    /// Layered ("Hierarchical")
    Dagre,
    /// Circular ("Circle")
    Avsdf,
}

impl Layout {
    pub const ALL: [Layout; 3] = [Layout::Fcose, Layout::Dagre, Layout::Avsdf];

    /// Name persisted in documents.
    pub fn as_str(&self) -> &'static str {
        match self {
            Layout::Fcose => "FCOSE",
            Layout::Dagre => "DAGRE",
            Layout::Avsdf => "AVSDF",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Layout::Fcose => "Simple",
            Layout::Dagre => "Hierarchical",
            Layout::Avsdf => "Circle",
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Layout {
    type Err = String;

    /// Accepts the persisted name or the display name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Layout::ALL
            .into_iter()
            .find(|l| l.as_str().eq_ignore_ascii_case(s) || l.display_name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown layout '{}'", s))
    }
}
