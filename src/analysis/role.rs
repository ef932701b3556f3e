//! Semantic roles assigned to analyzed tokens.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::BionicError;

/// Role a span plays in the rendered output.
///
/// `Other` means "render unmarked"; every other role becomes a styled inline
/// element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SemanticRole {
    Subject,
    Predicate,
    Object,
    /// Leading fragment of a word in prefix (bionic) mode.
    Emphasis,
    Other,
}

impl SemanticRole {
    /// All roles that produce styled output.
    pub const MARKED: [SemanticRole; 4] = [
        SemanticRole::Subject,
        SemanticRole::Predicate,
        SemanticRole::Object,
        SemanticRole::Emphasis,
    ];

    /// Whether spans with this role are rendered as styled elements.
    pub fn is_marked(self) -> bool {
        self != SemanticRole::Other
    }

    /// Lowercase name used in configuration and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            SemanticRole::Subject => "subject",
            SemanticRole::Predicate => "predicate",
            SemanticRole::Object => "object",
            SemanticRole::Emphasis => "emphasis",
            SemanticRole::Other => "other",
        }
    }
}

impl fmt::Display for SemanticRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SemanticRole {
    type Err = BionicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "subject" => Ok(SemanticRole::Subject),
            "predicate" => Ok(SemanticRole::Predicate),
            "object" => Ok(SemanticRole::Object),
            "emphasis" => Ok(SemanticRole::Emphasis),
            "other" => Ok(SemanticRole::Other),
            _ => Err(BionicError::invalid_config(format!("unknown role '{s}'"))),
        }
    }
}
