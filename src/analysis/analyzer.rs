//! Role analyzers.
//!
//! An [`Analyzer`] turns one text run into an [`AnalysisResult`]: an ordered
//! list of tokens, each tagged with a [`SemanticRole`]. Two variants exist:
//!
//! - [`DependencyAnalyzer`] marks subject, predicate and object tokens from a
//!   dependency parse (used for Chinese text).
//! - [`PrefixAnalyzer`] marks the leading third of every word (bionic reading
//!   for alphabetic scripts).
//!
//! The variant is chosen once, from [`AnalysisMode`]; nothing downstream
//! branches on script.
//!
//! # Examples
//!
//! ```
//! use bionic_epub::analysis::analyzer::{Analyzer, PrefixAnalyzer};
//! use bionic_epub::analysis::role::SemanticRole;
//!
//! let analyzer = PrefixAnalyzer::new();
//! let result = analyzer.analyze("reading").unwrap();
//!
//! assert_eq!(result.spans[0].token.text, "rea");
//! assert_eq!(result.spans[0].role, SemanticRole::Emphasis);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::analysis::role::SemanticRole;
use crate::analysis::token::Token;
use crate::error::{BionicError, Result};

pub mod dependency;
pub mod prefix;

pub use dependency::{ArgumentSpan, DependencyAnalyzer};
pub use prefix::PrefixAnalyzer;

/// A token and the role assigned to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSpan {
    pub token: Token,
    pub role: SemanticRole,
}

impl RoleSpan {
    pub fn new(token: Token, role: SemanticRole) -> Self {
        RoleSpan { token, role }
    }
}

/// Ordered, non-overlapping role spans over one text run.
///
/// Offsets are byte offsets into the analyzed run. Spans need not cover the
/// run; the annotator fills any gap as unmarked text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub spans: Vec<RoleSpan>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: Token, role: SemanticRole) {
        self.spans.push(RoleSpan::new(token, role));
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RoleSpan> {
        self.spans.iter()
    }

    /// Roles in span order.
    pub fn roles(&self) -> Vec<SemanticRole> {
        self.spans.iter().map(|s| s.role).collect()
    }

    /// Spans that render as styled elements.
    pub fn marked(&self) -> impl Iterator<Item = &RoleSpan> {
        self.spans.iter().filter(|s| s.role.is_marked())
    }

    /// Append spans from a sub-run, shifting their offsets by `delta`.
    pub fn extend_shifted(&mut self, other: AnalysisResult, delta: usize) {
        let base = self.spans.len();
        self.spans
            .extend(other.spans.into_iter().enumerate().map(|(i, span)| {
                RoleSpan::new(
                    span.token.shifted(delta).with_position(base + i),
                    span.role,
                )
            }));
    }
}

impl IntoIterator for AnalysisResult {
    type Item = RoleSpan;
    type IntoIter = std::vec::IntoIter<RoleSpan>;

    fn into_iter(self) -> Self::IntoIter {
        self.spans.into_iter()
    }
}

/// Trait for role analyzers.
///
/// Implementations are shared by every worker of a run and must therefore be
/// usable through `&self` from several threads.
pub trait Analyzer: Send + Sync {
    /// Analyze one text run.
    ///
    /// Fails with an analysis error when the run cannot be analyzed; there is
    /// no degraded fallback.
    fn analyze(&self, text: &str) -> Result<AnalysisResult>;

    /// Get the name of this analyzer (for logging and reports).
    fn name(&self) -> &'static str;
}

/// Which analyzer variant a run uses.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Subject / predicate / object marking from a dependency parse.
    #[default]
    Svo,
    /// Bold the leading fraction of each word.
    Prefix,
}

impl AnalysisMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AnalysisMode::Svo => "svo",
            AnalysisMode::Prefix => "prefix",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisMode {
    type Err = BionicError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "svo" => Ok(AnalysisMode::Svo),
            "prefix" | "bionic" => Ok(AnalysisMode::Prefix),
            _ => Err(BionicError::invalid_config(format!(
                "unknown analysis mode '{s}' (expected 'svo' or 'prefix')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_mode_parsing() {
        assert_eq!("svo".parse::<AnalysisMode>().unwrap(), AnalysisMode::Svo);
        assert_eq!(
            "PREFIX".parse::<AnalysisMode>().unwrap(),
            AnalysisMode::Prefix
        );
        assert!("srl".parse::<AnalysisMode>().is_err());
        assert_eq!(AnalysisMode::default(), AnalysisMode::Svo);
        assert_eq!(AnalysisMode::Prefix.to_string(), "prefix");
    }

    #[test]
    fn test_analysis_mode_serde() {
        let mode: AnalysisMode = serde_json::from_str("\"prefix\"").unwrap();
        assert_eq!(mode, AnalysisMode::Prefix);
        assert_eq!(serde_json::to_string(&AnalysisMode::Svo).unwrap(), "\"svo\"");
    }

    #[test]
    fn test_extend_shifted() {
        let mut first = AnalysisResult::new();
        first.push(Token::with_offsets("他", 0, 0, 3), SemanticRole::Subject);

        let mut second = AnalysisResult::new();
        second.push(Token::with_offsets("走", 0, 0, 3), SemanticRole::Predicate);

        first.extend_shifted(second, 6);
        assert_eq!(first.len(), 2);
        assert_eq!(first.spans[1].token.start_offset, 6);
        assert_eq!(first.spans[1].token.end_offset, 9);
        assert_eq!(first.spans[1].token.position, 1);
        assert_eq!(
            first.roles(),
            vec![SemanticRole::Subject, SemanticRole::Predicate]
        );
        assert_eq!(first.marked().count(), 2);
    }
}
