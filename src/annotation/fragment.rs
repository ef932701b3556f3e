//! Annotated fragments.

use serde::{Deserialize, Serialize};

use crate::analysis::role::SemanticRole;
use crate::annotation::annotator::AnnotationConfig;

/// One piece of an annotated run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Exact substring of the source run.
    pub text: String,
    /// Role to render, or `None` for plain text.
    pub role: Option<SemanticRole>,
}

impl Segment {
    pub fn new<S: Into<String>>(text: S, role: SemanticRole) -> Self {
        Segment {
            text: text.into(),
            role: role.is_marked().then_some(role),
        }
    }

    pub fn plain<S: Into<String>>(text: S) -> Self {
        Segment {
            text: text.into(),
            role: None,
        }
    }

    pub fn is_marked(&self) -> bool {
        self.role.is_some()
    }
}

/// A text run split into plain and role-tagged segments.
///
/// Concatenating the segment texts yields the source run byte for byte.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedFragment {
    pub segments: Vec<Segment>,
}

impl AnnotatedFragment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment, merging it into the previous one when the roles match.
    pub fn push(&mut self, segment: Segment) {
        if segment.text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(last) if last.role == segment.role => last.text.push_str(&segment.text),
            _ => self.segments.push(segment),
        }
    }

    /// The reconstructed source text.
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    /// Whether no segment needs styling.
    pub fn is_plain(&self) -> bool {
        !self.segments.iter().any(Segment::is_marked)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments rendered with `role`.
    pub fn count_role(&self, role: SemanticRole) -> usize {
        self.segments
            .iter()
            .filter(|s| s.role == Some(role))
            .count()
    }

    /// Render as escaped inline markup.
    ///
    /// Used for previews and logging; documents are rewritten through the tree,
    /// not through this string.
    pub fn to_markup(&self, config: &AnnotationConfig) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment.role {
                Some(role) => {
                    out.push_str(&config.opening_tag(role));
                    out.push_str(&escape_text(&segment.text));
                    out.push_str(&config.closing_tag());
                }
                None => out.push_str(&escape_text(&segment.text)),
            }
        }
        out
    }
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
