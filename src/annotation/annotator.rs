//! Annotator: analysis output to annotated fragments.
//!
//! The annotator is where analyzer offsets meet the source text. Spans are
//! sorted, checked against the run (in bounds, on character boundaries, not
//! overlapping, same text as the source) and every gap between them is filled
//! with plain text, so the fragment always reproduces the run exactly.

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{AnalysisResult, RoleSpan};
use crate::analysis::role::SemanticRole;
use crate::annotation::fragment::{AnnotatedFragment, Segment};
use crate::error::{BionicError, Result};

/// CSS class per marked role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleClasses {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub emphasis: String,
}

impl Default for RoleClasses {
    fn default() -> Self {
        RoleClasses {
            subject: "svo-subject".to_string(),
            predicate: "svo-predicate".to_string(),
            object: "svo-object".to_string(),
            emphasis: "bionic-emphasis".to_string(),
        }
    }
}

impl RoleClasses {
    /// Class for a role; `None` for unmarked text.
    pub fn class_for(&self, role: SemanticRole) -> Option<&str> {
        match role {
            SemanticRole::Subject => Some(self.subject.as_str()),
            SemanticRole::Predicate => Some(self.predicate.as_str()),
            SemanticRole::Object => Some(self.object.as_str()),
            SemanticRole::Emphasis => Some(self.emphasis.as_str()),
            SemanticRole::Other => None,
        }
    }

    /// Every (role, class) pair.
    pub fn iter(&self) -> impl Iterator<Item = (SemanticRole, &str)> {
        SemanticRole::MARKED
            .into_iter()
            .filter_map(|role| self.class_for(role).map(|class| (role, class)))
    }

    /// Whether `class` is one of the annotation classes.
    pub fn contains(&self, class: &str) -> bool {
        self.iter().any(|(_, c)| c == class)
    }
}

/// Configuration for rendering annotations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    /// Inline element wrapping marked segments.
    pub tag: String,
    /// CSS classes per role.
    pub classes: RoleClasses,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        AnnotationConfig {
            tag: "span".to_string(),
            classes: RoleClasses::default(),
        }
    }
}

impl AnnotationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the element tag.
    pub fn tag<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = tag.into();
        self
    }

    /// Set the CSS classes.
    pub fn classes(mut self, classes: RoleClasses) -> Self {
        self.classes = classes;
        self
    }

    /// Build the opening tag for a role.
    pub fn opening_tag(&self, role: SemanticRole) -> String {
        match self.classes.class_for(role) {
            Some(class) => format!("<{} class=\"{}\">", self.tag, class),
            None => format!("<{}>", self.tag),
        }
    }

    /// Build the closing tag.
    pub fn closing_tag(&self) -> String {
        format!("</{}>", self.tag)
    }

    /// Check the configuration can produce well-formed markup.
    pub fn validate(&self) -> Result<()> {
        let valid_name = |s: &str| {
            !s.is_empty()
                && s
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        };

        if !valid_name(&self.tag) {
            return Err(BionicError::invalid_config(format!(
                "invalid annotation tag '{}'",
                self.tag
            )));
        }
        for (role, class) in self.classes.iter() {
            if !valid_name(class) {
                return Err(BionicError::invalid_config(format!(
                    "invalid class '{class}' for role {role}"
                )));
            }
        }
        Ok(())
    }
}

/// Converts analysis output into annotated fragments.
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    config: AnnotationConfig,
}

impl Annotator {
    pub fn new(config: AnnotationConfig) -> Self {
        Annotator { config }
    }

    pub fn config(&self) -> &AnnotationConfig {
        &self.config
    }

    /// Build the fragment for `text` from its analysis.
    pub fn annotate(&self, text: &str, analysis: &AnalysisResult) -> Result<AnnotatedFragment> {
        let mut spans: Vec<&RoleSpan> = analysis
            .iter()
            .filter(|s| s.token.start_offset != s.token.end_offset)
            .collect();
        spans.sort_by_key(|s| (s.token.start_offset, s.token.end_offset));

        let mut fragment = AnnotatedFragment::new();
        let mut cursor = 0;

        for span in spans {
            let token = &span.token;
            let (start, end) = (token.start_offset, token.end_offset);

            if start > end || end > text.len() {
                return Err(BionicError::analysis(format!(
                    "span {start}..{end} ('{}') is outside the text ({} bytes)",
                    token.text,
                    text.len()
                )));
            }
            if !text.is_char_boundary(start) || !text.is_char_boundary(end) {
                return Err(BionicError::analysis(format!(
                    "span {start}..{end} ('{}') does not fall on character boundaries",
                    token.text
                )));
            }
            if start < cursor {
                return Err(BionicError::analysis(format!(
                    "span {start}..{end} ('{}') overlaps the previous span ending at {cursor}",
                    token.text
                )));
            }
            if text[start..end] != token.text {
                return Err(BionicError::analysis(format!(
                    "span {start}..{end} is '{}' in the text but '{}' in the analysis",
                    &text[start..end],
                    token.text
                )));
            }

            fragment.push(Segment::plain(&text[cursor..start]));
            fragment.push(Segment::new(&text[start..end], span.role));
            cursor = end;
        }

        fragment.push(Segment::plain(&text[cursor..]));
        Ok(fragment)
    }
}
