//! Text run extraction.
//!
//! Walks a document in order and yields the text leaves eligible for
//! annotation. A leaf is skipped when it is whitespace-only or sits below a
//! non-prose element (`script`, `style`, `pre`, `code`, ...). Text is yielded
//! verbatim; the extractor never trims or normalizes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::annotation::RoleClasses;
use crate::document::document::Document;
use crate::document::node::{NodeData, NodeId};

const DEFAULT_SKIP_ELEMENTS: &[&str] = &[
    "head", "title", "script", "style", "noscript", "template", "pre", "code", "svg", "math",
    "textarea",
];

/// Which parts of a document are annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Local element names whose subtrees are never annotated.
    pub skip_elements: BTreeSet<String>,
    /// Skip subtrees of elements that already carry an annotation class,
    /// and the text beside them.
    pub skip_annotated: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        ExtractionConfig {
            skip_elements: DEFAULT_SKIP_ELEMENTS.iter().map(|s| s.to_string()).collect(),
            skip_annotated: true,
        }
    }
}

impl ExtractionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element to the skip list.
    pub fn skip_element<S: AsRef<str>>(mut self, local: S) -> Self {
        self.skip_elements
            .insert(local.as_ref().to_ascii_lowercase());
        self
    }

    pub fn skip_annotated(mut self, skip: bool) -> Self {
        self.skip_annotated = skip;
        self
    }

    fn skips(&self, local: &str) -> bool {
        self.skip_elements
            .iter()
            .any(|s| s.eq_ignore_ascii_case(local))
    }
}

/// The text of one text node and the node it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    pub node: NodeId,
    pub text: String,
}

/// Lazy, document-order iterator over eligible text runs.
///
/// [`TextExtractor::restart`] yields the sequence again from the start.
#[derive(Debug, Clone)]
pub struct TextExtractor<'a> {
    document: &'a Document,
    config: &'a ExtractionConfig,
    classes: Option<&'a RoleClasses>,
    stack: Vec<NodeId>,
}

impl<'a> TextExtractor<'a> {
    pub fn new(document: &'a Document, config: &'a ExtractionConfig) -> Self {
        TextExtractor {
            document,
            config,
            classes: None,
            stack: vec![document.root()],
        }
    }

    /// Classes that mark already annotated elements.
    pub fn with_annotation_classes(mut self, classes: &'a RoleClasses) -> Self {
        self.classes = Some(classes);
        self
    }

    /// A fresh extractor over the same document.
    pub fn restart(&self) -> Self {
        TextExtractor {
            stack: vec![self.document.root()],
            ..self.clone()
        }
    }

    fn is_annotated(&self, id: NodeId) -> bool {
        match (self.classes, self.document.element(id)) {
            (Some(classes), Some(element)) if self.config.skip_annotated => {
                classes.iter().any(|(_, class)| element.has_class(class))
            }
            _ => false,
        }
    }

    fn descend(&self, id: NodeId) -> bool {
        match self.document.data(id) {
            Some(NodeData::Element(element)) => {
                !self.config.skips(&element.name.local) && !self.is_annotated(id)
            }
            Some(NodeData::Document) => true,
            _ => false,
        }
    }
}

impl Iterator for TextExtractor<'_> {
    type Item = TextRun;

    fn next(&mut self) -> Option<TextRun> {
        while let Some(id) = self.stack.pop() {
            if let Some(NodeData::Text(text)) = self.document.data(id) {
                if text.chars().all(char::is_whitespace) {
                    continue;
                }
                return Some(TextRun {
                    node: id,
                    text: text.clone(),
                });
            }

            if self.descend(id) {
                let document = self.document;
                let children = document.children(id);
                // Text next to an annotation is the unmarked rest of a run
                // annotated earlier.
                let annotated = children.iter().any(|c| self.is_annotated(*c));
                self.stack.extend(children.iter().rev().copied().filter(|c| {
                    !(annotated && matches!(document.data(*c), Some(NodeData::Text(_))))
                }));
            }
        }
        None
    }
}
