//! Splicing annotated fragments back into a document.
//!
//! Each target text leaf is replaced, in place, by the nodes of its fragment:
//! plain segments become text nodes and marked segments become inline
//! elements with a role class. Nothing else in the tree changes. Every target
//! is checked before the first mutation, so a failed rewrite leaves the
//! document untouched.

use std::collections::HashSet;

use crate::annotation::{AnnotatedFragment, AnnotationConfig};
use crate::document::document::Document;
use crate::document::extractor::TextRun;
use crate::document::node::{Attribute, NodeData, NodeId, QualifiedName};
use crate::error::{BionicError, Result};

/// Replaces text leaves with annotated nodes.
#[derive(Debug, Clone)]
pub struct DocumentRewriter<'a> {
    config: &'a AnnotationConfig,
}

impl<'a> DocumentRewriter<'a> {
    pub fn new(config: &'a AnnotationConfig) -> Self {
        DocumentRewriter { config }
    }

    /// Apply all edits, or none.
    ///
    /// Returns the number of leaves replaced; plain fragments leave their
    /// leaf as it is.
    pub fn rewrite(
        &self,
        document: &mut Document,
        edits: &[(TextRun, AnnotatedFragment)],
    ) -> Result<usize> {
        let mut seen = HashSet::new();
        for (run, fragment) in edits {
            self.check_target(document, run, fragment)?;
            if !seen.insert(run.node) {
                return Err(BionicError::structural_mismatch(format!(
                    "text node {} is targeted twice",
                    run.node
                )));
            }
        }

        let mut replaced = 0;
        for (run, fragment) in edits {
            if fragment.is_plain() {
                continue;
            }
            let nodes = self.build_nodes(document, run.node, fragment)?;
            document.replace_with(run.node, &nodes)?;
            replaced += 1;
        }

        Ok(replaced)
    }

    fn check_target(
        &self,
        document: &Document,
        run: &TextRun,
        fragment: &AnnotatedFragment,
    ) -> Result<()> {
        let node = document.get(run.node).ok_or_else(|| {
            BionicError::structural_mismatch(format!("text node {} does not exist", run.node))
        })?;

        match &node.data {
            NodeData::Text(text) if *text == run.text => {}
            NodeData::Text(_) => {
                return Err(BionicError::structural_mismatch(format!(
                    "text node {} no longer holds the extracted text",
                    run.node
                )));
            }
            _ => {
                return Err(BionicError::structural_mismatch(format!(
                    "node {} is not a text node",
                    run.node
                )));
            }
        }

        if document.index_in_parent(run.node).is_none() {
            return Err(BionicError::structural_mismatch(format!(
                "text node {} is detached from the document",
                run.node
            )));
        }

        if fragment.text() != run.text {
            return Err(BionicError::structural_mismatch(format!(
                "fragment for node {} does not reproduce its text",
                run.node
            )));
        }

        Ok(())
    }

    fn build_nodes(
        &self,
        document: &mut Document,
        target: NodeId,
        fragment: &AnnotatedFragment,
    ) -> Result<Vec<NodeId>> {
        let element_name = self.element_name(document, target);

        let mut nodes = Vec::with_capacity(fragment.len());
        for segment in &fragment.segments {
            let class = segment
                .role
                .and_then(|role| self.config.classes.class_for(role));
            match class {
                Some(class) => {
                    let element = document.create_element(
                        element_name.clone(),
                        vec![Attribute::new("class", class)],
                    );
                    let text = document.create_text(segment.text.as_str());
                    document.append_child(element, text)?;
                    nodes.push(element);
                }
                None => nodes.push(document.create_text(segment.text.as_str())),
            }
        }
        Ok(nodes)
    }

    /// The inline element name, in the namespace of the target's parent.
    fn element_name(&self, document: &Document, target: NodeId) -> QualifiedName {
        let parent_name = document
            .parent(target)
            .and_then(|p| document.element(p))
            .map(|e| &e.name);

        match parent_name {
            Some(name) => QualifiedName {
                prefix: name.prefix.clone(),
                namespace: name.namespace.clone(),
                local: self.config.tag.clone(),
            },
            None => QualifiedName::local(self.config.tag.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::role::SemanticRole;
    use crate::annotation::Segment;
    use crate::document::extractor::{ExtractionConfig, TextExtractor};
    use crate::document::parser::parse_str;
    use crate::document::serializer::to_string;

    const PAGE: &str = r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p id="x">他吃了苹果。</p><p>plain</p></body></html>"#;

    fn fragment(parts: &[(&str, SemanticRole)]) -> AnnotatedFragment {
        let mut fragment = AnnotatedFragment::new();
        for (text, role) in parts {
            fragment.push(Segment::new(*text, *role));
        }
        fragment
    }

    fn runs(doc: &Document) -> Vec<TextRun> {
        let config = ExtractionConfig::default();
        TextExtractor::new(doc, &config).collect()
    }

    #[test]
    fn test_rewrite_in_place() {
        let mut doc = parse_str(PAGE).unwrap();
        let runs = runs(&doc);
        let config = AnnotationConfig::default();

        let edits = vec![
            (
                runs[0].clone(),
                fragment(&[
                    ("他", SemanticRole::Subject),
                    ("吃", SemanticRole::Predicate),
                    ("了", SemanticRole::Other),
                    ("苹果", SemanticRole::Object),
                    ("。", SemanticRole::Other),
                ]),
            ),
            (runs[1].clone(), fragment(&[("plain", SemanticRole::Other)])),
        ];

        let replaced = DocumentRewriter::new(&config).rewrite(&mut doc, &edits).unwrap();
        assert_eq!(replaced, 1);

        let out = to_string(&doc);
        assert!(out.contains(
            "<p id=\"x\"><span class=\"svo-subject\">他</span><span class=\"svo-predicate\">吃</span>了<span class=\"svo-object\">苹果</span>。</p>"
        ));
        assert!(out.contains("<p>plain</p>"));
        assert_eq!(out.matches("xmlns=").count(), 1);
    }

    #[test]
    fn test_stale_target_leaves_document_unchanged() {
        let mut doc = parse_str(PAGE).unwrap();
        let before = doc.clone();
        let runs = runs(&doc);
        let config = AnnotationConfig::default();

        let mut stale = runs[1].clone();
        stale.text = "changed".to_string();
        let edits = vec![
            (runs[0].clone(), fragment(&[("他吃了苹果。", SemanticRole::Subject)])),
            (stale, fragment(&[("changed", SemanticRole::Subject)])),
        ];

        let err = DocumentRewriter::new(&config)
            .rewrite(&mut doc, &edits)
            .unwrap_err();
        assert!(err.is_structural_mismatch());
        assert_eq!(doc, before);
    }

    #[test]
    fn test_rejects_missing_and_non_text_nodes() {
        let mut doc = parse_str(PAGE).unwrap();
        let config = AnnotationConfig::default();
        let rewriter = DocumentRewriter::new(&config);

        let missing = TextRun {
            node: NodeId(10_000),
            text: "x".to_string(),
        };
        assert!(
            rewriter
                .rewrite(&mut doc, &[(missing, fragment(&[("x", SemanticRole::Subject)]))])
                .unwrap_err()
                .is_structural_mismatch()
        );

        let p = doc.first_element("p").unwrap();
        let element = TextRun {
            node: p,
            text: "x".to_string(),
        };
        assert!(
            rewriter
                .rewrite(&mut doc, &[(element, fragment(&[("x", SemanticRole::Subject)]))])
                .is_err()
        );
    }

    #[test]
    fn test_rejects_fragment_that_changes_text() {
        let mut doc = parse_str(PAGE).unwrap();
        let runs = runs(&doc);
        let config = AnnotationConfig::default();
        let edits = vec![(runs[0].clone(), fragment(&[("他", SemanticRole::Subject)]))];
        assert!(
            DocumentRewriter::new(&config)
                .rewrite(&mut doc, &edits)
                .unwrap_err()
                .is_structural_mismatch()
        );
    }

    #[test]
    fn test_detached_target_is_rejected() {
        let mut doc = parse_str(PAGE).unwrap();
        let runs = runs(&doc);
        let config = AnnotationConfig::default();
        let rewriter = DocumentRewriter::new(&config);
        let edit = (
            runs[0].clone(),
            fragment(&[("他", SemanticRole::Subject), ("吃了苹果。", SemanticRole::Other)]),
        );

        rewriter.rewrite(&mut doc, std::slice::from_ref(&edit)).unwrap();
        assert!(
            rewriter
                .rewrite(&mut doc, &[edit])
                .unwrap_err()
                .is_structural_mismatch()
        );
    }
}
