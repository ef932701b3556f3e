//! Rewriting only wraps text: removing the annotation elements again must
//! give back the original tree.

use bionic_epub::analysis::AnalysisMode;
use bionic_epub::annotation::RoleClasses;
use bionic_epub::document::parser::parse_str;
use bionic_epub::document::{Document, NodeData, NodeId};
use bionic_epub::pipeline::{BionicConfig, BionicProcessor};

const PAGE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops" lang="en">
<head>
  <title>Chapter One</title>
  <style>p { margin: 0; }</style>
</head>
<body>
  <section epub:type="chapter" id="c1">
    <h1 class="title">Chapter <b>One</b></h1>
    <!-- opening -->
    <p id="p1">Reading <em class="x">quickly</em> is a <b>learned <i>skill</i></b>, not a gift.</p>
    <p>Fish &amp; chips<br/>cost <span class="note">twelve</span> pounds.</p>
    <pre>  keep   this
    verbatim  </pre>
    <p><a href="notes.xhtml#n1">Footnote</a> text after the link.</p>
  </section>
</body>
</html>"#;

#[derive(Debug, PartialEq, Eq)]
enum Shape {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<Shape>,
    },
    Text(String),
    Leaf(NodeData),
}

/// Shapes of the children of `id`, with annotation elements replaced by
/// their content and adjacent text merged.
fn shapes(document: &Document, id: NodeId, classes: &RoleClasses, unwrapped: &mut usize) -> Vec<Shape> {
    let mut out = Vec::new();
    for &child in document.children(id) {
        match document.data(child).unwrap() {
            NodeData::Element(element)
                if element.name.is("span")
                    && element
                        .attr("class")
                        .is_some_and(|c| c.split_ascii_whitespace().any(|c| classes.contains(c))) =>
            {
                *unwrapped += 1;
                for shape in shapes(document, child, classes, unwrapped) {
                    push(&mut out, shape);
                }
            }
            NodeData::Element(element) => push(
                &mut out,
                Shape::Element {
                    name: element.name.qualified(),
                    attrs: element
                        .attrs
                        .iter()
                        .map(|a| (a.name.qualified(), a.value.clone()))
                        .collect(),
                    children: shapes(document, child, classes, unwrapped),
                },
            ),
            NodeData::Text(text) => push(&mut out, Shape::Text(text.clone())),
            other => push(&mut out, Shape::Leaf(other.clone())),
        }
    }
    out
}

fn push(out: &mut Vec<Shape>, shape: Shape) {
    if let (Some(Shape::Text(last)), Shape::Text(text)) = (out.last_mut(), &shape) {
        last.push_str(text);
        return;
    }
    out.push(shape);
}

#[test]
fn test_unwrapping_annotations_restores_tree() {
    let original = parse_str(PAGE).unwrap();
    let mut rewritten = original.clone();

    let processor = BionicProcessor::new(
        BionicConfig::default()
            .with_mode(AnalysisMode::Prefix)
            .with_threads(1),
    )
    .unwrap();
    let stats = processor.process_document(&mut rewritten).unwrap();
    assert!(stats.annotated_runs > 0);

    let classes = RoleClasses::default();
    let mut unwrapped_original = 0;
    let before = shapes(&original, original.root(), &classes, &mut unwrapped_original);
    let mut unwrapped = 0;
    let after = shapes(&rewritten, rewritten.root(), &classes, &mut unwrapped);

    assert_eq!(unwrapped_original, 0);
    assert!(unwrapped > 0);
    assert_eq!(after, before);
    assert_eq!(rewritten.xml_declaration, original.xml_declaration);
}
