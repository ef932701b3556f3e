//! XHTML parsing into the document arena.
//!
//! Content documents are parsed with `xml5ever` into a `markup5ever_rcdom`
//! tree, which is then copied into a [`Document`]. The XML declaration is not
//! part of the DOM, so it is captured verbatim from the source.

use markup5ever_rcdom::{Handle, NodeData as DomNodeData, RcDom};
use xml5ever::QualName;
use xml5ever::driver::{XmlParseOpts, parse_document};
use xml5ever::tendril::TendrilSink;

use crate::document::document::Document;
use crate::document::node::{Attribute, ElementData, NodeData, NodeId, QualifiedName};
use crate::error::{BionicError, Result};

/// Parse UTF-8 bytes (an optional byte order mark is dropped).
pub fn parse_bytes(bytes: &[u8]) -> Result<Document> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|e| BionicError::package(format!("content document is not UTF-8: {e}")))?;
    parse_str(text)
}

/// Parse an XHTML/XML document.
pub fn parse_str(input: &str) -> Result<Document> {
    let dom = parse_document(RcDom::default(), XmlParseOpts::default()).one(input);

    let mut document = Document::new();
    document.xml_declaration = xml_declaration(input).map(str::to_string);

    let mut stack: Vec<(Handle, NodeId)> = dom
        .document
        .children
        .borrow()
        .iter()
        .rev()
        .map(|child| (child.clone(), document.root()))
        .collect();

    while let Some((handle, parent)) = stack.pop() {
        let Some(data) = convert(&handle) else {
            continue;
        };
        let id = document.create(data);
        document.append_child(parent, id)?;

        for child in handle.children.borrow().iter().rev() {
            stack.push((child.clone(), id));
        }
    }

    if document.children(document.root()).is_empty() {
        return Err(BionicError::package("content document is empty"));
    }

    Ok(document)
}

fn convert(handle: &Handle) -> Option<NodeData> {
    match &handle.data {
        DomNodeData::Document => None,
        DomNodeData::Doctype {
            name,
            public_id,
            system_id,
        } => Some(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }),
        DomNodeData::Text { contents } => Some(NodeData::Text(contents.borrow().to_string())),
        DomNodeData::Comment { contents } => Some(NodeData::Comment(contents.to_string())),
        DomNodeData::ProcessingInstruction { target, contents } => {
            if target.eq_ignore_ascii_case("xml") {
                None
            } else {
                Some(NodeData::ProcessingInstruction {
                    target: target.to_string(),
                    data: contents.to_string(),
                })
            }
        }
        DomNodeData::Element { name, attrs, .. } => Some(NodeData::Element(ElementData {
            name: convert_name(name),
            attrs: attrs
                .borrow()
                .iter()
                .map(|attr| Attribute {
                    name: convert_name(&attr.name),
                    value: attr.value.to_string(),
                })
                .collect(),
        })),
    }
}

fn convert_name(name: &QualName) -> QualifiedName {
    QualifiedName {
        prefix: name.prefix.as_ref().map(|p| p.to_string()),
        namespace: name.ns.to_string(),
        local: name.local.to_string(),
    }
}

/// The `<?xml ...?>` declaration at the very start of `input`, if any.
fn xml_declaration(input: &str) -> Option<&str> {
    let rest = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let after = rest.strip_prefix("<?xml")?;
    if !after.starts_with(|c: char| c.is_ascii_whitespace()) {
        return None;
    }
    let end = rest.find("?>")?;
    Some(&rest[..end + 2])
}
