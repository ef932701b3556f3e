//! XML serialization of the document arena.
//!
//! Output is well-formed XML that XHTML reading systems accept:
//!
//! - text is escaped (`& < >`), attribute values additionally escape `"`;
//! - empty HTML void elements self-close (`<br/>`), other empty XHTML elements
//!   are written as open/close pairs (`<p></p>`), since `<p/>` breaks readers
//!   that parse content as HTML; empty elements outside XHTML self-close;
//! - namespace declarations are re-emitted wherever an element or attribute
//!   uses a namespace that is not declared in scope.

use crate::document::document::Document;
use crate::document::node::{ElementData, NodeData, NodeId, QualifiedName, XHTML_NAMESPACE};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Serialize a document to an XML string.
pub fn to_string(document: &Document) -> String {
    let mut writer = Writer {
        document,
        out: String::new(),
        scope: vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())],
    };

    let mut top_level = Vec::new();
    if let Some(declaration) = &document.xml_declaration {
        top_level.push(declaration.clone());
    }
    for child in document.children(document.root()) {
        if matches!(document.data(*child), Some(NodeData::Text(_))) {
            continue;
        }
        writer.out.clear();
        writer.write_node(*child);
        top_level.push(std::mem::take(&mut writer.out));
    }

    let mut out = top_level.join("\n");
    out.push('\n');
    out
}

/// Serialize a document to UTF-8 bytes.
pub fn to_bytes(document: &Document) -> Vec<u8> {
    to_string(document).into_bytes()
}

/// Serialize the subtree rooted at `id` (used for fragments and tests).
pub fn node_to_string(document: &Document, id: NodeId) -> String {
    let mut writer = Writer {
        document,
        out: String::new(),
        scope: vec![(Some("xml".to_string()), XML_NAMESPACE.to_string())],
    };
    writer.write_node(id);
    writer.out
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attribute(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

struct Writer<'a> {
    document: &'a Document,
    out: String,
    /// In-scope namespace bindings, innermost last.
    scope: Vec<(Option<String>, String)>,
}

impl Writer<'_> {
    fn lookup(&self, prefix: Option<&str>) -> Option<&str> {
        self.scope
            .iter()
            .rev()
            .find(|(p, _)| p.as_deref() == prefix)
            .map(|(_, ns)| ns.as_str())
    }

    fn write_node(&mut self, id: NodeId) {
        let document = self.document;
        let Some(data) = document.data(id) else {
            return;
        };

        match data {
            NodeData::Document => {
                for child in document.children(id) {
                    self.write_node(*child);
                }
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                self.out.push_str("<!DOCTYPE ");
                self.out.push_str(name);
                if !public_id.is_empty() {
                    self.out
                        .push_str(&format!(" PUBLIC \"{public_id}\" \"{system_id}\""));
                } else if !system_id.is_empty() {
                    self.out.push_str(&format!(" SYSTEM \"{system_id}\""));
                }
                self.out.push('>');
            }
            NodeData::Text(text) => self.out.push_str(&escape_text(text)),
            NodeData::Comment(text) => {
                self.out.push_str("<!--");
                self.out.push_str(text);
                self.out.push_str("-->");
            }
            NodeData::ProcessingInstruction { target, data } => {
                self.out.push_str("<?");
                self.out.push_str(target);
                if !data.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(data);
                }
                self.out.push_str("?>");
            }
            NodeData::Element(element) => self.write_element(id, element),
        }
    }

    /// Declarations an element needs beyond the ones it carries.
    fn missing_declarations(&self, element: &ElementData) -> Vec<(Option<String>, String)> {
        let mut required = vec![(
            element.name.prefix.as_deref(),
            element.name.namespace.as_str(),
        )];
        for attr in &element.attrs {
            if attr.declared_prefix().is_some() {
                continue;
            }
            if let Some(prefix) = attr.name.prefix.as_deref() {
                if prefix != "xml" && !attr.name.namespace.is_empty() {
                    required.push((Some(prefix), attr.name.namespace.as_str()));
                }
            }
        }

        let mut missing: Vec<(Option<String>, String)> = Vec::new();
        for (prefix, namespace) in required {
            let bound = missing
                .iter()
                .rev()
                .find(|(p, _)| p.as_deref() == prefix)
                .map(|(_, ns)| ns.as_str())
                .or_else(|| self.lookup(prefix));
            let satisfied = match bound {
                Some(ns) => ns == namespace,
                None => prefix.is_none() && namespace.is_empty(),
            };
            if !satisfied {
                missing.push((prefix.map(str::to_string), namespace.to_string()));
            }
        }

        missing
    }

    fn write_element(&mut self, id: NodeId, element: &ElementData) {
        let scope_len = self.scope.len();
        for attr in &element.attrs {
            if let Some(prefix) = attr.declared_prefix() {
                self.scope
                    .push((prefix.map(str::to_string), attr.value.clone()));
            }
        }
        let missing = self.missing_declarations(element);

        let name = element.name.qualified();
        self.out.push('<');
        self.out.push_str(&name);
        for (prefix, namespace) in &missing {
            match prefix {
                Some(prefix) => self.out.push_str(&format!(" xmlns:{prefix}=\"")),
                None => self.out.push_str(" xmlns=\""),
            }
            self.out.push_str(&escape_attribute(namespace));
            self.out.push('"');
        }
        for attr in &element.attrs {
            self.out.push(' ');
            self.out.push_str(&attr.name.qualified());
            self.out.push_str("=\"");
            self.out.push_str(&escape_attribute(&attr.value));
            self.out.push('"');
        }
        self.scope.extend(missing);

        let document = self.document;
        let children = document.children(id);
        if children.is_empty() && self_closes(&element.name) {
            self.out.push_str("/>");
        } else {
            self.out.push('>');
            for child in children {
                self.write_node(*child);
            }
            self.out.push_str("</");
            self.out.push_str(&name);
            self.out.push('>');
        }

        self.scope.truncate(scope_len);
    }
}

fn self_closes(name: &QualifiedName) -> bool {
    if name.namespace == XHTML_NAMESPACE || (name.namespace.is_empty() && is_html_name(name)) {
        VOID_ELEMENTS.iter().any(|v| name.is(v))
    } else {
        true
    }
}

/// Un-namespaced elements with HTML names are treated as HTML.
fn is_html_name(name: &QualifiedName) -> bool {
    name.prefix.is_none()
        && matches!(
            name.local.to_ascii_lowercase().as_str(),
            "html" | "head" | "body" | "p" | "div" | "span" | "a" | "em" | "strong" | "title"
                | "script" | "style" | "b" | "i" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
                | "li" | "ul" | "ol" | "td" | "tr" | "table" | "section" | "blockquote"
        )
        || VOID_ELEMENTS.iter().any(|v| name.is(v))
}
