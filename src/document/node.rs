//! Node types of the document arena.

use std::fmt;

/// XHTML namespace URI.
pub const XHTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// Index of a node in its [`Document`](crate::document::Document) arena.
///
/// Ids are only meaningful for the document that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The document node.
    pub const ROOT: NodeId = NodeId(0);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A namespace-qualified element or attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    /// Namespace URI; empty for no namespace.
    pub namespace: String,
    pub local: String,
}

impl QualifiedName {
    /// A name without prefix or namespace.
    pub fn local<S: Into<String>>(local: S) -> Self {
        QualifiedName {
            prefix: None,
            namespace: String::new(),
            local: local.into(),
        }
    }

    /// A name in the given namespace, without prefix.
    pub fn namespaced<N: Into<String>, S: Into<String>>(namespace: N, local: S) -> Self {
        QualifiedName {
            prefix: None,
            namespace: namespace.into(),
            local: local.into(),
        }
    }

    pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Whether the local name matches, ignoring ASCII case.
    pub fn is(&self, local: &str) -> bool {
        self.local.eq_ignore_ascii_case(local)
    }

    /// The name as written in markup (`prefix:local`).
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local),
            None => self.local.clone(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

/// An element attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

impl Attribute {
    pub fn new<S: Into<String>, V: Into<String>>(name: S, value: V) -> Self {
        Attribute {
            name: QualifiedName::local(name),
            value: value.into(),
        }
    }

    /// Whether this attribute declares a namespace (`xmlns` or `xmlns:p`).
    pub fn is_namespace_declaration(&self) -> bool {
        self.declared_prefix().is_some()
    }

    /// For a namespace declaration, the prefix it binds (`None` for the
    /// default namespace).
    pub fn declared_prefix(&self) -> Option<Option<&str>> {
        match self.name.prefix.as_deref() {
            Some("xmlns") => Some(Some(self.name.local.as_str())),
            Some(_) => None,
            None if self.name.local == "xmlns" => Some(None),
            None => self.name.local.strip_prefix("xmlns:").map(Some),
        }
    }
}

/// Element name and attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    pub name: QualifiedName,
    pub attrs: Vec<Attribute>,
}

impl ElementData {
    /// Value of the un-prefixed attribute `name`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.prefix.is_none() && a.name.local == name)
            .map(|a| a.value.as_str())
    }

    /// Whether the `class` attribute contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|c| c == class))
    }
}

/// Node payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    Document,
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    Element(ElementData),
    Text(String),
    Comment(String),
    ProcessingInstruction {
        target: String,
        data: String,
    },
}

impl NodeData {
    pub fn as_element(&self) -> Option<&ElementData> {
        match self {
            NodeData::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// A node in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Node {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let name = QualifiedName::namespaced("http://www.idpf.org/2007/ops", "type")
            .with_prefix("epub");
        assert_eq!(name.qualified(), "epub:type");
        assert!(QualifiedName::local("HEAD").is("head"));
    }

    #[test]
    fn test_namespace_declaration() {
        assert!(Attribute::new("xmlns", XHTML_NAMESPACE).is_namespace_declaration());
        let prefixed = Attribute {
            name: QualifiedName::local("epub").with_prefix("xmlns"),
            value: "http://www.idpf.org/2007/ops".to_string(),
        };
        assert!(prefixed.is_namespace_declaration());
        assert_eq!(prefixed.declared_prefix(), Some(Some("epub")));
        assert_eq!(Attribute::new("xmlns:m", "x").declared_prefix(), Some(Some("m")));
        assert!(!Attribute::new("class", "x").is_namespace_declaration());
    }

    #[test]
    fn test_has_class() {
        let element = ElementData {
            name: QualifiedName::local("span"),
            attrs: vec![Attribute::new("class", "note svo-subject")],
        };
        assert!(element.has_class("svo-subject"));
        assert!(!element.has_class("svo"));
        assert_eq!(element.attr("id"), None);
    }
}
