//! Document arena.
//!
//! Nodes live in one vector and refer to each other by [`NodeId`]. Detached
//! nodes stay in the arena (ids are never reused) but are unreachable from
//! the root, so traversal and serialization ignore them.

use crate::document::node::{Attribute, ElementData, Node, NodeData, NodeId, QualifiedName};
use crate::error::{BionicError, Result};

/// A parsed XHTML/XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
    /// XML declaration exactly as it appeared in the source.
    pub xml_declaration: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only the document node.
    pub fn new() -> Self {
        Document {
            nodes: vec![Node::new(NodeData::Document)],
            xml_declaration: None,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes in the arena, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id.0)
            .ok_or_else(|| BionicError::structural_mismatch(format!("node {id} does not exist")))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(id.0)
            .ok_or_else(|| BionicError::structural_mismatch(format!("node {id} does not exist")))
    }

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.get(id).map(|n| &n.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        self.data(id).and_then(NodeData::as_element)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Add a detached node.
    pub fn create(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(data));
        id
    }

    pub fn create_element(&mut self, name: QualifiedName, attrs: Vec<Attribute>) -> NodeId {
        self.create(NodeData::Element(ElementData { name, attrs }))
    }

    pub fn create_text<S: Into<String>>(&mut self, text: S) -> NodeId {
        self.create(NodeData::Text(text.into()))
    }

    /// Append a detached node as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        if self.node(child)?.parent.is_some() {
            return Err(BionicError::structural_mismatch(format!(
                "node {child} is already attached"
            )));
        }
        self.node_mut(child)?.parent = Some(parent);
        self.node_mut(parent)?.children.push(child);
        Ok(())
    }

    /// Position of `id` among its parent's children.
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    /// Replace an attached node with detached `replacements`, in order.
    ///
    /// The replaced node is detached.
    pub fn replace_with(&mut self, id: NodeId, replacements: &[NodeId]) -> Result<()> {
        let parent = self
            .parent(id)
            .ok_or_else(|| BionicError::structural_mismatch(format!("node {id} is detached")))?;
        let index = self.index_in_parent(id).ok_or_else(|| {
            BionicError::structural_mismatch(format!("node {id} is missing from its parent"))
        })?;

        for replacement in replacements {
            if self.node(*replacement)?.parent.is_some() {
                return Err(BionicError::structural_mismatch(format!(
                    "replacement node {replacement} is already attached"
                )));
            }
        }
        for replacement in replacements {
            self.node_mut(*replacement)?.parent = Some(parent);
        }

        self.node_mut(parent)?
            .children
            .splice(index..=index, replacements.iter().copied());
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Nodes reachable from `id`, in document order, `id` included.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            document: self,
            stack: vec![id],
        }
    }

    /// Elements below the root whose local name matches, in document order.
    pub fn find_elements(&self, local: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .filter(|id| self.element(*id).is_some_and(|e| e.name.is(local)))
            .collect()
    }

    /// First element with the given local name.
    pub fn first_element(&self, local: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .find(|id| self.element(*id).is_some_and(|e| e.name.is(local)))
    }

    /// First child element of `parent` with the given local name.
    pub fn child_element(&self, parent: NodeId, local: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some_and(|e| e.name.is(local)))
    }

    /// Value of the un-prefixed attribute `name` on element `id`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|e| e.attr(name))
    }

    /// Set (or add) an un-prefixed attribute on element `id`.
    pub fn set_attribute<V: Into<String>>(&mut self, id: NodeId, name: &str, value: V) -> Result<()> {
        let value = value.into();
        match &mut self.node_mut(id)?.data {
            NodeData::Element(element) => {
                match element
                    .attrs
                    .iter_mut()
                    .find(|a| a.name.prefix.is_none() && a.name.local == name)
                {
                    Some(attr) => attr.value = value,
                    None => element.attrs.push(Attribute::new(name, value)),
                }
                Ok(())
            }
            _ => Err(BionicError::structural_mismatch(format!(
                "node {id} is not an element"
            ))),
        }
    }

    /// Concatenated text of all text nodes below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.data(n).and_then(NodeData::as_text))
            .collect()
    }

    /// Replace all children of `id` with a single text node.
    pub fn set_text_content<S: Into<String>>(&mut self, id: NodeId, text: S) -> Result<()> {
        let old = std::mem::take(&mut self.node_mut(id)?.children);
        for child in old {
            self.node_mut(child)?.parent = None;
        }
        let text = self.create_text(text);
        self.append_child(id, text)
    }
}

/// Depth-first, document-order iterator over a subtree.
#[derive(Debug, Clone)]
pub struct Descendants<'a> {
    document: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.document.children(id).iter().rev().copied());
        Some(id)
    }
}
