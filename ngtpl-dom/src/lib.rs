use std::cell::RefCell;

use indextree::Arena;

pub mod html;
pub mod parse;
pub mod style;
pub mod vnode;

pub use indextree::NodeId;
pub use parse::MarkupError;
pub use vnode::{Props, VNode, h, text};

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

impl Attr {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element { tag: String, attrs: Vec<Attr> },
    Text(String),
}

#[derive(Debug, thiserror::Error)]
pub enum DomError {
    #[error("invalid tree operation: {0:?}")]
    Hierarchy(indextree::NodeError),
}

impl From<indextree::NodeError> for DomError {
    fn from(e: indextree::NodeError) -> Self {
        DomError::Hierarchy(e)
    }
}

/// A mutable markup tree.
///
/// Nodes live in an arena and are addressed by [`NodeId`], which stays valid
/// after the node is detached. Every method borrows the arena only for its own
/// duration, so a `&Document` can be shared by several in-flight compiles on
/// one thread.
#[derive(Debug)]
pub struct Document {
    arena: RefCell<Arena<NodeData>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    pub fn new() -> Self {
        Self {
            arena: RefCell::new(Arena::new()),
        }
    }

    pub fn create_element(&self, tag: impl Into<String>) -> NodeId {
        self.arena.borrow_mut().new_node(NodeData::Element {
            tag: tag.into(),
            attrs: Vec::new(),
        })
    }

    pub fn create_text(&self, text: impl Into<String>) -> NodeId {
        self.arena.borrow_mut().new_node(NodeData::Text(text.into()))
    }

    pub fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        parent.checked_append(child, &mut self.arena.borrow_mut())?;
        Ok(())
    }

    /// Insert `node` as the previous sibling of `reference`.
    pub fn insert_before(&self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        reference.checked_insert_before(node, &mut self.arena.borrow_mut())?;
        Ok(())
    }

    /// Insert `node` as the next sibling of `reference`.
    pub fn insert_after(&self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        reference.checked_insert_after(node, &mut self.arena.borrow_mut())?;
        Ok(())
    }

    /// Detach `node` (and its subtree) from its parent. A node without a parent
    /// is left untouched.
    pub fn remove(&self, node: NodeId) {
        let mut arena = self.arena.borrow_mut();
        if arena[node].parent().is_some() {
            node.detach(&mut arena);
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.arena.borrow()[node].parent()
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        node.children(&self.arena.borrow()).collect()
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        node.children(&arena)
            .filter(|c| matches!(arena[*c].get(), NodeData::Element { .. }))
            .collect()
    }

    pub fn data(&self, node: NodeId) -> NodeData {
        self.arena.borrow()[node].get().clone()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        matches!(self.arena.borrow()[node].get(), NodeData::Element { .. })
    }

    pub fn tag(&self, node: NodeId) -> Option<String> {
        match self.arena.borrow()[node].get() {
            NodeData::Element { tag, .. } => Some(tag.clone()),
            NodeData::Text(_) => None,
        }
    }

    pub fn attrs(&self, node: NodeId) -> Vec<Attr> {
        match self.arena.borrow()[node].get() {
            NodeData::Element { attrs, .. } => attrs.clone(),
            NodeData::Text(_) => Vec::new(),
        }
    }

    /// Replace the whole attribute list of an element. No-op on text nodes.
    pub fn set_attrs(&self, node: NodeId, new_attrs: Vec<Attr>) {
        if let NodeData::Element { attrs, .. } = self.arena.borrow_mut()[node].get_mut() {
            *attrs = new_attrs;
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        match self.arena.borrow()[node].get() {
            NodeData::Element { attrs, .. } => attrs
                .iter()
                .find(|a| a.name == name)
                .map(|a| a.value.clone()),
            NodeData::Text(_) => None,
        }
    }

    /// Set an attribute, keeping its position when it already exists.
    pub fn set_attr(&self, node: NodeId, name: &str, value: impl Into<String>) {
        if let NodeData::Element { attrs, .. } = self.arena.borrow_mut()[node].get_mut() {
            upsert_attr(attrs, name, value.into());
        }
    }

    pub fn remove_attr(&self, node: NodeId, name: &str) {
        if let NodeData::Element { attrs, .. } = self.arena.borrow_mut()[node].get_mut() {
            attrs.retain(|a| a.name != name);
        }
    }

    pub fn text(&self, node: NodeId) -> Option<String> {
        match self.arena.borrow()[node].get() {
            NodeData::Text(t) => Some(t.clone()),
            NodeData::Element { .. } => None,
        }
    }

    pub fn set_text(&self, node: NodeId, value: impl Into<String>) {
        if let NodeData::Text(t) = self.arena.borrow_mut()[node].get_mut() {
            *t = value.into();
        }
    }

    /// Deep copy of `node`, attributes and descendants included. The copy is
    /// detached.
    pub fn deep_clone(&self, node: NodeId) -> NodeId {
        clone_subtree(&mut self.arena.borrow_mut(), node)
    }

    /// All elements below `root` (not `root` itself) with the given tag, in
    /// document order.
    pub fn descendants_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let arena = self.arena.borrow();
        root.descendants(&arena)
            .skip(1)
            .filter(|id| matches!(arena[*id].get(), NodeData::Element { tag: t, .. } if t == tag))
            .collect()
    }
}

pub(crate) fn upsert_attr(attrs: &mut Vec<Attr>, name: &str, value: String) {
    match attrs.iter_mut().find(|a| a.name == name) {
        Some(existing) => existing.value = value,
        None => attrs.push(Attr {
            name: name.to_string(),
            value,
        }),
    }
}

fn clone_subtree(arena: &mut Arena<NodeData>, node: NodeId) -> NodeId {
    let data = arena[node].get().clone();
    let copy = arena.new_node(data);
    let children: Vec<NodeId> = node.children(arena).collect();
    for child in children {
        let child_copy = clone_subtree(arena, child);
        copy.append(child_copy, arena);
    }
    copy
}
