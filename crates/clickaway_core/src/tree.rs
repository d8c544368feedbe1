//! Retained element tree
//!
//! The [`Document`] owns every element node in a slotmap arena. Nodes are
//! addressed by [`NodeId`], a cheap copyable key that stays valid until the
//! node is removed (stale keys simply stop resolving).
//!
//! # Example
//!
//! ```rust
//! use clickaway_core::tree::Document;
//!
//! let mut doc = Document::new();
//! let menu = doc.append_element(doc.root(), "div").unwrap();
//! let item = doc.append_element(menu, "button").unwrap();
//!
//! assert!(doc.contains(menu, item));
//! assert!(doc.contains(menu, menu));
//! assert!(!doc.contains(item, menu));
//! ```

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, Key, SlotMap};
use smallvec::SmallVec;
use thiserror::Error;

new_key_type! {
    /// Unique identifier for an element node
    pub struct NodeId;
}

impl NodeId {
    /// Convert to a raw u64 representation
    pub fn to_raw(self) -> u64 {
        self.data().as_ffi()
    }

    /// Create from a raw u64 representation created by `to_raw()`
    pub fn from_raw(raw: u64) -> Self {
        Self::from(slotmap::KeyData::from_ffi(raw))
    }
}

/// Errors raised by tree mutation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// The node key does not resolve to a live node
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),

    /// Appending would make a node its own ancestor
    #[error("appending {child:?} under {parent:?} would create a cycle")]
    WouldCycle { parent: NodeId, child: NodeId },

    /// The root can't be moved or removed
    #[error("the document root cannot be moved or removed")]
    RootImmutable,
}

/// Data stored for each element node
#[derive(Clone, Debug, Default)]
pub struct NodeData {
    /// Lowercase tag name (`div`, `button`, ...)
    pub tag: String,
    /// Optional string ID (matched by `#id`)
    pub id: Option<String>,
    /// Class list (matched by `.class`)
    pub classes: SmallVec<[String; 4]>,
    /// Arbitrary attributes (matched by `[name]` / `[name=value]`)
    pub attributes: FxHashMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    markers: SmallVec<[&'static str; 2]>,
}

impl NodeData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Default::default()
        }
    }

    /// Parent node, if attached
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in document order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Check whether the class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }
}

/// Arena of element nodes with a single root
pub struct Document {
    nodes: SlotMap<NodeId, NodeData>,
    root: NodeId,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document containing only a `body` root
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(NodeData::new("body"));
        Self { nodes, root }
    }

    /// The root node
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node's data
    pub fn node(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Check if a node exists (attached or not)
    pub fn exists(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Get the number of live nodes, including the root
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A document always has its root, so this is never true
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Create a detached element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.nodes.insert(NodeData::new(tag))
    }

    /// Create an element and append it to `parent`
    pub fn append_element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, TreeError> {
        if !self.exists(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        let child = self.create_element(tag);
        self.append_child(parent, child)?;
        Ok(child)
    }

    /// Append `child` as the last child of `parent`
    ///
    /// A child that is already attached elsewhere is moved.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), TreeError> {
        if !self.exists(parent) {
            return Err(TreeError::NodeNotFound(parent));
        }
        if !self.exists(child) {
            return Err(TreeError::NodeNotFound(child));
        }
        if child == self.root {
            return Err(TreeError::RootImmutable);
        }
        if self.contains(child, parent) {
            return Err(TreeError::WouldCycle { parent, child });
        }

        self.detach(child);
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        Ok(())
    }

    /// Unlink a node from its parent, keeping its subtree intact
    fn detach(&mut self, node: NodeId) {
        let Some(parent) = self.nodes.get(node).and_then(|n| n.parent) else {
            return;
        };
        if let Some(parent_data) = self.nodes.get_mut(parent) {
            parent_data.children.retain(|&c| c != node);
        }
        self.nodes[node].parent = None;
    }

    /// Remove a node and all its descendants
    pub fn remove_subtree(&mut self, node: NodeId) -> Result<(), TreeError> {
        if node == self.root {
            return Err(TreeError::RootImmutable);
        }
        if !self.exists(node) {
            return Err(TreeError::NodeNotFound(node));
        }

        self.detach(node);

        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.remove(current) {
                stack.extend(data.children);
            }
        }
        Ok(())
    }

    /// Set the string ID of a node
    pub fn set_id(&mut self, node: NodeId, id: impl Into<String>) -> Result<(), TreeError> {
        let data = self.nodes.get_mut(node).ok_or(TreeError::NodeNotFound(node))?;
        data.id = Some(id.into());
        Ok(())
    }

    /// Add a class to a node (duplicates are ignored)
    pub fn add_class(&mut self, node: NodeId, class: impl Into<String>) -> Result<(), TreeError> {
        let data = self.nodes.get_mut(node).ok_or(TreeError::NodeNotFound(node))?;
        let class = class.into();
        if !data.has_class(&class) {
            data.classes.push(class);
        }
        Ok(())
    }

    /// Set an attribute on a node
    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), TreeError> {
        let data = self.nodes.get_mut(node).ok_or(TreeError::NodeNotFound(node))?;
        data.attributes.insert(name.into(), value.into());
        Ok(())
    }

    // =========================================================================
    // Markers
    // =========================================================================

    /// Attach a marker flag to a node
    ///
    /// Returns false if the node does not exist.
    pub fn set_marker(&mut self, node: NodeId, marker: &'static str) -> bool {
        let Some(data) = self.nodes.get_mut(node) else {
            return false;
        };
        if !data.markers.contains(&marker) {
            data.markers.push(marker);
        }
        true
    }

    /// Remove a marker flag from a node
    pub fn clear_marker(&mut self, node: NodeId, marker: &'static str) {
        if let Some(data) = self.nodes.get_mut(node) {
            data.markers.retain(|m| *m != marker);
        }
    }

    /// Check whether a node carries a marker flag
    pub fn has_marker(&self, node: NodeId, marker: &'static str) -> bool {
        self.nodes
            .get(node)
            .is_some_and(|data| data.markers.contains(&marker))
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    /// Parent of a node
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node)?.parent
    }

    /// Children of a node in document order
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node)
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    /// Ancestors from the immediate parent up to the topmost node
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.parent(node),
        }
    }

    /// Check if `node` is `ancestor` itself or one of its descendants
    ///
    /// Stale keys never match.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        if !self.exists(ancestor) || !self.exists(node) {
            return false;
        }
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Check if a node is reachable from the root
    pub fn is_connected(&self, node: NodeId) -> bool {
        self.contains(self.root, node)
    }

    /// Every connected node in document (pre-)order, starting at the root
    pub fn descendants(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.parent(current);
        Some(current)
    }
}
