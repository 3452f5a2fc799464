//! Path-addressed document tree
//!
//! The document is an arena of nodes indexed by [`NodeId`]. Callers address
//! nodes by [`Path`] (child indices from the root), and every edit primitive
//! resolves its path to ids at the moment it runs. A path that no longer
//! resolves makes the edit a silent no-op, so a stale caller can never leave
//! the tree half-mutated.
//!
//! Slots of removed nodes are never reused, so an id kept across edits either
//! names the node it was issued for or nothing at all. The arena only grows
//! while a document is edited; [`Document::compacted`] rebuilds it with dense
//! ids when a long editing session has left many dead slots behind.
//!
//! ```text
//! Root
//! └── Table
//!     ├── Caption ── Text
//!     ├── Section(Head) ── Row ── Cell ── Paragraph ── Text
//!     └── Section(Body) ── Row ── Cell ── ...
//! ```

mod edit;
mod node;

pub use edit::Edit;
pub use node::{
    Align, CellAttrs, CellKind, Element, Mark, Node, NodeId, NodeKind, Path, Scope, SectionKind,
    TableAttrs, TextLeaf,
};

use std::ops::Range;

/// Path of the `index`-th child of the node at `parent`
pub fn child_path(parent: &[usize], index: usize) -> Path {
    let mut path = Vec::with_capacity(parent.len() + 1);
    path.extend_from_slice(parent);
    path.push(index);
    path
}

#[derive(Debug, Clone)]
struct Slot {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Arena-backed document tree
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Option<Slot>>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document holding only the root
    pub fn new() -> Self {
        Document {
            nodes: vec![Some(Slot {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            })],
            root: NodeId(0),
        }
    }

    /// Build a document whose root holds the given top-level nodes
    pub fn from_nodes(blocks: Vec<Node>) -> Self {
        let mut doc = Document::new();
        let root = doc.root;
        for block in blocks {
            let id = doc.alloc(block, Some(root));
            if let Some(slot) = doc.slot_mut(root) {
                slot.children.push(id);
            }
        }
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Slot {
            kind: node.kind,
            parent,
            children: Vec::new(),
        }));
        let children: Vec<NodeId> = node
            .children
            .into_iter()
            .map(|child| self.alloc(child, Some(id)))
            .collect();
        if let Some(slot) = self.slot_mut(id) {
            slot.children = children;
        }
        id
    }

    fn release(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0).and_then(Option::take) {
            Some(slot) => slot.children,
            None => return,
        };
        for child in children {
            self.release(child);
        }
    }

    /// Whether the id names a live node
    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.slot(id).map(|slot| &slot.kind)
    }

    /// Children of a node; empty for unknown ids
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|slot| slot.children.as_slice()).unwrap_or(&[])
    }

    pub fn child(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|slot| slot.parent)
    }

    /// Position of a node among its siblings
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Resolve a path to the node it names right now
    pub fn resolve(&self, path: &[usize]) -> Option<NodeId> {
        let mut current = self.root;
        for &index in path {
            current = self.child(current, index)?;
        }
        Some(current)
    }

    /// Path of a live node
    pub fn path_of(&self, id: NodeId) -> Option<Path> {
        if !self.contains(id) {
            return None;
        }
        let mut path = Vec::new();
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            path.push(self.index_in_parent(current)?);
            current = parent;
        }
        if current != self.root {
            return None;
        }
        path.reverse();
        Some(path)
    }

    /// Closest ancestor (or the node itself) matching the predicate
    pub fn ancestor_where<F>(&self, id: NodeId, pred: F) -> Option<NodeId>
    where
        F: Fn(&NodeKind) -> bool,
    {
        let mut current = Some(id);
        while let Some(node) = current {
            if pred(self.kind(node)?) {
                return Some(node);
            }
            current = self.parent(node);
        }
        None
    }

    /// Pre-order walk of a subtree, including its root
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.contains(node) {
                continue;
            }
            out.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        out
    }

    /// Every table in document order, nested tables included
    pub fn tables(&self) -> Vec<NodeId> {
        self.descendants(self.root)
            .into_iter()
            .filter(|&id| matches!(self.kind(id), Some(NodeKind::Table(_))))
            .collect()
    }

    /// Concatenated text of a subtree
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(leaf)) = self.kind(node) {
                out.push_str(&leaf.text);
            }
        }
        out
    }

    /// Owned copy of a subtree
    pub fn snapshot(&self, id: NodeId) -> Option<Node> {
        let slot = self.slot(id)?;
        let children = slot
            .children
            .iter()
            .filter_map(|&child| self.snapshot(child))
            .collect();
        Some(Node::new(slot.kind.clone(), children))
    }

    /// Copy of the tree with dead slots dropped; every id is reissued
    pub fn compacted(&self) -> Document {
        let blocks = self
            .children(self.root)
            .iter()
            .filter_map(|&id| self.snapshot(id))
            .collect();
        Document::from_nodes(blocks)
    }

    /// Number of live nodes in a subtree
    pub fn subtree_size(&self, id: NodeId) -> usize {
        self.descendants(id).len()
    }

    // ------------------------------------------------------------------
    // Edit primitives
    // ------------------------------------------------------------------

    fn split_path(path: &[usize]) -> Option<(&[usize], usize)> {
        let (&last, parent) = path.split_last()?;
        Some((parent, last))
    }

    /// Insert a subtree so that it ends up at `path`
    pub fn insert_node(&mut self, path: &[usize], node: Node) -> Option<NodeId> {
        let (parent_path, index) = Self::split_path(path)?;
        let parent = self.resolve(parent_path)?;
        if index > self.children(parent).len() {
            log::debug!("insert_node: index {} out of range at {:?}", index, path);
            return None;
        }
        let id = self.alloc(node, Some(parent));
        self.slot_mut(parent)?.children.insert(index, id);
        Some(id)
    }

    /// Remove the node at `path`, returning its subtree
    pub fn remove_node(&mut self, path: &[usize]) -> Option<Node> {
        let (parent_path, index) = Self::split_path(path)?;
        let parent = self.resolve(parent_path)?;
        let id = self.child(parent, index)?;
        let snapshot = self.snapshot(id);
        self.slot_mut(parent)?.children.remove(index);
        self.release(id);
        snapshot
    }

    /// Replace the payload of the node at `path`, keeping its children
    pub fn set_node_properties(&mut self, path: &[usize], kind: NodeKind) -> bool {
        let Some(id) = self.resolve(path) else {
            log::debug!("set_node_properties: no node at {:?}", path);
            return false;
        };
        if id == self.root {
            return false;
        }
        match self.slot_mut(id) {
            Some(slot) => {
                slot.kind = kind;
                true
            }
            None => false,
        }
    }

    /// Wrap the node at `path` in a new parent of the given kind
    pub fn wrap_node(&mut self, path: &[usize], wrapper: NodeKind) -> bool {
        match Self::split_path(path) {
            Some((parent, index)) => self.wrap_nodes(parent, index..index + 1, wrapper),
            None => false,
        }
    }

    /// Wrap a contiguous run of siblings under `parent_path` in one new node
    pub fn wrap_nodes(&mut self, parent_path: &[usize], range: Range<usize>, wrapper: NodeKind) -> bool {
        let Some(parent) = self.resolve(parent_path) else {
            log::debug!("wrap_nodes: no parent at {:?}", parent_path);
            return false;
        };
        if range.is_empty() || range.end > self.children(parent).len() {
            return false;
        }
        let wrapper_id = self.alloc(Node::leaf(wrapper), Some(parent));
        let moved: Vec<NodeId> = match self.slot_mut(parent) {
            Some(slot) => slot
                .children
                .splice(range.clone(), std::iter::once(wrapper_id))
                .collect(),
            None => return false,
        };
        for &child in &moved {
            if let Some(slot) = self.slot_mut(child) {
                slot.parent = Some(wrapper_id);
            }
        }
        if let Some(slot) = self.slot_mut(wrapper_id) {
            slot.children = moved;
        }
        true
    }

    /// Move a node; `to` addresses the tree as it stands after removal
    pub fn move_node(&mut self, from: &[usize], to: &[usize]) -> bool {
        if to.starts_with(from) {
            return false;
        }
        let Some((to_parent, to_index)) = Self::split_path(to) else {
            return false;
        };
        let Some((from_parent_path, from_index)) = Self::split_path(from) else {
            return false;
        };
        let Some(from_parent) = self.resolve(from_parent_path) else {
            return false;
        };
        let Some(id) = self.child(from_parent, from_index) else {
            return false;
        };
        if let Some(slot) = self.slot_mut(from_parent) {
            slot.children.remove(from_index);
        }
        let target = self
            .resolve(to_parent)
            .filter(|&parent| to_index <= self.children(parent).len());
        match target {
            Some(parent) => {
                if let Some(slot) = self.slot_mut(parent) {
                    slot.children.insert(to_index, id);
                }
                if let Some(slot) = self.slot_mut(id) {
                    slot.parent = Some(parent);
                }
                true
            }
            None => {
                // Put it back where it came from.
                if let Some(slot) = self.slot_mut(from_parent) {
                    slot.children.insert(from_index, id);
                }
                log::debug!("move_node: destination {:?} does not resolve", to);
                false
            }
        }
    }

    /// Apply a reified edit
    pub fn apply(&mut self, edit: Edit) -> bool {
        match edit {
            Edit::Insert { path, node } => self.insert_node(&path, node).is_some(),
            Edit::Remove { path } => self.remove_node(&path).is_some(),
            Edit::SetProperties { path, kind } => self.set_node_properties(&path, kind),
            Edit::Wrap { path, wrapper } => self.wrap_node(&path, wrapper),
            Edit::WrapRange {
                parent,
                range,
                wrapper,
            } => self.wrap_nodes(&parent, range, wrapper),
            Edit::Move { from, to } => self.move_node(&from, &to),
        }
    }
}
