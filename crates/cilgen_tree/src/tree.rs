//! Arena-backed n-ary tree.
//!
//! Nodes are addressed by stable [`NodeId`] indices instead of raw
//! back-pointers. A parent owns its children through an ordered index list;
//! the parent link is a plain back-reference. Child order equals insertion
//! order and is preserved by every pass.

use serde::{Deserialize, Serialize};

/// Stable handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Returns the raw arena index, for diagnostics.
    pub const fn index(self) -> usize {
        self.0
    }
}

/// A single tree node: links, source line, and an immutable payload.
#[derive(Debug, Clone)]
pub struct Node<P> {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    line: u32,
    value: P,
}

impl<P> Node<P> {
    /// The node's parent, `None` for the root.
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The node's children in insertion order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Source line the node was created from.
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The payload. Payloads are set at creation time only; there is no
    /// mutable accessor.
    pub const fn value(&self) -> &P {
        &self.value
    }
}

/// An arena of nodes forming one rooted tree.
#[derive(Debug, Clone)]
pub struct Tree<P> {
    nodes: Vec<Node<P>>,
}

impl<P> Tree<P> {
    /// Creates a tree containing only a root node with the given payload.
    pub fn new(root_value: P) -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                line: 0,
                value: root_value,
            }],
        }
    }

    /// The root node id. Always valid.
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Appends a new child under `parent` and returns its id.
    ///
    /// # Panics
    ///
    /// Panics if `parent` does not belong to this tree. Ids are only ever
    /// produced by this tree's own insertions, so a foreign id is a logic
    /// error in the caller.
    pub fn add_child(&mut self, parent: NodeId, value: P, line: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            line,
            value,
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Borrows a node.
    pub fn node(&self, id: NodeId) -> &Node<P> {
        &self.nodes[id.0]
    }

    /// Borrows a node's payload.
    pub fn value(&self, id: NodeId) -> &P {
        &self.nodes[id.0].value
    }

    /// A node's children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// True if `id` is the final child of its parent.
    pub fn is_last_child(&self, id: NodeId) -> bool {
        self.nodes[id.0]
            .parent
            .is_some_and(|p| self.nodes[p.0].children.last() == Some(&id))
    }

    /// Total number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the tree holds only its root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_has_no_parent() {
        let tree: Tree<u32> = Tree::new(0);
        assert_eq!(tree.node(tree.root()).parent(), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn children_keep_insertion_order() {
        let mut tree = Tree::new("root");
        let a = tree.add_child(tree.root(), "a", 1);
        let b = tree.add_child(tree.root(), "b", 2);
        let c = tree.add_child(tree.root(), "c", 3);

        assert_eq!(tree.children(tree.root()), &[a, b, c]);
        assert_eq!(tree.value(b), &"b");
        assert_eq!(tree.node(c).line(), 3);
    }

    #[test]
    fn every_non_root_node_has_one_parent() {
        let mut tree = Tree::new(());
        let a = tree.add_child(tree.root(), (), 1);
        let b = tree.add_child(a, (), 2);

        assert_eq!(tree.node(a).parent(), Some(tree.root()));
        assert_eq!(tree.node(b).parent(), Some(a));
    }

    #[test]
    fn is_last_child_tracks_tail() {
        let mut tree = Tree::new(());
        let a = tree.add_child(tree.root(), (), 1);
        let b = tree.add_child(tree.root(), (), 1);

        assert!(!tree.is_last_child(a));
        assert!(tree.is_last_child(b));
        assert!(!tree.is_last_child(tree.root()));
    }
}
