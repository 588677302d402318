//! Depth-first tree traversal with visitor callbacks.
//!
//! Both AST construction and policy emission ride on this walker, so the
//! traversal discipline (pre-order, sibling order preserved, explicit
//! skip-subtree) is defined in one place.

use crate::tree::{NodeId, Tree};

/// Directive returned by [`Visitor::on_visit`] for each visited node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    /// Descend into this node's children.
    Continue,
    /// Do not descend into this node's children; its siblings are still
    /// visited.
    SkipSubtree,
}

/// Callbacks invoked by [`walk`].
///
/// Any callback returning `Err` aborts the walk immediately and the error
/// propagates unchanged; there is no partial retry.
pub trait Visitor<P> {
    /// Error type surfaced through the walk.
    type Error;

    /// Called for every visited node, in pre-order.
    ///
    /// # Errors
    ///
    /// Implementations abort the walk by returning an error.
    fn on_visit(&mut self, tree: &Tree<P>, node: NodeId) -> Result<VisitAction, Self::Error>;

    /// Called exactly once per node that is the final child of its parent,
    /// after that child's subtree has been visited. The parent (and its
    /// payload) is reachable through `tree`.
    ///
    /// # Errors
    ///
    /// Implementations abort the walk by returning an error.
    fn on_last_child(&mut self, tree: &Tree<P>, last: NodeId) -> Result<(), Self::Error> {
        let _ = (tree, last);
        Ok(())
    }

    /// Called once after the whole walk has completed.
    ///
    /// # Errors
    ///
    /// Implementations abort the walk by returning an error.
    fn on_finish(&mut self, tree: &Tree<P>) -> Result<(), Self::Error> {
        let _ = tree;
        Ok(())
    }
}

/// Walks the subtree under `root` in pre-order, depth-first.
///
/// `root` itself is not visited; its children are, in insertion order.
///
/// # Errors
///
/// Propagates the first error returned by any visitor callback.
pub fn walk<P, V: Visitor<P>>(tree: &Tree<P>, root: NodeId, visitor: &mut V) -> Result<(), V::Error> {
    walk_children(tree, root, visitor)?;
    visitor.on_finish(tree)
}

fn walk_children<P, V: Visitor<P>>(
    tree: &Tree<P>,
    parent: NodeId,
    visitor: &mut V,
) -> Result<(), V::Error> {
    let children = tree.children(parent);
    for (i, &child) in children.iter().enumerate() {
        match visitor.on_visit(tree, child)? {
            VisitAction::Continue => walk_children(tree, child, visitor)?,
            VisitAction::SkipSubtree => {}
        }
        if i + 1 == children.len() {
            visitor.on_last_child(tree, child)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder {
        visited: Vec<&'static str>,
        closed: Vec<&'static str>,
        finished: bool,
        skip: Option<&'static str>,
        fail_on: Option<&'static str>,
    }

    impl Recorder {
        fn new() -> Self {
            Self {
                visited: Vec::new(),
                closed: Vec::new(),
                finished: false,
                skip: None,
                fail_on: None,
            }
        }
    }

    impl Visitor<&'static str> for Recorder {
        type Error = String;

        fn on_visit(
            &mut self,
            tree: &Tree<&'static str>,
            node: NodeId,
        ) -> Result<VisitAction, Self::Error> {
            let value = *tree.value(node);
            if self.fail_on == Some(value) {
                return Err(format!("failed at {value}"));
            }
            self.visited.push(value);
            if self.skip == Some(value) {
                return Ok(VisitAction::SkipSubtree);
            }
            Ok(VisitAction::Continue)
        }

        fn on_last_child(
            &mut self,
            tree: &Tree<&'static str>,
            last: NodeId,
        ) -> Result<(), Self::Error> {
            self.closed.push(*tree.value(last));
            Ok(())
        }

        fn on_finish(&mut self, _tree: &Tree<&'static str>) -> Result<(), Self::Error> {
            self.finished = true;
            Ok(())
        }
    }

    fn sample() -> Tree<&'static str> {
        // root -> (a -> (a1, a2), b)
        let mut tree = Tree::new("root");
        let a = tree.add_child(tree.root(), "a", 1);
        tree.add_child(a, "a1", 2);
        tree.add_child(a, "a2", 3);
        tree.add_child(tree.root(), "b", 4);
        tree
    }

    #[test]
    fn preorder_sibling_order_preserved() {
        let tree = sample();
        let mut rec = Recorder::new();
        walk(&tree, tree.root(), &mut rec).unwrap();

        assert_eq!(rec.visited, ["a", "a1", "a2", "b"]);
        assert!(rec.finished);
    }

    #[test]
    fn last_child_fires_once_per_parent() {
        let tree = sample();
        let mut rec = Recorder::new();
        walk(&tree, tree.root(), &mut rec).unwrap();

        // a2 closes a's child list, b closes the root's.
        assert_eq!(rec.closed, ["a2", "b"]);
    }

    #[test]
    fn skip_subtree_keeps_siblings() {
        let tree = sample();
        let mut rec = Recorder::new();
        rec.skip = Some("a");
        walk(&tree, tree.root(), &mut rec).unwrap();

        assert_eq!(rec.visited, ["a", "b"]);
    }

    #[test]
    fn error_aborts_walk() {
        let tree = sample();
        let mut rec = Recorder::new();
        rec.fail_on = Some("a2");
        let err = walk(&tree, tree.root(), &mut rec).unwrap_err();

        assert_eq!(err, "failed at a2");
        assert_eq!(rec.visited, ["a", "a1"]);
        assert!(!rec.finished);
    }
}
