//! Document-order tree walker bounded by a root node.

use crate::node::NodeId;
use crate::tree::Tree;

/// Walks a [`Tree`] forwards and backwards from a start node without
/// leaving the subtree of `root`.
pub struct TreeWalker<'a> {
    tree: &'a Tree,
    root: NodeId,
    current: Option<NodeId>,
}

impl<'a> TreeWalker<'a> {
    /// Create a walker positioned on `start`.
    #[must_use]
    pub fn new(tree: &'a Tree, start: NodeId, root: NodeId) -> Self {
        Self {
            tree,
            root,
            current: Some(start),
        }
    }

    /// Move to the next node in document order.
    ///
    /// With `shallow` the walker does not descend into the current node.
    pub fn next(&mut self, shallow: bool) -> Option<NodeId> {
        let mut node = self.current?;

        if !shallow && let Some(child) = self.tree.first_child(node) {
            self.current = Some(child);
            return self.current;
        }

        loop {
            if node == self.root {
                return None;
            }
            if let Some(sibling) = self.tree.next_sibling(node) {
                self.current = Some(sibling);
                return self.current;
            }
            node = self.tree.parent(node)?;
        }
    }

    /// Move to the previous node in document order.
    ///
    /// The previous sibling's deepest last descendant is visited before the
    /// sibling itself unless `shallow` is set; after the first sibling the
    /// walker steps up to the parent, stopping at `root`.
    pub fn prev(&mut self, shallow: bool) -> Option<NodeId> {
        let node = self.current?;
        if node == self.root {
            return None;
        }

        if let Some(mut sibling) = self.tree.prev_sibling(node) {
            if !shallow {
                while let Some(last) = self.tree.last_child(sibling) {
                    sibling = last;
                }
            }
            self.current = Some(sibling);
            return self.current;
        }

        let parent = self.tree.parent(node)?;
        if parent == self.root {
            return None;
        }
        self.current = Some(parent);
        self.current
    }
}
