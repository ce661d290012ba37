//! Document capability the state machine operates on.

use mce_dom::{Document, NodeId, Range, Tree, end_element, start_element};

/// Tree and selection access needed by the non-editable handlers.
///
/// Implementors supply the tree, block classification and the selection
/// range; the selection helpers are provided on top of them.
pub trait EditorDom {
    fn tree(&self) -> &Tree;

    fn tree_mut(&mut self) -> &mut Tree;

    /// Whether the node renders as a block.
    fn is_block(&self, node: NodeId) -> bool;

    fn selection(&self) -> Range;

    fn set_selection(&mut self, range: Range);

    /// Element at the start of the selection.
    fn get_start(&self) -> NodeId {
        start_element(self.tree(), &self.selection())
    }

    /// Element at the end of the selection.
    fn get_end(&self) -> NodeId {
        end_element(self.tree(), &self.selection())
    }

    fn is_collapsed(&self) -> bool {
        self.selection().is_collapsed()
    }

    fn get_rng(&self) -> Range {
        self.selection()
    }

    fn set_rng(&mut self, range: Range) {
        self.set_selection(range);
    }

    /// Select `node` as a whole. No-op for detached or parentless nodes.
    fn select(&mut self, node: NodeId) {
        if !self.tree().is_attached(node) {
            return;
        }
        let mut range = self.selection();
        range.select_node(self.tree(), node);
        self.set_selection(range);
    }

    /// Collapse the selection onto its start or end.
    fn collapse(&mut self, to_start: bool) {
        let mut range = self.selection();
        range.collapse(to_start);
        self.set_selection(range);
    }
}

impl EditorDom for Document {
    fn tree(&self) -> &Tree {
        Document::tree(self)
    }

    fn tree_mut(&mut self) -> &mut Tree {
        Document::tree_mut(self)
    }

    fn is_block(&self, node: NodeId) -> bool {
        Document::is_block(self, node)
    }

    fn selection(&self) -> Range {
        Document::selection(self)
    }

    fn set_selection(&mut self, range: Range) {
        Document::set_selection(self, range);
    }
}
