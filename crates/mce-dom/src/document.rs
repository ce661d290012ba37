//! Live editable document: a tree, its schema and the current selection.

use crate::node::NodeId;
use crate::range::Range;
use crate::schema::Schema;
use crate::tree::Tree;

/// An editable document with a single selection range.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree,
    schema: Schema,
    selection: Range,
}

impl Document {
    /// Wrap a tree with a permissive schema. The selection starts collapsed at the root.
    #[must_use]
    pub fn new(tree: Tree) -> Self {
        let root = tree.root();
        Self {
            tree,
            schema: Schema::new(),
            selection: Range::collapsed_at(root, 0),
        }
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    #[must_use]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Current selection range.
    #[must_use]
    pub fn selection(&self) -> Range {
        self.selection
    }

    pub fn set_selection(&mut self, range: Range) {
        self.selection = range;
    }

    /// Whether the node is a block element according to the schema.
    #[must_use]
    pub fn is_block(&self, node: NodeId) -> bool {
        self.tree.is_element(node) && self.schema.is_block(self.tree.name(node))
    }

    /// Consume the document, returning its tree.
    #[must_use]
    pub fn into_tree(self) -> Tree {
        self.tree
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(Tree::document())
    }
}
