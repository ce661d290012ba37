//! DOM ranges and the selection element helpers built on them.

use crate::node::NodeId;
use crate::tree::Tree;

/// A position inside the tree: a container node plus an offset.
///
/// The offset counts characters for text-like containers and children
/// for elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryPoint {
    pub container: NodeId,
    pub offset: usize,
}

impl BoundaryPoint {
    #[must_use]
    pub fn new(container: NodeId, offset: usize) -> Self {
        Self { container, offset }
    }
}

/// A start/end pair of boundary points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub start: BoundaryPoint,
    pub end: BoundaryPoint,
}

impl Range {
    /// Create a range between two boundary points.
    #[must_use]
    pub fn new(start: BoundaryPoint, end: BoundaryPoint) -> Self {
        Self { start, end }
    }

    /// Create a collapsed range.
    #[must_use]
    pub fn collapsed_at(container: NodeId, offset: usize) -> Self {
        let point = BoundaryPoint::new(container, offset);
        Self::new(point, point)
    }

    /// Whether start and end are the same point.
    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn set_start(&mut self, container: NodeId, offset: usize) {
        self.start = BoundaryPoint::new(container, offset);
    }

    pub fn set_end(&mut self, container: NodeId, offset: usize) {
        self.end = BoundaryPoint::new(container, offset);
    }

    /// Move the start to just before `node`. No-op for parentless nodes.
    pub fn set_start_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = point_before(tree, node) {
            self.start = point;
        }
    }

    /// Move the end to just before `node`. No-op for parentless nodes.
    pub fn set_end_before(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = point_before(tree, node) {
            self.end = point;
        }
    }

    /// Move the end to just after `node`. No-op for parentless nodes.
    pub fn set_end_after(&mut self, tree: &Tree, node: NodeId) {
        if let Some(point) = point_after(tree, node) {
            self.end = point;
        }
    }

    /// Make the range span exactly `node`.
    pub fn select_node(&mut self, tree: &Tree, node: NodeId) {
        if let (Some(start), Some(end)) = (point_before(tree, node), point_after(tree, node)) {
            self.start = start;
            self.end = end;
        }
    }

    /// Collapse onto the start (`to_start`) or the end.
    pub fn collapse(&mut self, to_start: bool) {
        if to_start {
            self.end = self.start;
        } else {
            self.start = self.end;
        }
    }
}

fn point_before(tree: &Tree, node: NodeId) -> Option<BoundaryPoint> {
    let parent = tree.parent(node)?;
    let index = tree.index_of(node)?;
    Some(BoundaryPoint::new(parent, index))
}

fn point_after(tree: &Tree, node: NodeId) -> Option<BoundaryPoint> {
    point_before(tree, node).map(|point| BoundaryPoint::new(point.container, point.offset + 1))
}

/// Element at the start of a range.
///
/// A container (element, document or fragment) with children resolves to
/// the child at the start offset (clamped to the last child); a text node resolves to its parent.
#[must_use]
pub fn start_element(tree: &Tree, range: &Range) -> NodeId {
    let mut node = range.start.container;
    if tree.node_type(node).is_container() {
        let count = tree.child_count(node);
        if count > 0 {
            let index = range.start.offset.min(count - 1);
            node = tree.child_at(node, index).unwrap_or(node);
        }
    }
    text_parent(tree, node)
}

/// Element at the end of a range.
///
/// A container with children resolves to the child just before the end
/// offset (or the first child at offset zero); a text node
/// resolves to its parent.
#[must_use]
pub fn end_element(tree: &Tree, range: &Range) -> NodeId {
    let mut node = range.end.container;
    if tree.node_type(node).is_container() && tree.child_count(node) > 0 {
        let index = range.end.offset.saturating_sub(1);
        node = tree.child_at(node, index).unwrap_or(node);
    }
    text_parent(tree, node)
}

fn text_parent(tree: &Tree, node: NodeId) -> NodeId {
    if tree.is_text(node) {
        tree.parent(node).unwrap_or(node)
    } else {
        node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `<p>ab<span>x</span>cd</p>`
    fn sample() -> (Tree, NodeId, NodeId, NodeId, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = tree.create_element("p");
        let ab = tree.create_text("ab");
        let span = tree.create_element("span");
        let x = tree.create_text("x");
        let cd = tree.create_text("cd");
        tree.append_child(root, p);
        tree.append_child(p, ab);
        tree.append_child(p, span);
        tree.append_child(span, x);
        tree.append_child(p, cd);
        (tree, p, ab, span, cd)
    }

    #[test]
    fn test_select_node_spans_node() {
        let (tree, p, _, span, _) = sample();
        let mut range = Range::collapsed_at(p, 0);
        range.select_node(&tree, span);
        assert_eq!(range.start, BoundaryPoint::new(p, 1));
        assert_eq!(range.end, BoundaryPoint::new(p, 2));
        assert!(!range.is_collapsed());
    }

    #[test]
    fn test_set_before_without_parent_is_noop() {
        let (mut tree, p, _, _, _) = sample();
        let lone = tree.create_element("span");
        let mut range = Range::collapsed_at(p, 0);
        range.set_start_before(&tree, lone);
        range.set_end_after(&tree, lone);
        assert_eq!(range, Range::collapsed_at(p, 0));
    }

    #[test]
    fn test_start_element_resolves_text_to_parent() {
        let (tree, p, ab, _, _) = sample();
        let range = Range::collapsed_at(ab, 1);
        assert_eq!(start_element(&tree, &range), p);
    }

    #[test]
    fn test_start_and_end_element_resolve_children() {
        let (tree, p, _, span, _) = sample();
        let range = Range::new(BoundaryPoint::new(p, 1), BoundaryPoint::new(p, 2));
        assert_eq!(start_element(&tree, &range), span);
        assert_eq!(end_element(&tree, &range), span);
    }

    #[test]
    fn test_root_container_resolves_children() {
        let (tree, p, _, _, _) = sample();
        let root = tree.root();
        let range = Range::new(BoundaryPoint::new(root, 0), BoundaryPoint::new(root, 1));
        assert_eq!(start_element(&tree, &range), p);
        assert_eq!(end_element(&tree, &range), p);
    }

    #[test]
    fn test_start_element_clamps_offset() {
        let (tree, p, _, _, _) = sample();
        let range = Range::collapsed_at(p, 3);
        // Clamped onto the trailing text node, which resolves to its parent.
        assert_eq!(start_element(&tree, &range), p);
    }

    #[test]
    fn test_collapse() {
        let (_, p, ab, _, cd) = sample();
        let mut range = Range::new(BoundaryPoint::new(ab, 1), BoundaryPoint::new(cd, 1));
        range.collapse(false);
        assert_eq!(range, Range::collapsed_at(cd, 1));
        let mut range = Range::new(BoundaryPoint::new(p, 0), BoundaryPoint::new(cd, 1));
        range.collapse(true);
        assert_eq!(range, Range::collapsed_at(p, 0));
    }
}
