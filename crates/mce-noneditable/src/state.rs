//! Selection classification and the DOM edits each state calls for.
//!
//! [`classify`] only reads the document; [`apply`] performs the edits.

use mce_dom::{NodeId, Range, Tree, TreeWalker};

use crate::caret::create_caret_container;
use crate::dom::EditorDom;
use crate::editable::{ContentEditable, content_editable, non_editable_parent};

/// Side of the target a caret container is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Before,
    After,
}

/// Where the selection sits relative to non-editable regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionState {
    /// Neither endpoint is inside a non-editable region.
    Editable,
    /// Collapsed caret inside a non-editable region with nothing on one
    /// side: the caret moves into a container next to `target`.
    CollapsedAtBoundary { target: NodeId, side: Side },
    /// Collapsed caret with content on both sides: `element` is selected.
    InsideNonEditable { element: NodeId },
    /// Range with at least one endpoint in a non-editable region.
    SpansNonEditable {
        start: Option<NodeId>,
        end: Option<NodeId>,
    },
}

/// Classify the current selection of `dom`.
pub fn classify<D: EditorDom>(dom: &D) -> SelectionState {
    let tree = dom.tree();
    let start = non_editable_parent(tree, dom.get_start());
    let end = non_editable_parent(tree, dom.get_end());

    let Some(element) = start.or(end) else {
        return SelectionState::Editable;
    };

    if !dom.is_collapsed() {
        return SelectionState::SpansNonEditable { start, end };
    }

    let range = dom.get_rng();
    if let Some(target) = side_target(tree, &range, element, true) {
        SelectionState::CollapsedAtBoundary {
            target,
            side: Side::Before,
        }
    } else if let Some(target) = side_target(tree, &range, element, false) {
        SelectionState::CollapsedAtBoundary {
            target,
            side: Side::After,
        }
    } else {
        SelectionState::InsideNonEditable { element }
    }
}

/// Probe one side of a collapsed caret inside `element`.
///
/// Returns `None` when content lies on that side, an editable island when
/// one is found first, otherwise `element` itself.
fn side_target(tree: &Tree, range: &Range, element: NodeId, left: bool) -> Option<NodeId> {
    let mut container = range.start.container;
    let offset = range.start.offset;

    if tree.is_text(container) {
        let len = tree.len(container);
        let at_content_edge = if left { offset == len } else { offset == 0 };
        if (offset > 0 && offset < len) || at_content_edge {
            return None;
        }
    } else if offset < tree.child_count(container) {
        // Moving right, the caret sits at the start of the node it enters.
        let index = if !left && offset > 0 { offset - 1 } else { offset };
        container = tree.child_at(container, index)?;
        if let Some(child) = tree.first_child(container) {
            container = child;
        }
    } else {
        return (!left).then_some(element);
    }

    let mut walker = TreeWalker::new(tree, container, element);
    while let Some(node) = if left {
        walker.prev(false)
    } else {
        walker.next(false)
    } {
        if tree.is_text(node) && tree.len(node) > 0 {
            return None;
        }
        if content_editable(tree, node) == Some(ContentEditable::True) {
            return Some(node);
        }
    }
    Some(element)
}

/// Perform the edits required by `state`.
pub fn apply<D: EditorDom>(dom: &mut D, state: SelectionState, caret: char) {
    match state {
        SelectionState::Editable => {}
        SelectionState::CollapsedAtBoundary { target, side } => {
            insert_caret_container_or_select_block(dom, target, side, caret);
        }
        SelectionState::InsideNonEditable { element } => dom.select(element),
        SelectionState::SpansNonEditable { start, end } => {
            let mut range = dom.get_rng();
            if let Some(start) = start.filter(|&node| dom.tree().is_attached(node)) {
                range.set_start_before(dom.tree(), start);
            }
            if let Some(end) = end.filter(|&node| dom.tree().is_attached(node)) {
                range.set_end_after(dom.tree(), end);
            }
            dom.set_rng(range);
        }
    }
}

fn insert_caret_container_or_select_block<D: EditorDom>(
    dom: &mut D,
    target: NodeId,
    side: Side,
    caret: char,
) {
    if !dom.tree().is_attached(target) {
        return;
    }
    if dom.is_block(target) {
        dom.select(target);
        return;
    }

    let mut target = target;
    let mut side = side;
    if content_editable(dom.tree(), target) == Some(ContentEditable::True) {
        let tree = dom.tree_mut();
        let first = match tree.first_child(target) {
            Some(first) => first,
            None => {
                let filler = tree.create_text("\u{a0}");
                tree.append_child(target, filler);
                filler
            }
        };
        target = first;
        side = Side::Before;
    }

    let tree = dom.tree_mut();
    let (container, text) = create_caret_container(tree, caret);
    match side {
        Side::Before => tree.insert_before(target, container),
        Side::After => tree.insert_after(target, container),
    }
    if !tree.is_attached(container) {
        return;
    }

    dom.set_rng(Range::collapsed_at(text, 1));
    tracing::debug!(side = ?side, "Inserted caret container");
}
