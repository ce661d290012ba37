//! Editability markers and their resolution through ancestors.

use mce_dom::{NodeId, Tree};

/// Internal marker attribute, set by the class filter.
pub const INTERNAL_ATTRIBUTE: &str = "data-mce-contenteditable";

/// Native content-editable attribute.
pub const NATIVE_ATTRIBUTE: &str = "contenteditable";

/// Explicit editable state carried by a single element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEditable {
    True,
    False,
}

/// Explicit state of a node, or `None` when it inherits.
///
/// The internal attribute wins over the native one unless it is
/// `inherit`. Non-elements always inherit.
pub fn content_editable(tree: &Tree, node: NodeId) -> Option<ContentEditable> {
    if !tree.is_element(node) {
        return None;
    }

    match tree.attr(node, INTERNAL_ATTRIBUTE) {
        Some("false") => return Some(ContentEditable::False),
        Some(value) if !value.is_empty() && value != "inherit" => {
            return Some(ContentEditable::True);
        }
        _ => {}
    }

    match tree.attr(node, NATIVE_ATTRIBUTE).map(str::to_ascii_lowercase).as_deref() {
        Some("" | "true" | "plaintext-only") => Some(ContentEditable::True),
        Some("false") => Some(ContentEditable::False),
        _ => None,
    }
}

/// Nearest non-editable element containing `node`, itself included.
///
/// Returns `None` when an editable marker is found first or no marker exists.
pub fn non_editable_parent(tree: &Tree, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find_map(|candidate| content_editable(tree, candidate).map(|state| (candidate, state)))
        .and_then(|(candidate, state)| (state == ContentEditable::False).then_some(candidate))
}

/// Whether `node` is editable after resolving inherited markers.
pub fn is_editable(tree: &Tree, node: NodeId) -> bool {
    non_editable_parent(tree, node).is_none()
}
