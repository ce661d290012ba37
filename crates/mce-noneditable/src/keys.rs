//! Key-down handling around non-editable regions and caret containers.

use mce_dom::{NodeId, Tree};

use crate::caret::{caret_container_parent, remove_container};
use crate::dom::EditorDom;
use crate::editable::{ContentEditable, content_editable, non_editable_parent};

/// Keys the handler distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Backspace,
    Left,
    Right,
    Delete,
    /// F1 to F13, numbered from 1.
    Function(u8),
    Other(u32),
}

impl Key {
    /// Map a DOM `keyCode`.
    pub fn from_code(code: u32) -> Self {
        match code {
            8 => Self::Backspace,
            37 => Self::Left,
            39 => Self::Right,
            46 => Self::Delete,
            112..=124 => Self::Function(u8::try_from(code - 111).unwrap_or_default()),
            other => Self::Other(other),
        }
    }

    /// Whether the key is swallowed while the selection is non-editable.
    fn blocked_in_non_editable(self) -> bool {
        !matches!(self, Self::Function(_) | Self::Delete | Self::Backspace)
    }
}

/// Result of a key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyOutcome {
    /// The host must not run its default action for the key.
    pub prevent_default: bool,
}

impl KeyOutcome {
    const PREVENT: Self = Self {
        prevent_default: true,
    };
    const PASS: Self = Self {
        prevent_default: false,
    };
}

/// Nearest sibling in one direction that is not an empty text node.
fn non_empty_sibling(tree: &Tree, node: NodeId, backwards: bool) -> Option<NodeId> {
    let step = |node| {
        if backwards {
            tree.prev_sibling(node)
        } else {
            tree.next_sibling(node)
        }
    };
    std::iter::successors(step(node), |&sibling| step(sibling))
        .find(|&sibling| !tree.is_text(sibling) || tree.len(sibling) > 0)
}

pub(crate) fn handle_key_down<D: EditorDom>(dom: &mut D, key: Key, caret: char) -> KeyOutcome {
    let start = dom.get_start();
    let end = dom.get_end();

    let non_editable = non_editable_parent(dom.tree(), start)
        .or_else(|| non_editable_parent(dom.tree(), end));
    if let Some(element) = non_editable
        && key.blocked_in_non_editable()
    {
        if matches!(key, Key::Left | Key::Right) {
            dom.select(element);
            dom.collapse(key == Key::Left);
        }
        tracing::debug!(key = ?key, "Suppressed key in non-editable region");
        return KeyOutcome::PREVENT;
    }

    if !matches!(key, Key::Left | Key::Right | Key::Backspace | Key::Delete) {
        return KeyOutcome::PASS;
    }
    let Some(container) = caret_container_parent(dom.tree(), start) else {
        return KeyOutcome::PASS;
    };

    let backwards = matches!(key, Key::Left | Key::Backspace);
    let sibling = non_empty_sibling(dom.tree(), container, backwards)
        .filter(|&sibling| content_editable(dom.tree(), sibling) == Some(ContentEditable::False));

    let Some(sibling) = sibling else {
        remove_container(dom, container, caret);
        return KeyOutcome::PASS;
    };

    match key {
        Key::Left | Key::Right => {
            dom.select(sibling);
            dom.collapse(key == Key::Left);
        }
        _ => {
            tracing::debug!(key = ?key, "Removed non-editable element next to caret");
            dom.tree_mut().remove(sibling);
        }
    }
    KeyOutcome::PREVENT
}

#[cfg(test)]
mod tests {
    use mce_dom::{Document, Range};
    use mce_html::{DomParser, outer_html};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::caret::CARET_CONTAINER_ID;

    const CARET: char = '\u{feff}';

    fn container_markup() -> String {
        format!("<span id=\"{CARET_CONTAINER_ID}\" data-mce-bogus=\"1\">{CARET}</span>")
    }

    /// Document with the caret inside the only caret container.
    fn document_in_container(html: &str) -> (Document, NodeId) {
        let tree = DomParser::new().build(html);
        let container = tree.get_element_by_id(CARET_CONTAINER_ID).unwrap();
        let text = tree.first_child(container).unwrap();
        let p = tree.parent(container).unwrap();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(text, 1));
        (doc, p)
    }

    #[test]
    fn test_key_codes() {
        assert_eq!(Key::from_code(8), Key::Backspace);
        assert_eq!(Key::from_code(46), Key::Delete);
        assert_eq!(Key::from_code(112), Key::Function(1));
        assert_eq!(Key::from_code(123), Key::Function(12));
        assert_eq!(Key::from_code(124), Key::Function(13));
        assert_eq!(Key::from_code(125), Key::Other(125));
        assert_eq!(Key::from_code(65), Key::Other(65));
    }

    #[test]
    fn test_delete_removes_following_non_editable() {
        let html = format!(
            "<p>a{}<span contenteditable=\"false\">x</span>b</p>",
            container_markup()
        );
        let (mut doc, p) = document_in_container(&html);

        let outcome = handle_key_down(&mut doc, Key::Delete, CARET);
        assert!(outcome.prevent_default);
        assert_eq!(
            outer_html(doc.tree(), p),
            format!("<p>a{}b</p>", container_markup())
        );
    }

    #[test]
    fn test_backspace_skips_empty_text() {
        let mut tree = DomParser::new().build(&format!(
            "<p><b data-mce-contenteditable=\"false\">x</b>{}c</p>",
            container_markup()
        ));
        let p = tree.first_child(tree.root()).unwrap();
        let container = tree.child_at(p, 1).unwrap();
        let empty = tree.create_text("");
        tree.insert_before(container, empty);
        let text = tree.first_child(container).unwrap();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(text, 1));

        let outcome = handle_key_down(&mut doc, Key::Backspace, CARET);
        assert!(outcome.prevent_default);
        assert_eq!(
            outer_html(doc.tree(), p),
            format!("<p>{}c</p>", container_markup())
        );
    }

    #[test]
    fn test_arrow_selects_adjacent_non_editable() {
        let html = format!(
            "<p>a<span contenteditable=\"false\">x</span>{}b</p>",
            container_markup()
        );
        let (mut doc, p) = document_in_container(&html);

        let outcome = handle_key_down(&mut doc, Key::Left, CARET);
        assert!(outcome.prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(p, 1));
    }

    #[test]
    fn test_container_torn_down_next_to_editable_content() {
        let html = format!("<p>a{}b</p>", container_markup());
        let (mut doc, p) = document_in_container(&html);

        let outcome = handle_key_down(&mut doc, Key::Right, CARET);
        assert!(!outcome.prevent_default);
        assert_eq!(outer_html(doc.tree(), p), "<p>ab</p>");
        assert_eq!(doc.get_rng(), Range::collapsed_at(p, 1));
    }

    #[test]
    fn test_typing_inside_non_editable_is_suppressed() {
        let tree = DomParser::new().build("<p>a<span contenteditable=\"false\">xyz</span>b</p>");
        let p = tree.first_child(tree.root()).unwrap();
        let span = tree.child_at(p, 1).unwrap();
        let xyz = tree.first_child(span).unwrap();
        let mut doc = Document::new(tree);

        doc.set_rng(Range::collapsed_at(xyz, 1));
        assert!(handle_key_down(&mut doc, Key::Other(65), CARET).prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(xyz, 1));

        assert!(handle_key_down(&mut doc, Key::Right, CARET).prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(p, 2));

        doc.set_rng(Range::collapsed_at(xyz, 1));
        assert!(handle_key_down(&mut doc, Key::Left, CARET).prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(p, 1));
    }

    #[test]
    fn test_typing_at_root_before_non_editable_block_is_suppressed() {
        let tree = DomParser::new().build("<div contenteditable=\"false\"><p>x</p></div><p>y</p>");
        let root = tree.root();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(root, 0));

        assert!(handle_key_down(&mut doc, Key::from_code(65), CARET).prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(root, 0));

        assert!(handle_key_down(&mut doc, Key::Right, CARET).prevent_default);
        assert_eq!(doc.get_rng(), Range::collapsed_at(root, 1));
    }

    #[test]
    fn test_function_and_delete_keys_pass_through() {
        let tree = DomParser::new().build("<p><span contenteditable=\"false\">xyz</span></p>");
        let span = tree.descendants(tree.root()).find(|&n| tree.name(n) == "span").unwrap();
        let xyz = tree.first_child(span).unwrap();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(xyz, 1));

        for key in [Key::Function(5), Key::from_code(124), Key::Delete, Key::Backspace] {
            assert!(!handle_key_down(&mut doc, key, CARET).prevent_default, "{key:?}");
        }
    }
}
