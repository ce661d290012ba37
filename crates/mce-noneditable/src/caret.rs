//! Caret containers: invisible spans that give the caret a place to live
//! next to non-editable elements.

use mce_dom::{NodeId, Range, Tree};

use crate::dom::EditorDom;

/// `id` of every caret container.
pub const CARET_CONTAINER_ID: &str = "mce_noneditablecaret";

/// Nearest caret container containing `node`, itself included.
pub fn caret_container_parent(tree: &Tree, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(tree.ancestors(node))
        .find(|&candidate| {
            tree.is_element(candidate) && tree.attr(candidate, "id") == Some(CARET_CONTAINER_ID)
        })
}

/// First text node in document order, `node` itself included.
pub(crate) fn first_text_node(tree: &Tree, node: NodeId) -> Option<NodeId> {
    std::iter::once(node)
        .chain(tree.descendants(node))
        .find(|&candidate| tree.is_text(candidate))
}

/// Create a detached caret container holding `caret`.
pub(crate) fn create_caret_container(tree: &mut Tree, caret: char) -> (NodeId, NodeId) {
    let container = tree.create_element("span");
    tree.set_attr(container, "id", CARET_CONTAINER_ID);
    tree.set_attr(container, "data-mce-bogus", "1");
    let text = tree.create_text(caret.to_string());
    tree.append_child(container, text);
    (container, text)
}

/// Delete the leading caret character and unwrap the container.
fn dissolve(tree: &mut Tree, container: NodeId, caret: char) {
    if let Some(text) = first_text_node(tree, container)
        && tree
            .value(text)
            .is_some_and(|value| value.starts_with(caret))
    {
        tree.delete_data(text, 0, 1);
    }
    tree.unwrap(container);
}

/// Remove every caret container except the one holding the selection start.
pub fn remove_stale_containers<D: EditorDom>(dom: &mut D, caret: char) -> usize {
    let current = caret_container_parent(dom.tree(), dom.get_start());
    let stale: Vec<NodeId> = dom
        .tree()
        .elements_by_id(CARET_CONTAINER_ID)
        .into_iter()
        .filter(|&container| Some(container) != current)
        .collect();

    for &container in &stale {
        if dom.tree().is_attached(container) {
            dissolve(dom.tree_mut(), container, caret);
        }
    }
    if !stale.is_empty() {
        tracing::debug!(removed = stale.len(), "Removed stale caret containers");
    }
    stale.len()
}

/// Tear down one container, keeping the caret where the container was.
pub fn remove_container<D: EditorDom>(dom: &mut D, container: NodeId, caret: char) {
    if !dom.tree().is_attached(container) {
        return;
    }
    let mut range: Range = dom.get_rng();
    range.set_start_before(dom.tree(), container);
    range.set_end_before(dom.tree(), container);

    dissolve(dom.tree_mut(), container, caret);
    dom.set_rng(range);
}

#[cfg(test)]
mod tests {
    use mce_dom::Document;
    use mce_html::{DomParser, outer_html};
    use pretty_assertions::assert_eq;

    use super::*;

    const CARET: char = '\u{feff}';

    fn container_markup() -> String {
        format!("<span id=\"{CARET_CONTAINER_ID}\" data-mce-bogus=\"1\">{CARET}</span>")
    }

    #[test]
    fn test_create_caret_container() {
        let mut tree = mce_dom::Tree::new();
        let (container, text) = create_caret_container(&mut tree, CARET);
        let root = tree.root();
        tree.append_child(root, container);
        assert_eq!(outer_html(&tree, root), container_markup());
        assert_eq!(tree.value(text), Some("\u{feff}"));
        assert_eq!(caret_container_parent(&tree, text), Some(container));
    }

    #[test]
    fn test_remove_stale_keeps_current() {
        let markup = format!("<p>a{}b{}c</p>", container_markup(), container_markup());
        let tree = DomParser::new().build(&markup);
        let p = tree.first_child(tree.root()).unwrap();
        let second = tree.child_at(p, 3).unwrap();
        let second_text = tree.first_child(second).unwrap();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(second_text, 1));

        assert_eq!(remove_stale_containers(&mut doc, CARET), 1);
        assert_eq!(doc.tree().elements_by_id(CARET_CONTAINER_ID), vec![second]);
        assert_eq!(
            outer_html(doc.tree(), p),
            format!("<p>ab{}c</p>", container_markup())
        );
    }

    #[test]
    fn test_remove_container_keeps_caret_position() {
        let markup = format!("<p>a{}b</p>", container_markup());
        let tree = DomParser::new().build(&markup);
        let p = tree.first_child(tree.root()).unwrap();
        let container = tree.child_at(p, 1).unwrap();
        let text = tree.first_child(container).unwrap();
        let mut doc = Document::new(tree);
        doc.set_rng(Range::collapsed_at(text, 1));

        remove_container(&mut doc, container, CARET);
        assert_eq!(outer_html(doc.tree(), p), "<p>ab</p>");
        assert_eq!(doc.get_rng(), Range::collapsed_at(p, 1));
        assert!(doc.tree().elements_by_id(CARET_CONTAINER_ID).is_empty());
    }

    #[test]
    fn test_remove_detached_container_is_noop() {
        let markup = format!("<p>a{}</p>", container_markup());
        let tree = DomParser::new().build(&markup);
        let p = tree.first_child(tree.root()).unwrap();
        let container = tree.child_at(p, 1).unwrap();
        let mut doc = Document::new(tree);
        doc.tree_mut().remove(container);
        let before = doc.get_rng();
        remove_container(&mut doc, container, CARET);
        assert_eq!(doc.get_rng(), before);
    }
}
