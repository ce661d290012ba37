//! Arena node tree.
//!
//! Nodes live in a single vector owned by the [`Tree`] and link to each
//! other by [`NodeId`]. Detaching a node never frees its slot, so handles
//! collected before a mutation stay usable; callers check
//! [`Tree::is_attached`] when they need to know whether a node is still
//! part of the document.

use crate::node::{Attributes, NodeId, NodeType};

#[derive(Debug, Clone)]
struct NodeData {
    node_type: NodeType,
    name: String,
    value: Option<String>,
    attributes: Attributes,
    raw: bool,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

impl NodeData {
    fn new(node_type: NodeType, name: String, value: Option<String>) -> Self {
        Self {
            node_type,
            name,
            value,
            attributes: Attributes::new(),
            raw: false,
            parent: None,
            first_child: None,
            last_child: None,
            prev: None,
            next: None,
        }
    }
}

/// Arena-backed DOM tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl Tree {
    /// Create a tree whose root is a `#document-fragment`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(NodeType::Fragment)
    }

    /// Create a tree whose root is a `#document`.
    #[must_use]
    pub fn document() -> Self {
        Self::with_root(NodeType::Document)
    }

    fn with_root(node_type: NodeType) -> Self {
        let name = node_type.pseudo_name().unwrap_or_default().to_owned();
        Self {
            nodes: vec![NodeData::new(node_type, name, None)],
            root: NodeId::new(0),
        }
    }

    /// Root node of the tree.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(data);
        id
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.index()]
    }

    fn data_mut(&mut self, id: NodeId) -> &mut NodeData {
        &mut self.nodes[id.index()]
    }

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        self.push(NodeData::new(NodeType::Element, name.into(), None))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.create_node(NodeType::Text, text)
    }

    /// Create a detached text node that is written out without escaping.
    pub fn create_raw_text(&mut self, text: impl Into<String>) -> NodeId {
        let id = self.create_text(text);
        self.data_mut(id).raw = true;
        id
    }

    /// Create a detached value-carrying node (text, comment, CDATA, PI, doctype).
    ///
    /// Container types are created empty with no value.
    pub fn create_node(&mut self, node_type: NodeType, value: impl Into<String>) -> NodeId {
        let name = node_type.pseudo_name().unwrap_or("div").to_owned();
        let value = node_type.has_value().then(|| value.into());
        self.push(NodeData::new(node_type, name, value))
    }

    /// Node type.
    #[must_use]
    pub fn node_type(&self, id: NodeId) -> NodeType {
        self.data(id).node_type
    }

    /// Whether the node is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.node_type(id) == NodeType::Element
    }

    /// Whether the node is a text node.
    #[must_use]
    pub fn is_text(&self, id: NodeId) -> bool {
        self.node_type(id) == NodeType::Text
    }

    /// Tag name for elements, pseudo-name for everything else.
    #[must_use]
    pub fn name(&self, id: NodeId) -> &str {
        &self.data(id).name
    }

    /// Rename an element. Non-element nodes keep their pseudo-name.
    pub fn rename(&mut self, id: NodeId, name: impl Into<String>) {
        let data = self.data_mut(id);
        if data.node_type == NodeType::Element {
            data.name = name.into();
        }
    }

    /// Change the type of a node, keeping its name consistent.
    ///
    /// Retyping to a non-element type takes that type's pseudo-name;
    /// retyping to an element keeps the current name when it already is one.
    pub fn retype(&mut self, id: NodeId, node_type: NodeType) {
        let data = self.data_mut(id);
        if let Some(name) = node_type.pseudo_name() {
            name.clone_into(&mut data.name);
            if data.value.is_none() && node_type.has_value() {
                data.value = Some(String::new());
            }
        } else if data.node_type != NodeType::Element {
            "span".clone_into(&mut data.name);
            data.value = None;
        }
        data.node_type = node_type;
    }

    /// Text payload of value-carrying nodes.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.data(id).value.as_deref()
    }

    /// Replace the text payload.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.data_mut(id).value = Some(value.into());
    }

    /// Whether a text node is written out unescaped.
    #[must_use]
    pub fn is_raw(&self, id: NodeId) -> bool {
        self.data(id).raw
    }

    /// Mark a text node as raw (written unescaped) or not.
    pub fn set_raw(&mut self, id: NodeId, raw: bool) {
        self.data_mut(id).raw = raw;
    }

    /// Attributes of a node.
    #[must_use]
    pub fn attributes(&self, id: NodeId) -> &Attributes {
        &self.data(id).attributes
    }

    /// Value of the named attribute.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.data(id).attributes.get(name)
    }

    /// Whether the named attribute is present.
    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.data(id).attributes.contains(name)
    }

    /// Set an attribute on an element. Ignored for non-element nodes.
    pub fn set_attr(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        let data = self.data_mut(id);
        if data.node_type == NodeType::Element {
            data.attributes.set(name, value);
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.data_mut(id).attributes.remove(name)
    }

    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).parent
    }

    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).first_child
    }

    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).last_child
    }

    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).prev
    }

    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.data(id).next
    }

    /// Iterate over the direct children of a node.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Direct children collected into a vector, for callers that mutate while iterating.
    #[must_use]
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).collect()
    }

    /// Number of direct children.
    #[must_use]
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// Child at the given index.
    #[must_use]
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// Position of a node among its siblings.
    #[must_use]
    pub fn index_of(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).position(|child| child == id)
    }

    /// Iterate over the ancestors of a node, nearest first. The node itself is excluded.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Iterate over the descendants of a node in document order. The node itself is excluded.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            tree: self,
            scope: id,
            next: self.first_child(id),
        }
    }

    /// Whether `node` is `ancestor` or lies inside it.
    #[must_use]
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|id| id == ancestor)
    }

    /// Whether the node is reachable from the tree root.
    #[must_use]
    pub fn is_attached(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len() && self.contains(self.root, id)
    }

    /// Detach a node (with its subtree) from its parent.
    pub fn remove(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let prev = self.prev_sibling(id);
        let next = self.next_sibling(id);

        match prev {
            Some(prev) => self.data_mut(prev).next = next,
            None => self.data_mut(parent).first_child = next,
        }
        match next {
            Some(next) => self.data_mut(next).prev = prev,
            None => self.data_mut(parent).last_child = prev,
        }

        let data = self.data_mut(id);
        data.parent = None;
        data.prev = None;
        data.next = None;
    }

    /// Append a node as the last child of `parent`, detaching it first.
    ///
    /// Ignored when `parent` cannot hold children or when the move would
    /// place a node inside itself.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if !self.node_type(parent).is_container() || self.contains(child, parent) {
            return;
        }
        self.remove(child);

        let last = self.last_child(parent);
        {
            let data = self.data_mut(child);
            data.parent = Some(parent);
            data.prev = last;
        }
        match last {
            Some(last) => self.data_mut(last).next = Some(child),
            None => self.data_mut(parent).first_child = Some(child),
        }
        self.data_mut(parent).last_child = Some(child);
    }

    /// Insert `node` immediately before `reference`. No-op when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, node: NodeId) {
        if reference == node || self.contains(node, reference) {
            return;
        }
        let Some(parent) = self.parent(reference) else {
            return;
        };
        self.remove(node);

        let prev = self.prev_sibling(reference);
        {
            let data = self.data_mut(node);
            data.parent = Some(parent);
            data.prev = prev;
            data.next = Some(reference);
        }
        self.data_mut(reference).prev = Some(node);
        match prev {
            Some(prev) => self.data_mut(prev).next = Some(node),
            None => self.data_mut(parent).first_child = Some(node),
        }
    }

    /// Insert `node` immediately after `reference`. No-op when `reference` has no parent.
    pub fn insert_after(&mut self, reference: NodeId, node: NodeId) {
        if reference == node || self.parent(reference).is_none() {
            return;
        }
        match self.next_sibling(reference) {
            Some(next) => self.insert_before(next, node),
            None => {
                if let Some(parent) = self.parent(reference) {
                    self.append_child(parent, node);
                }
            }
        }
    }

    /// Replace a node by its children, then detach it.
    pub fn unwrap(&mut self, id: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        for child in self.child_ids(id) {
            self.insert_before(id, child);
        }
        self.remove(id);
    }

    /// Length of a node in DOM offset units.
    ///
    /// Characters for value-carrying nodes, child count for containers.
    #[must_use]
    pub fn len(&self, id: NodeId) -> usize {
        match self.value(id) {
            Some(value) => value.chars().count(),
            None => self.child_count(id),
        }
    }

    /// Remove `count` characters starting at character `offset` from a
    /// value-carrying node. Out-of-range requests are clamped.
    pub fn delete_data(&mut self, id: NodeId, offset: usize, count: usize) {
        let Some(value) = self.data_mut(id).value.as_mut() else {
            return;
        };
        let start = char_boundary(value, offset);
        let end = char_boundary(value, offset.saturating_add(count));
        value.replace_range(start..end, "");
    }

    /// Concatenated text of all descendant text nodes.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        if self.is_text(id) {
            return self.value(id).unwrap_or_default().to_owned();
        }
        self.descendants(id)
            .filter(|&node| self.is_text(node))
            .filter_map(|node| self.value(node))
            .collect()
    }

    /// First attached element carrying the given `id` attribute.
    #[must_use]
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.elements_by_id(id).into_iter().next()
    }

    /// Every attached element carrying the given `id` attribute, in document order.
    #[must_use]
    pub fn elements_by_id(&self, id: &str) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&node| self.is_element(node) && self.attr(node, "id") == Some(id))
            .collect()
    }

    /// Copy a node and its subtree from another tree into this one, detached.
    pub fn import(&mut self, other: &Tree, id: NodeId) -> NodeId {
        let copy = self.push(other.detached_copy(id));
        for child in other.children(id) {
            let child_copy = self.import(other, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Copy a node without its children, detached, into this tree.
    pub fn import_shallow(&mut self, other: &Tree, id: NodeId) -> NodeId {
        self.push(other.detached_copy(id))
    }

    /// Deep-clone a node into a fresh tree, appended under that tree's fragment root.
    #[must_use]
    pub fn clone_subtree(&self, id: NodeId) -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let copy = tree.import(self, id);
        let root = tree.root();
        tree.append_child(root, copy);
        (tree, copy)
    }

    fn detached_copy(&self, id: NodeId) -> NodeData {
        let source = self.data(id);
        let mut data = NodeData::new(source.node_type, source.name.clone(), source.value.clone());
        data.attributes = source.attributes.clone();
        data.raw = source.raw;
        data
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte index of the `chars`-th character, clamped to the string length.
fn char_boundary(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Iterator over direct children.
pub struct Children<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Iterator over ancestors, nearest first.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a scope node.
pub struct Descendants<'a> {
    tree: &'a Tree,
    scope: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.scope {
                    return None;
                }
                if let Some(sibling) = self.tree.next_sibling(node) {
                    return Some(sibling);
                }
                node = self.tree.parent(node)?;
            }
        });
        Some(current)
    }
}
