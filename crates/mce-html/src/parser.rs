//! Schema-aware tree builder.

use std::sync::LazyLock;

use mce_dom::{NodeId, NodeType, Schema, Tree, entities};
use regex::Regex;

use crate::filter::{FilterPass, FilterPipeline};
use crate::tokenizer::{Token, tokenize};

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r\n\x0c]+").expect("invalid whitespace regex"));

/// Non-breaking space used to pad empty `#` elements.
const NBSP: &str = "\u{a0}";

/// Elements that close an open sibling of the same family, and the
/// elements that bound the search.
const SIBLING_CLOSERS: &[(&[&str], &[&str])] = &[
    (&["li"], &["ul", "ol", "menu"]),
    (&["dt", "dd"], &["dl"]),
    (&["option"], &["select", "optgroup", "datalist"]),
    (&["tr"], &["table", "tbody", "thead", "tfoot"]),
    (&["td", "th"], &["tr", "table"]),
    (&["tbody", "thead", "tfoot"], &["table"]),
];

/// Parses markup into a [`Tree`] and runs the registered filters over it.
pub struct DomParser {
    schema: Schema,
    filters: FilterPipeline,
}

impl DomParser {
    /// Create a parser with a permissive schema and no filters.
    #[must_use]
    pub fn new() -> Self {
        Self::with_schema(Schema::new())
    }

    #[must_use]
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            filters: FilterPipeline::new(),
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn schema_mut(&mut self) -> &mut Schema {
        &mut self.schema
    }

    /// Register a node filter. See [`FilterPipeline::add_node_filter`].
    pub fn add_node_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.filters.add_node_filter(names, callback);
    }

    /// Register an attribute filter. See [`FilterPipeline::add_attribute_filter`].
    pub fn add_attribute_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.filters.add_attribute_filter(names, callback);
    }

    /// Parse markup into a fragment-rooted tree and apply the filters.
    #[must_use]
    pub fn parse(&self, html: &str) -> Tree {
        let mut tree = self.build(html);
        self.filters.run(&mut tree, &self.schema);
        tree
    }

    /// Parse markup without running the filters.
    #[must_use]
    pub fn build(&self, html: &str) -> Tree {
        let mut builder = TreeBuilder::new(&self.schema);
        for token in tokenize(html) {
            builder.push(token);
        }
        let mut tree = builder.finish();
        normalize_whitespace(&mut tree, &self.schema);
        apply_empty_rules(&mut tree, &self.schema);
        tree
    }
}

impl Default for DomParser {
    fn default() -> Self {
        Self::new()
    }
}

struct TreeBuilder<'a> {
    schema: &'a Schema,
    tree: Tree,
    /// Open elements, innermost last. The root is implicit.
    open: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            tree: Tree::new(),
            open: Vec::new(),
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or_else(|| self.tree.root())
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::Text(text) => self.text(&entities::decode(&text)),
            Token::RawText(text) => self.text(&text),
            Token::StartTag {
                name,
                attributes,
                self_closing,
            } => self.start_tag(name, attributes, self_closing),
            Token::EndTag(name) => self.end_tag(&name),
            Token::Comment(text) => self.leaf(NodeType::Comment, text),
            Token::ProcessingInstruction(text) => self.leaf(NodeType::ProcessingInstruction, text),
            Token::Doctype(text) => self.leaf(NodeType::DocumentType, text),
        }
    }

    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let parent = self.current();
        if let Some(last) = self.tree.last_child(parent)
            && self.tree.is_text(last)
            && !self.tree.is_raw(last)
        {
            let merged = format!("{}{text}", self.tree.value(last).unwrap_or_default());
            self.tree.set_value(last, merged);
            return;
        }
        let node = self.tree.create_text(text);
        self.tree.append_child(parent, node);
    }

    fn leaf(&mut self, node_type: NodeType, value: String) {
        let node = self.tree.create_node(node_type, value);
        let parent = self.current();
        self.tree.append_child(parent, node);
    }

    fn start_tag(
        &mut self,
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    ) {
        let name = match self.schema.resolve_alias(&name) {
            Some(canonical) => canonical.to_owned(),
            None => name,
        };

        self.close_implied(&name);

        if !self.schema.is_valid_element(&name) {
            // Children attach to the current parent, so the element is unwrapped.
            tracing::debug!(element = %name, "Dropped invalid element");
            return;
        }

        let node = self.tree.create_element(name.as_str());
        for (attribute, value) in attributes {
            if !self.schema.is_valid_attribute(&name, &attribute) {
                tracing::debug!(element = %name, attribute = %attribute, "Dropped invalid attribute");
                continue;
            }
            if self.tree.has_attr(node, &attribute) {
                continue;
            }
            let value = match value {
                Some(value) => entities::decode(&value),
                None if self.schema.fill_attribute(&attribute) => attribute.clone(),
                None => String::new(),
            };
            self.tree.set_attr(node, attribute, value);
        }
        for (attribute, default) in self.schema.attribute_defaults(&name) {
            if !self.tree.has_attr(node, attribute) {
                self.tree.set_attr(node, attribute, default);
            }
        }

        let parent = self.current();
        self.tree.append_child(parent, node);

        if !self_closing && !self.schema.is_short_ended(&name) {
            self.open.push(node);
        }
    }

    /// Close elements implicitly ended by a new `name` start tag.
    fn close_implied(&mut self, name: &str) {
        if self.schema.is_block(name) {
            self.close_open_paragraph();
        }

        for (family, boundaries) in SIBLING_CLOSERS {
            if !family.contains(&name) {
                continue;
            }
            let found = self.open.iter().rposition(|&open| {
                let open_name = self.tree.name(open);
                family.contains(&open_name) || boundaries.contains(&open_name)
            });
            if let Some(index) = found
                && family.contains(&self.tree.name(self.open[index]))
            {
                self.open.truncate(index);
            }
        }
    }

    /// Close an open `p`, unless a block other than `p` sits above it.
    fn close_open_paragraph(&mut self) {
        for index in (0..self.open.len()).rev() {
            let open_name = self.tree.name(self.open[index]);
            if open_name == "p" {
                self.open.truncate(index);
                return;
            }
            if self.schema.is_block(open_name) {
                return;
            }
        }
    }

    fn end_tag(&mut self, name: &str) {
        let name = self.schema.resolve_alias(name).unwrap_or(name);
        if self.schema.is_short_ended(name) {
            return;
        }
        match self
            .open
            .iter()
            .rposition(|&open| self.tree.name(open) == name)
        {
            Some(index) => self.open.truncate(index),
            None => tracing::debug!(element = %name, "Dropped unmatched end tag"),
        }
    }

    fn finish(self) -> Tree {
        self.tree
    }
}

/// Collapse whitespace runs outside whitespace-preserving elements and
/// trim whitespace at block boundaries.
fn normalize_whitespace(tree: &mut Tree, schema: &Schema) {
    let texts: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&node| tree.is_text(node))
        .collect();

    for node in texts {
        let preserved = tree
            .ancestors(node)
            .any(|ancestor| schema.is_whitespace_element(tree.name(ancestor)));
        if preserved || tree.is_raw(node) {
            continue;
        }

        let value = tree.value(node).unwrap_or_default();
        let mut collapsed = WHITESPACE_RUN.replace_all(value, " ").into_owned();

        if at_block_edge(tree, schema, node, tree.prev_sibling(node)) {
            collapsed = collapsed.trim_start_matches(' ').to_owned();
        }
        if at_block_edge(tree, schema, node, tree.next_sibling(node)) {
            collapsed = collapsed.trim_end_matches(' ').to_owned();
        }

        if collapsed.is_empty() {
            tree.remove(node);
        } else {
            tree.set_value(node, collapsed);
        }
    }
}

/// Whether the side of `node` facing `sibling` is a block boundary.
fn at_block_edge(tree: &Tree, schema: &Schema, node: NodeId, sibling: Option<NodeId>) -> bool {
    match sibling {
        Some(sibling) => {
            tree.is_element(sibling)
                && (schema.is_block(tree.name(sibling)) || tree.name(sibling) == "br")
        }
        None => tree.parent(node).is_none_or(|parent| {
            !tree.is_element(parent) || schema.is_block(tree.name(parent))
        }),
    }
}

/// Remove empty `-` elements and pad empty `#` elements, innermost first.
fn apply_empty_rules(tree: &mut Tree, schema: &Schema) {
    if !schema.is_restricted() {
        return;
    }
    let elements: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&node| tree.is_element(node))
        .collect();

    for node in elements.into_iter().rev() {
        if tree.first_child(node).is_some() {
            continue;
        }
        let Some(rule) = schema.element_rule(tree.name(node)) else {
            continue;
        };
        if rule.remove_empty {
            tracing::debug!(element = %tree.name(node), "Removed empty element");
            tree.remove(node);
        } else if rule.pad_empty {
            let pad = tree.create_text(NBSP);
            tree.append_child(node, pad);
        }
    }
}
