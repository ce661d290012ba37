//! Ordered node and attribute filter pipeline.
//!
//! Filters are registered against comma-separated lists of node names
//! (`p`, `#comment`, `#pi`) or attribute names. After a tree is built the
//! pipeline walks it once, groups matching nodes per name, then runs every
//! registered entry in registration order, node and attribute entries
//! interleaved.
//!
//! # Example
//!
//! ```
//! use mce_html::{DomParser, FilterPass};
//!
//! let mut parser = DomParser::new();
//! parser.add_node_filter("b", |pass: &mut FilterPass<'_>, nodes, _name| {
//!     for &node in nodes.iter().rev() {
//!         pass.tree.rename(node, "strong");
//!     }
//! });
//!
//! let tree = parser.parse("<p><b>bold</b></p>");
//! assert_eq!(mce_html::inner_html(&tree, tree.root()), "<p><strong>bold</strong></p>");
//! ```

use std::collections::{HashMap, HashSet};

use mce_dom::{NodeId, Schema, Tree};

/// Mutable view handed to filter callbacks.
pub struct FilterPass<'a> {
    pub tree: &'a mut Tree,
    pub schema: &'a Schema,
}

/// Callback invoked with the nodes matching one name and that name.
pub type FilterCallback = Box<dyn Fn(&mut FilterPass<'_>, &[NodeId], &str)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterKind {
    Node,
    Attribute,
}

struct FilterEntry {
    kind: FilterKind,
    names: Vec<String>,
    callback: FilterCallback,
}

/// Registry of filters run over every parsed tree.
#[derive(Default)]
pub struct FilterPipeline {
    entries: Vec<FilterEntry>,
}

impl FilterPipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter for nodes with any of the comma-separated names.
    pub fn add_node_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.push(FilterKind::Node, names, Box::new(callback));
    }

    /// Register a filter for elements carrying any of the comma-separated attributes.
    pub fn add_attribute_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.push(FilterKind::Attribute, names, Box::new(callback));
    }

    fn push(&mut self, kind: FilterKind, names: &str, callback: FilterCallback) {
        let names: Vec<String> = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .collect();
        if names.is_empty() {
            return;
        }
        self.entries.push(FilterEntry {
            kind,
            names,
            callback,
        });
    }

    /// Number of registered entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no filters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every registered filter over the tree.
    pub fn run(&self, tree: &mut Tree, schema: &Schema) {
        if self.entries.is_empty() {
            return;
        }

        let (node_matches, attribute_matches) = self.collect_matches(tree);
        let mut pass = FilterPass { tree, schema };

        for entry in &self.entries {
            let matches = match entry.kind {
                FilterKind::Node => &node_matches,
                FilterKind::Attribute => &attribute_matches,
            };

            for name in &entry.names {
                let Some(group) = matches.get(name.as_str()) else {
                    continue;
                };

                // Earlier filters may have detached, renamed or stripped nodes.
                let live: Vec<NodeId> = group
                    .iter()
                    .copied()
                    .filter(|&node| {
                        pass.tree.is_attached(node)
                            && match entry.kind {
                                FilterKind::Node => pass.tree.name(node) == name.as_str(),
                                FilterKind::Attribute => pass.tree.has_attr(node, name),
                            }
                    })
                    .collect();
                if live.is_empty() {
                    continue;
                }

                tracing::debug!(filter = %name, matched = live.len(), "Running filter");
                (entry.callback)(&mut pass, &live, name);
            }
        }
    }

    /// Group nodes by registered node names and attribute names, in document order.
    fn collect_matches<'a>(
        &'a self,
        tree: &Tree,
    ) -> (HashMap<&'a str, Vec<NodeId>>, HashMap<&'a str, Vec<NodeId>>) {
        let mut node_names = HashSet::new();
        let mut attribute_names = HashSet::new();
        for entry in &self.entries {
            let target = match entry.kind {
                FilterKind::Node => &mut node_names,
                FilterKind::Attribute => &mut attribute_names,
            };
            target.extend(entry.names.iter().map(String::as_str));
        }

        let mut node_matches: HashMap<&str, Vec<NodeId>> = HashMap::new();
        let mut attribute_matches: HashMap<&str, Vec<NodeId>> = HashMap::new();

        for node in tree.descendants(tree.root()) {
            if let Some(&name) = node_names.get(tree.name(node)) {
                node_matches.entry(name).or_default().push(node);
            }
            for (attribute, _) in tree.attributes(node).iter() {
                if let Some(&name) = attribute_names.get(attribute) {
                    attribute_matches.entry(name).or_default().push(node);
                }
            }
        }

        (node_matches, attribute_matches)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::*;

    /// `<p class="a"><b>x</b><b>y</b></p>`
    fn sample() -> (Tree, NodeId, Vec<NodeId>) {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = tree.create_element("p");
        tree.set_attr(p, "class", "a");
        tree.append_child(root, p);
        let mut bs = Vec::new();
        for text in ["x", "y"] {
            let b = tree.create_element("b");
            let t = tree.create_text(text);
            tree.append_child(p, b);
            tree.append_child(b, t);
            bs.push(b);
        }
        (tree, p, bs)
    }

    #[test]
    fn test_node_filter_receives_matches_in_document_order() {
        let (mut tree, _, bs) = sample();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = FilterPipeline::new();
        let sink = Rc::clone(&seen);
        pipeline.add_node_filter("b", move |_, nodes, name| {
            sink.borrow_mut().push((name.to_owned(), nodes.to_vec()));
        });

        pipeline.run(&mut tree, &Schema::new());
        assert_eq!(*seen.borrow(), vec![("b".to_owned(), bs)]);
    }

    #[test]
    fn test_entries_run_in_registration_order_interleaved() {
        let (mut tree, _, _) = sample();
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut pipeline = FilterPipeline::new();

        let sink = Rc::clone(&order);
        pipeline.add_attribute_filter("class", move |_, _, name| {
            sink.borrow_mut().push(format!("attr:{name}"));
        });
        let sink = Rc::clone(&order);
        pipeline.add_node_filter("p,b", move |_, _, name| {
            sink.borrow_mut().push(format!("node:{name}"));
        });
        let sink = Rc::clone(&order);
        pipeline.add_attribute_filter("class", move |_, _, name| {
            sink.borrow_mut().push(format!("attr2:{name}"));
        });

        pipeline.run(&mut tree, &Schema::new());
        assert_eq!(
            *order.borrow(),
            vec!["attr:class", "node:p", "node:b", "attr2:class"]
        );
    }

    #[test]
    fn test_removed_nodes_are_not_passed_to_later_filters() {
        let (mut tree, p, _) = sample();
        let calls = Rc::new(RefCell::new(0));
        let mut pipeline = FilterPipeline::new();

        pipeline.add_node_filter("p", |pass, nodes, _| {
            for &node in nodes.iter().rev() {
                pass.tree.remove(node);
            }
        });
        let sink = Rc::clone(&calls);
        pipeline.add_node_filter("b", move |_, _, _| {
            *sink.borrow_mut() += 1;
        });

        pipeline.run(&mut tree, &Schema::new());
        assert!(!tree.is_attached(p));
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_stripped_attribute_not_passed_to_later_filters() {
        let (mut tree, p, _) = sample();
        let calls = Rc::new(RefCell::new(0));
        let mut pipeline = FilterPipeline::new();

        pipeline.add_attribute_filter("class", |pass, nodes, name| {
            for &node in nodes.iter().rev() {
                pass.tree.remove_attr(node, name);
            }
        });
        let sink = Rc::clone(&calls);
        pipeline.add_attribute_filter("class", move |_, _, _| {
            *sink.borrow_mut() += 1;
        });

        pipeline.run(&mut tree, &Schema::new());
        assert_eq!(tree.attr(p, "class"), None);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_empty_names_are_ignored() {
        let mut pipeline = FilterPipeline::new();
        pipeline.add_node_filter(" , ", |_, _, _| {});
        assert!(pipeline.is_empty());
        pipeline.add_node_filter("p, div", |_, _, _| {});
        assert_eq!(pipeline.len(), 1);
    }
}
