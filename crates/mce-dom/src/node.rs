//! Node identity, node types and attribute storage.

/// Handle of a node inside a [`Tree`](crate::Tree).
///
/// Handles are only meaningful for the tree that created them. A handle
/// stays valid after the node is removed; use
/// [`Tree::is_attached`](crate::Tree::is_attached) to check whether the
/// node is still reachable from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// DOM node type. Discriminants match the DOM `nodeType` codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NodeType {
    Element = 1,
    Text = 3,
    CData = 4,
    ProcessingInstruction = 7,
    Comment = 8,
    Document = 9,
    DocumentType = 10,
    Fragment = 11,
}

impl NodeType {
    /// Numeric DOM `nodeType` code.
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Fixed name carried by non-element nodes (`#text`, `#comment`, ...).
    ///
    /// Elements are named by their tag and return `None`.
    #[must_use]
    pub fn pseudo_name(self) -> Option<&'static str> {
        match self {
            Self::Element => None,
            Self::Text => Some("#text"),
            Self::CData => Some("#cdata"),
            Self::ProcessingInstruction => Some("#pi"),
            Self::Comment => Some("#comment"),
            Self::Document => Some("#document"),
            Self::DocumentType => Some("#doctype"),
            Self::Fragment => Some("#document-fragment"),
        }
    }

    /// Whether nodes of this type may have children.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Element | Self::Document | Self::Fragment)
    }

    /// Whether nodes of this type carry a text payload.
    #[must_use]
    pub fn has_value(self) -> bool {
        matches!(
            self,
            Self::Text | Self::CData | Self::ProcessingInstruction | Self::Comment | Self::DocumentType
        )
    }
}

/// Insertion-ordered attribute map.
///
/// Attribute order is preserved on output, so a plain vector is used
/// instead of a hash map; elements rarely carry more than a handful.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the named attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Whether the named attribute is present (possibly with an empty value).
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(key, _)| key == name)
    }

    /// Set an attribute, replacing the value in place when it already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Remove an attribute, returning its previous value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self.entries.iter().position(|(key, _)| key == name)?;
        Some(self.entries.remove(position).1)
    }

    /// Keep only the attributes for which `keep` returns `true`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.entries.retain(|(key, value)| keep(key, value));
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.set(key, value);
        }
        attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pseudo_names_match_types() {
        assert_eq!(NodeType::Text.pseudo_name(), Some("#text"));
        assert_eq!(NodeType::CData.pseudo_name(), Some("#cdata"));
        assert_eq!(NodeType::Comment.pseudo_name(), Some("#comment"));
        assert_eq!(NodeType::Element.pseudo_name(), None);
        assert_eq!(NodeType::Text.code(), 3);
        assert_eq!(NodeType::CData.code(), 4);
    }

    #[test]
    fn test_attributes_keep_insertion_order() {
        let mut attrs: Attributes = [("id", "a"), ("class", "b")].into_iter().collect();
        attrs.set("title", "c");
        attrs.set("id", "z");

        let pairs: Vec<_> = attrs.iter().collect();
        assert_eq!(pairs, vec![("id", "z"), ("class", "b"), ("title", "c")]);
    }

    #[test]
    fn test_attributes_remove_and_contains() {
        let mut attrs: Attributes = [("checked", "")].into_iter().collect();
        assert!(attrs.contains("checked"));
        assert_eq!(attrs.get("checked"), Some(""));
        assert_eq!(attrs.remove("checked"), Some(String::new()));
        assert!(attrs.is_empty());
        assert_eq!(attrs.remove("checked"), None);
    }
}
