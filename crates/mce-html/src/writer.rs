//! HTML writer.

use std::fmt;
use std::str::FromStr;

use mce_dom::{EntityEncoding, NodeId, NodeType, Schema, Tree, entities};
use serde::Deserialize;

/// How void elements are closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementFormat {
    /// `<br>`
    #[default]
    Html,
    /// `<br />`
    Xhtml,
}

impl fmt::Display for ElementFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Html => "html",
            Self::Xhtml => "xhtml",
        })
    }
}

impl FromStr for ElementFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "xhtml" => Ok(Self::Xhtml),
            other => Err(format!("unknown element format: {other}")),
        }
    }
}

/// Writes a [`Tree`] back to markup.
#[derive(Debug, Clone, Default)]
pub struct HtmlSerializer {
    schema: Schema,
    entity_encoding: EntityEncoding,
    element_format: ElementFormat,
}

impl HtmlSerializer {
    /// Create a writer using named entities and `html` element format.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entity_encoding(mut self, encoding: EntityEncoding) -> Self {
        self.entity_encoding = encoding;
        self
    }

    #[must_use]
    pub fn with_element_format(mut self, format: ElementFormat) -> Self {
        self.element_format = format;
        self
    }

    #[must_use]
    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    /// Serialize a node. Document and fragment nodes write their children only.
    pub fn serialize(&self, tree: &Tree, node: NodeId) -> String {
        let mut out = String::with_capacity(1024);
        match tree.node_type(node) {
            NodeType::Document | NodeType::Fragment => self.write_children(tree, node, &mut out),
            _ => self.write_node(tree, node, &mut out),
        }
        out
    }

    /// Serialize the children of a node.
    pub fn serialize_children(&self, tree: &Tree, node: NodeId) -> String {
        let mut out = String::with_capacity(1024);
        self.write_children(tree, node, &mut out);
        out
    }

    fn write_children(&self, tree: &Tree, node: NodeId, out: &mut String) {
        for child in tree.children(node) {
            self.write_node(tree, child, out);
        }
    }

    fn write_node(&self, tree: &Tree, node: NodeId, out: &mut String) {
        let value = tree.value(node).unwrap_or_default();
        match tree.node_type(node) {
            NodeType::Element => self.write_element(tree, node, out),
            NodeType::Text => {
                let raw_parent = tree
                    .parent(node)
                    .is_some_and(|parent| self.schema.is_raw_text(tree.name(parent)));
                if tree.is_raw(node) || raw_parent {
                    out.push_str(value);
                } else {
                    out.push_str(&entities::encode_text(value, self.entity_encoding));
                }
            }
            NodeType::CData => {
                out.push_str("<![CDATA[");
                out.push_str(value);
                out.push_str("]]>");
            }
            NodeType::Comment => {
                out.push_str("<!--");
                out.push_str(value);
                out.push_str("-->");
            }
            NodeType::ProcessingInstruction => {
                out.push_str("<?");
                out.push_str(value);
                out.push_str("?>");
            }
            NodeType::DocumentType => {
                out.push_str("<!DOCTYPE ");
                out.push_str(value);
                out.push('>');
            }
            NodeType::Document | NodeType::Fragment => self.write_children(tree, node, out),
        }
    }

    fn write_element(&self, tree: &Tree, node: NodeId, out: &mut String) {
        let name = tree.name(node);
        out.push('<');
        out.push_str(name);
        for (attribute, value) in tree.attributes(node).iter() {
            out.push(' ');
            out.push_str(attribute);
            out.push_str("=\"");
            out.push_str(&entities::encode_attribute(value, self.entity_encoding));
            out.push('"');
        }

        if self.schema.is_short_ended(name) {
            out.push_str(match self.element_format {
                ElementFormat::Html => ">",
                ElementFormat::Xhtml => " />",
            });
            return;
        }

        out.push('>');
        self.write_children(tree, node, out);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

/// Markup of a node including itself, without entity policy.
pub fn outer_html(tree: &Tree, node: NodeId) -> String {
    raw_writer().serialize(tree, node)
}

/// Markup of a node's children, without entity policy.
pub fn inner_html(tree: &Tree, node: NodeId) -> String {
    raw_writer().serialize_children(tree, node)
}

fn raw_writer() -> HtmlSerializer {
    HtmlSerializer::new().with_entity_encoding(EntityEncoding::Raw)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn sample() -> (Tree, NodeId) {
        let mut tree = Tree::new();
        let root = tree.root();
        let p = tree.create_element("p");
        tree.set_attr(p, "title", "a \"b\" & c");
        let text = tree.create_text("x < y\u{a0}z");
        let br = tree.create_element("br");
        tree.append_child(root, p);
        tree.append_child(p, text);
        tree.append_child(p, br);
        (tree, p)
    }

    #[test]
    fn test_named_encoding_and_html_format() {
        let (tree, p) = sample();
        assert_eq!(
            HtmlSerializer::new().serialize(&tree, p),
            "<p title=\"a &quot;b&quot; &amp; c\">x &lt; y&nbsp;z<br></p>"
        );
    }

    #[test]
    fn test_xhtml_format_and_numeric_encoding() {
        let (tree, p) = sample();
        let writer = HtmlSerializer::new()
            .with_element_format(ElementFormat::Xhtml)
            .with_entity_encoding(EntityEncoding::Numeric);
        assert_eq!(
            writer.serialize(&tree, p),
            "<p title=\"a &quot;b&quot; &amp; c\">x &lt; y&#160;z<br /></p>"
        );
    }

    #[test]
    fn test_inner_and_outer_html_are_raw() {
        let (tree, p) = sample();
        assert_eq!(inner_html(&tree, p), "x &lt; y\u{a0}z<br>");
        assert!(outer_html(&tree, p).starts_with("<p title="));
    }

    #[test]
    fn test_special_nodes() {
        let mut tree = Tree::new();
        let root = tree.root();
        for (node_type, value) in [
            (NodeType::DocumentType, "html"),
            (NodeType::Comment, " c "),
            (NodeType::CData, "a<b"),
            (NodeType::ProcessingInstruction, "php echo 1 ?"),
        ] {
            let node = tree.create_node(node_type, value);
            tree.append_child(root, node);
        }
        let raw = tree.create_raw_text("<b>&nbsp;</b>");
        tree.append_child(root, raw);

        assert_eq!(
            HtmlSerializer::new().serialize(&tree, root),
            "<!DOCTYPE html><!-- c --><![CDATA[a<b]]><?php echo 1 ??><b>&nbsp;</b>"
        );
    }

    #[test]
    fn test_script_text_not_escaped() {
        let mut tree = Tree::new();
        let root = tree.root();
        let script = tree.create_element("script");
        let code = tree.create_text("if (a < b && c) {}");
        tree.append_child(root, script);
        tree.append_child(script, code);
        assert_eq!(
            HtmlSerializer::new().serialize(&tree, root),
            "<script>if (a < b && c) {}</script>"
        );
    }

    #[test]
    fn test_parse_element_format() {
        assert_eq!("XHTML".parse::<ElementFormat>(), Ok(ElementFormat::Xhtml));
        assert!("svg".parse::<ElementFormat>().is_err());
    }
}
