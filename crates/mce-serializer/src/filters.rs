//! Built-in cleanup filters registered by every [`Serializer`](crate::Serializer).
//!
//! Each filter iterates its matches in reverse so nodes removed or moved
//! along the way never shift the ones still to be visited.

use std::rc::Rc;
use std::sync::LazyLock;

use mce_dom::{NodeId, NodeType, styles};
use mce_html::{DomParser, FilterPass, unprotect};
use regex::Regex;

use crate::url_converter::UrlConverter;

static GUARD_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(<!--\[CDATA\[|\]\]-->)").expect("invalid guard comment regex"));

static EDGE_NEWLINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\r\n]*|[\r\n]*$").expect("invalid edge newline regex"));

static LEADING_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(//\s*<!--|//\s*<!\[CDATA\[|<!--|<!\[CDATA\[)[\r\n]*")
        .expect("invalid leading guard regex")
});

static TRAILING_GUARD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*(//\s*\]\]>|//\s*-->|\]\]>|-->|\]\]-->)\s*$")
        .expect("invalid trailing guard regex")
});

/// Prefix given to `type` on scripts disabled while editing.
const SCRIPT_TYPE_PREFIX: &str = "mce-";

/// Internal attributes that never reach serialized output.
pub(crate) const INTERNAL_ATTRIBUTES: &str =
    "data-mce-src,data-mce-href,data-mce-style,data-mce-selected";

/// Register the built-in filters, in pipeline order.
pub(crate) fn register(
    parser: &mut DomParser,
    url_converter: Option<Rc<dyn UrlConverter>>,
    fix_list_elements: bool,
) {
    parser.add_attribute_filter("src,href,style", move |pass, nodes, name| {
        resolve_url_attributes(pass, nodes, name, url_converter.as_deref());
    });
    parser.add_attribute_filter("class", strip_item_classes);
    parser.add_attribute_filter("data-mce-type", remove_bookmarks);
    parser.add_attribute_filter("data-mce-bogus", remove_bogus);
    parser.add_attribute_filter(INTERNAL_ATTRIBUTES, strip_internal_attributes);
    parser.add_node_filter("script,style", guard_script_and_style);
    parser.add_node_filter("br", remove_trailing_br);
    parser.add_node_filter("#comment", reclassify_comments);
    parser.add_node_filter("#pi,input", fix_namespaces_and_inputs);
    if fix_list_elements {
        parser.add_node_filter("ul,ol", fix_nested_lists);
    }
}

/// Promote `data-mce-<name>` mirrors, otherwise normalize styles and convert URLs.
fn resolve_url_attributes(
    pass: &mut FilterPass<'_>,
    nodes: &[NodeId],
    name: &str,
    url_converter: Option<&dyn UrlConverter>,
) {
    let internal = format!("data-mce-{name}");
    for &node in nodes.iter().rev() {
        if let Some(mirror) = pass.tree.remove_attr(node, &internal)
            && !mirror.is_empty()
        {
            pass.tree.set_attr(node, name, mirror);
            continue;
        }

        let Some(value) = pass.tree.attr(node, name).map(str::to_owned) else {
            continue;
        };
        if name == "style" {
            let style = styles::normalize_style(&value);
            if style.is_empty() {
                pass.tree.remove_attr(node, name);
            } else {
                pass.tree.set_attr(node, name, style);
            }
        } else if let Some(converter) = url_converter {
            let converted = converter.convert(&value, name, pass.tree.name(node));
            pass.tree.set_attr(node, name, converted);
        }
    }
}

/// Drop `mceItem*` classes; remove `class` when nothing is left.
fn strip_item_classes(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        let Some(value) = pass.tree.attr(node, name) else {
            continue;
        };
        let kept: Vec<&str> = value
            .split_ascii_whitespace()
            .filter(|class| !class.starts_with("mceItem"))
            .collect();
        if kept.is_empty() {
            pass.tree.remove_attr(node, name);
        } else {
            let kept = kept.join(" ");
            pass.tree.set_attr(node, name, kept);
        }
    }
}

fn remove_bookmarks(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        if pass.tree.attr(node, name) == Some("bookmark") {
            pass.tree.remove(node);
        }
    }
}

/// `data-mce-bogus="all"` drops the subtree, any other value keeps the children.
fn remove_bogus(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        if pass.tree.attr(node, name) == Some("all") {
            pass.tree.remove(node);
        } else {
            pass.tree.unwrap(node);
        }
    }
}

fn strip_internal_attributes(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        pass.tree.remove_attr(node, name);
    }
}

/// Strip existing comment or CDATA guards from script and style text.
fn trim_guards(value: &str) -> String {
    let value = GUARD_COMMENT.replace_all(value, "\n");
    let value = EDGE_NEWLINES.replace_all(&value, "");
    let value = LEADING_GUARD.replace_all(&value, "");
    TRAILING_GUARD.replace_all(&value, "").into_owned()
}

fn guard_script_and_style(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        let text = pass.tree.first_child(node);
        let value = text
            .and_then(|text| pass.tree.value(text))
            .unwrap_or_default()
            .to_owned();

        let guarded = if name == "script" {
            let kind = pass
                .tree
                .attr(node, "type")
                .filter(|kind| !kind.is_empty())
                .unwrap_or("text/javascript");
            let kind = kind.strip_prefix(SCRIPT_TYPE_PREFIX).unwrap_or(kind).to_owned();
            pass.tree.set_attr(node, "type", kind);
            format!("// <![CDATA[\n{}\n// ]]>", trim_guards(&value))
        } else {
            format!("<!--\n{}\n-->", trim_guards(&value))
        };

        if let Some(text) = text
            && !value.is_empty()
        {
            pass.tree.set_value(text, guarded);
        }
    }
}

/// A `br` closing a block renders nothing.
fn remove_trailing_br(pass: &mut FilterPass<'_>, nodes: &[NodeId], _name: &str) {
    for &node in nodes.iter().rev() {
        let Some(parent) = pass.tree.parent(node) else {
            continue;
        };
        if pass.schema.is_block(pass.tree.name(parent)) && pass.tree.last_child(parent) == Some(node)
        {
            pass.tree.remove(node);
        }
    }
}

/// `[CDATA[..]]` comments become CDATA, protected comments become raw text.
fn reclassify_comments(pass: &mut FilterPass<'_>, nodes: &[NodeId], _name: &str) {
    for &node in nodes.iter().rev() {
        let Some(value) = pass.tree.value(node) else {
            continue;
        };

        if let Some(body) = value.strip_prefix("[CDATA[") {
            let body = body.strip_suffix("]]").unwrap_or(body).to_owned();
            pass.tree.retype(node, NodeType::CData);
            pass.tree.set_value(node, body);
        } else if let Some(content) = unprotect(value) {
            pass.tree.retype(node, NodeType::Text);
            pass.tree.set_value(node, content);
            pass.tree.set_raw(node, true);
        }
    }
}

fn fix_namespaces_and_inputs(pass: &mut FilterPass<'_>, nodes: &[NodeId], name: &str) {
    for &node in nodes.iter().rev() {
        match pass.tree.node_type(node) {
            NodeType::ProcessingInstruction => {
                let is_namespace = pass
                    .tree
                    .value(node)
                    .and_then(|value| value.split_whitespace().next())
                    .is_some_and(|target| target.ends_with(":namespace"));
                if is_namespace {
                    pass.tree.remove(node);
                }
            }
            NodeType::Element if name == "input" => {
                if !pass.tree.has_attr(node, "type") {
                    pass.tree.set_attr(node, "type", "text");
                }
            }
            _ => {}
        }
    }
}

/// Move a list nested directly in a list into the preceding `li`.
fn fix_nested_lists(pass: &mut FilterPass<'_>, nodes: &[NodeId], _name: &str) {
    for &node in nodes.iter().rev() {
        let Some(parent) = pass.tree.parent(node) else {
            continue;
        };
        if !matches!(pass.tree.name(parent), "ul" | "ol") {
            continue;
        }
        if let Some(prev) = pass.tree.prev_sibling(node)
            && pass.tree.is_element(prev)
            && pass.tree.name(prev) == "li"
        {
            pass.tree.append_child(prev, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_trim_guards_plain() {
        assert_eq!(trim_guards("\nalert(1)\n"), "alert(1)");
    }

    #[test]
    fn test_trim_guards_script_cdata() {
        assert_eq!(trim_guards("// <![CDATA[\nalert(1)\n// ]]>"), "alert(1)");
    }

    #[test]
    fn test_trim_guards_style_comment() {
        assert_eq!(trim_guards("<!--\np { color: red }\n-->"), "p { color: red }");
    }

    #[test]
    fn test_trim_guards_comment_cdata() {
        assert_eq!(trim_guards("<!--[CDATA[x = 1]]-->"), "x = 1");
    }
}
