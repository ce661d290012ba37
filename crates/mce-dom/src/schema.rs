//! Element and attribute schema.
//!
//! Holds the fixed HTML element classes (block, void, whitespace
//! preserving, raw text, boolean attributes) and an optional set of
//! valid-element rules in the classic rule grammar:
//!
//! ```text
//! a[href|title|target=_blank],-span,#p,strong/b,@[id|class|style],*[*]
//! ```
//!
//! A leading `-` removes the element when it ends up empty, a leading `#`
//! pads an empty element with a non-breaking space, `name/alias` renames
//! `alias` to `name`, `@[...]` lists attributes valid on every element and
//! `*` matches any element or attribute. Without rules every element and
//! attribute is accepted.

use std::collections::HashMap;

use crate::error::SchemaError;

/// Prefix of editor-internal attributes, valid regardless of rules.
pub const INTERNAL_ATTRIBUTE_PREFIX: &str = "data-mce-";

const BLOCK_ELEMENTS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "table",
    "tr",
    "td",
    "th",
    "tbody",
    "thead",
    "tfoot",
    "blockquote",
    "pre",
    "address",
    "form",
    "center",
    "dl",
    "dt",
    "dd",
    "hr",
    "fieldset",
    "section",
    "article",
    "aside",
    "header",
    "footer",
    "nav",
    "figure",
    "figcaption",
    "caption",
    "hgroup",
    "menu",
];

const SHORT_ENDED_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "br", "col", "frame", "hr", "img", "input", "isindex", "link",
    "meta", "param", "embed", "source", "wbr", "track",
];

const WHITESPACE_ELEMENTS: &[&str] = &["pre", "script", "style", "textarea"];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "checked", "compact", "declare", "defer", "disabled", "ismap", "multiple", "nohref",
    "noresize", "noshade", "nowrap", "readonly", "selected", "autoplay", "loop", "controls",
];

/// One attribute entry of an element rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRule {
    pub name: String,
    pub default: Option<String>,
}

/// Rule for one element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementRule {
    pub name: String,
    /// Remove the element when it has no content (`-` prefix).
    pub remove_empty: bool,
    /// Pad the element with a non-breaking space when empty (`#` prefix).
    pub pad_empty: bool,
    /// Accept every attribute (`[*]`).
    pub any_attribute: bool,
    pub attributes: Vec<AttributeRule>,
}

impl ElementRule {
    fn any(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            any_attribute: true,
            ..Self::default()
        }
    }

    fn allows(&self, attribute: &str) -> bool {
        self.any_attribute || self.attributes.iter().any(|rule| rule.name == attribute)
    }
}

/// Schema consulted by the parser, the writer and the serializer filters.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    elements: HashMap<String, ElementRule>,
    aliases: HashMap<String, String>,
    wildcard: Option<ElementRule>,
    global_attributes: Vec<AttributeRule>,
    restricted: bool,
}

impl Schema {
    /// Create a permissive schema that accepts every element and attribute.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a schema restricted to the given rules.
    pub fn with_valid_elements(rules: &str) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        schema.set_valid_elements(rules)?;
        Ok(schema)
    }

    /// Block element names.
    #[must_use]
    pub fn block_elements(&self) -> &'static [&'static str] {
        BLOCK_ELEMENTS
    }

    /// Whether the element is a block element.
    #[must_use]
    pub fn is_block(&self, name: &str) -> bool {
        BLOCK_ELEMENTS.contains(&name)
    }

    /// Whether the element is void and never takes children.
    #[must_use]
    pub fn is_short_ended(&self, name: &str) -> bool {
        SHORT_ENDED_ELEMENTS.contains(&name)
    }

    /// Whether whitespace inside the element is significant.
    #[must_use]
    pub fn is_whitespace_element(&self, name: &str) -> bool {
        WHITESPACE_ELEMENTS.contains(&name)
    }

    /// Whether the element's text is never entity decoded or escaped.
    #[must_use]
    pub fn is_raw_text(&self, name: &str) -> bool {
        RAW_TEXT_ELEMENTS.contains(&name)
    }

    /// Whether the attribute is boolean and gets filled with its own name.
    #[must_use]
    pub fn fill_attribute(&self, name: &str) -> bool {
        BOOLEAN_ATTRIBUTES.contains(&name)
    }

    /// Whether valid-element rules are in effect.
    #[must_use]
    pub fn is_restricted(&self) -> bool {
        self.restricted
    }

    /// Merge additional valid-element rules into the schema.
    ///
    /// On a permissive schema, elements without a rule of their own stay
    /// valid with any attribute.
    pub fn add_valid_elements(&mut self, rules: &str) -> Result<(), SchemaError> {
        let parsed = split_rules(rules)?;
        if parsed.is_empty() {
            return Ok(());
        }
        if !self.restricted && self.wildcard.is_none() {
            self.wildcard = Some(ElementRule::any("*"));
        }
        self.merge(parsed)
    }

    /// Replace the valid-element rules. An empty rule string makes the
    /// schema permissive again.
    pub fn set_valid_elements(&mut self, rules: &str) -> Result<(), SchemaError> {
        // Parse first so a malformed rule set leaves the schema untouched.
        let mut next = Self::new();
        next.merge(split_rules(rules)?)?;
        *self = next;
        Ok(())
    }

    fn merge(&mut self, rules: Vec<&str>) -> Result<(), SchemaError> {
        if rules.is_empty() {
            return Ok(());
        }
        for rule in rules {
            self.add_rule(rule)?;
        }
        self.restricted = true;
        Ok(())
    }

    fn add_rule(&mut self, rule: &str) -> Result<(), SchemaError> {
        let (head, attributes) = split_attributes(rule)?;

        if head == "@" {
            let (_, list) = parse_attribute_list(attributes.unwrap_or_default());
            self.global_attributes.extend(list);
            return Ok(());
        }

        let (remove_empty, pad_empty, names) = match head.as_bytes().first() {
            Some(b'-') => (true, false, &head[1..]),
            Some(b'#') => (false, true, &head[1..]),
            _ => (false, false, head),
        };

        let mut names = names.split('/');
        let name = names.next().unwrap_or_default().trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(SchemaError::EmptyElementName(rule.to_owned()));
        }

        let (any_attribute, attributes) = parse_attribute_list(attributes.unwrap_or_default());
        let element = ElementRule {
            name: name.clone(),
            remove_empty,
            pad_empty,
            any_attribute,
            attributes,
        };

        for alias in names.map(str::trim).filter(|alias| !alias.is_empty()) {
            self.aliases.insert(alias.to_ascii_lowercase(), name.clone());
        }

        if name == "*" {
            self.wildcard = Some(element);
        } else {
            tracing::debug!(element = %name, "Added valid element rule");
            self.elements.insert(name, element);
        }
        Ok(())
    }

    /// Rule governing an element, falling back to the `*` rule.
    #[must_use]
    pub fn element_rule(&self, name: &str) -> Option<&ElementRule> {
        self.elements.get(name).or(self.wildcard.as_ref())
    }

    /// Canonical name for an aliased element (`b` for `strong/b` gives `strong`).
    #[must_use]
    pub fn resolve_alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }

    /// Whether the element may appear in output.
    #[must_use]
    pub fn is_valid_element(&self, name: &str) -> bool {
        !self.restricted || self.element_rule(name).is_some()
    }

    /// Whether the attribute may appear on the element.
    #[must_use]
    pub fn is_valid_attribute(&self, element: &str, attribute: &str) -> bool {
        if !self.restricted || attribute.starts_with(INTERNAL_ATTRIBUTE_PREFIX) {
            return true;
        }
        if self.global_attributes.iter().any(|rule| rule.name == attribute || rule.name == "*") {
            return true;
        }
        self.element_rule(element)
            .is_some_and(|rule| rule.allows(attribute))
    }

    /// Default attribute values declared for an element.
    #[must_use]
    pub fn attribute_defaults(&self, element: &str) -> Vec<(&str, &str)> {
        self.element_rule(element)
            .into_iter()
            .flat_map(|rule| rule.attributes.iter())
            .filter_map(|rule| Some((rule.name.as_str(), rule.default.as_deref()?)))
            .collect()
    }
}

/// Split a rule string on top-level commas, checking bracket balance.
fn split_rules(rules: &str) -> Result<Vec<&str>, SchemaError> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, ch) in rules.char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| SchemaError::UnbalancedBracket(rules.to_owned()))?;
            }
            ',' if depth == 0 => {
                parts.push(&rules[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(SchemaError::UnbalancedBracket(rules.to_owned()));
    }
    parts.push(&rules[start..]);

    Ok(parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect())
}

/// Split `name[attrs]` into the head and the optional bracket contents.
fn split_attributes(rule: &str) -> Result<(&str, Option<&str>), SchemaError> {
    match rule.find('[') {
        None => Ok((rule.trim(), None)),
        Some(open) => {
            let inner = rule[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| SchemaError::UnbalancedBracket(rule.to_owned()))?;
            Ok((rule[..open].trim(), Some(inner)))
        }
    }
}

fn parse_attribute_list(list: &str) -> (bool, Vec<AttributeRule>) {
    let mut any = false;
    let mut rules = Vec::new();
    for entry in list.split('|').map(str::trim).filter(|e| !e.is_empty()) {
        if entry == "*" {
            any = true;
            continue;
        }
        let (name, default) = match entry.split_once('=') {
            Some((name, value)) => (name, Some(value.to_owned())),
            None => (entry, None),
        };
        rules.push(AttributeRule {
            name: name.trim().to_ascii_lowercase(),
            default,
        });
    }
    (any, rules)
}
