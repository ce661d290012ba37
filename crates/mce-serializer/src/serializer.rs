//! Clone, parse, filter and render pipeline.

use std::fmt;
use std::rc::Rc;

use mce_config::{CaretChar, Config, UrlMode};
use mce_dom::{EntityEncoding, NodeId, NodeType, Schema, SchemaError, Tree};
use mce_html::{DomParser, ElementFormat, FilterPass, HtmlSerializer, inner_html, outer_html};

use crate::error::SerializeError;
use crate::filters;
use crate::url_converter::{BaseUrlConverter, UrlConverter};

/// Default invisible caret character.
pub const DEFAULT_CARET_CHAR: char = CaretChar::Bom.as_char();

/// Output format of a serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Markup with the configured entity encoding.
    #[default]
    Html,
    /// Markup without entity encoding.
    Raw,
    /// Text content only.
    Text,
}

/// Per-call serialization options.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeArgs {
    pub format: Format,
    /// Serialize the children of the node instead of the node itself.
    pub get_inner: bool,
    /// Skip the pre and post process callbacks.
    pub no_events: bool,
}

impl SerializeArgs {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    #[must_use]
    pub fn with_get_inner(mut self, get_inner: bool) -> Self {
        self.get_inner = get_inner;
        self
    }

    #[must_use]
    pub fn with_no_events(mut self, no_events: bool) -> Self {
        self.no_events = no_events;
        self
    }
}

/// Construction-time serializer settings.
#[derive(Clone)]
pub struct SerializerSettings {
    pub entity_encoding: EntityEncoding,
    pub element_format: ElementFormat,
    /// Register the nested list repair filter.
    pub fix_list_elements: bool,
    /// Clone shallowly and re-parse the inner markup instead of deep cloning.
    pub shallow_clone: bool,
    pub valid_elements: Option<String>,
    pub extended_valid_elements: Option<String>,
    /// Character stripped from every serialization.
    pub caret_char: char,
    pub url_converter: Option<Rc<dyn UrlConverter>>,
}

impl SerializerSettings {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entity_encoding: EntityEncoding::default(),
            element_format: ElementFormat::default(),
            fix_list_elements: false,
            shallow_clone: false,
            valid_elements: None,
            extended_valid_elements: None,
            caret_char: DEFAULT_CARET_CHAR,
            url_converter: None,
        }
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
    pub fn with_fix_list_elements(mut self, fix: bool) -> Self {
        self.fix_list_elements = fix;
        self
    }

    #[must_use]
    pub fn with_shallow_clone(mut self, shallow: bool) -> Self {
        self.shallow_clone = shallow;
        self
    }

    #[must_use]
    pub fn with_valid_elements(mut self, rules: impl Into<String>) -> Self {
        self.valid_elements = Some(rules.into());
        self
    }

    #[must_use]
    pub fn with_extended_valid_elements(mut self, rules: impl Into<String>) -> Self {
        self.extended_valid_elements = Some(rules.into());
        self
    }

    #[must_use]
    pub fn with_caret_char(mut self, caret: char) -> Self {
        self.caret_char = caret;
        self
    }

    #[must_use]
    pub fn with_url_converter(mut self, converter: impl UrlConverter + 'static) -> Self {
        self.url_converter = Some(Rc::new(converter));
        self
    }

    /// Settings described by the `[serializer]` and `[noneditable]` tables.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError::InvalidBaseUrl` if URL conversion is enabled
    /// with an unparsable base URL.
    pub fn from_config(config: &Config) -> Result<Self, SerializeError> {
        let serializer = &config.serializer;
        let mut settings = Self::new()
            .with_entity_encoding(serializer.entity_encoding)
            .with_element_format(serializer.element_format)
            .with_fix_list_elements(serializer.fix_list_elements)
            .with_shallow_clone(serializer.shallow_clone)
            .with_caret_char(config.noneditable.caret_char.as_char());
        settings.valid_elements.clone_from(&serializer.valid_elements);
        settings
            .extended_valid_elements
            .clone_from(&serializer.extended_valid_elements);

        if serializer.url_mode != UrlMode::Keep
            && let Some(base) = serializer
                .document_base_url
                .as_deref()
                .filter(|base| !base.is_empty())
        {
            let converter = BaseUrlConverter::new(base, serializer.url_mode)?;
            settings = settings.with_url_converter(converter);
        }
        Ok(settings)
    }
}

impl Default for SerializerSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SerializerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializerSettings")
            .field("entity_encoding", &self.entity_encoding)
            .field("element_format", &self.element_format)
            .field("fix_list_elements", &self.fix_list_elements)
            .field("shallow_clone", &self.shallow_clone)
            .field("valid_elements", &self.valid_elements)
            .field("extended_valid_elements", &self.extended_valid_elements)
            .field("caret_char", &self.caret_char)
            .field("url_converter", &self.url_converter.is_some())
            .finish()
    }
}

type PreProcessCallback = Box<dyn Fn(&mut Tree, NodeId, &mut SerializeArgs)>;
type PostProcessCallback = Box<dyn Fn(&mut String, &SerializeArgs)>;

/// Serializes document subtrees through the filter pipeline.
///
/// The source tree is never mutated: every call works on a detached clone.
///
/// # Example
///
/// ```
/// use mce_html::DomParser;
/// use mce_serializer::{SerializeArgs, Serializer, SerializerSettings};
///
/// let serializer = Serializer::new(SerializerSettings::new()).unwrap();
/// let tree = DomParser::new().build("<p>text<br></p>");
/// let html = serializer.serialize(&tree, tree.root(), SerializeArgs::new());
/// assert_eq!(html, "<p>text</p>");
/// ```
pub struct Serializer {
    settings: SerializerSettings,
    parser: DomParser,
    pre_process: Vec<PreProcessCallback>,
    post_process: Vec<PostProcessCallback>,
}

impl Serializer {
    /// Create a serializer with the built-in filters registered.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the valid element rules are malformed.
    pub fn new(settings: SerializerSettings) -> Result<Self, SchemaError> {
        let mut schema = match settings.valid_elements.as_deref() {
            Some(rules) => Schema::with_valid_elements(rules)?,
            None => Schema::new(),
        };
        if let Some(rules) = settings.extended_valid_elements.as_deref() {
            schema.add_valid_elements(rules)?;
        }

        let mut parser = DomParser::with_schema(schema);
        filters::register(
            &mut parser,
            settings.url_converter.as_ref().map(Rc::clone),
            settings.fix_list_elements,
        );

        Ok(Self {
            settings,
            parser,
            pre_process: Vec::new(),
            post_process: Vec::new(),
        })
    }

    /// Create a serializer from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError` for malformed rules or an unparsable base URL.
    pub fn from_config(config: &Config) -> Result<Self, SerializeError> {
        let settings = SerializerSettings::from_config(config)?;
        Ok(Self::new(settings)?)
    }

    #[must_use]
    pub fn settings(&self) -> &SerializerSettings {
        &self.settings
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.parser.schema()
    }

    /// Register a node filter, run after the built-in filters.
    pub fn add_node_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.parser.add_node_filter(names, callback);
    }

    /// Register an attribute filter, run after the built-in filters.
    pub fn add_attribute_filter<F>(&mut self, names: &str, callback: F)
    where
        F: Fn(&mut FilterPass<'_>, &[NodeId], &str) + 'static,
    {
        self.parser.add_attribute_filter(names, callback);
    }

    /// Register a callback run on the clone before it is parsed.
    pub fn on_pre_process<F>(&mut self, callback: F)
    where
        F: Fn(&mut Tree, NodeId, &mut SerializeArgs) + 'static,
    {
        self.pre_process.push(Box::new(callback));
    }

    /// Register a callback run on the rendered content.
    pub fn on_post_process<F>(&mut self, callback: F)
    where
        F: Fn(&mut String, &SerializeArgs) + 'static,
    {
        self.post_process.push(Box::new(callback));
    }

    /// Merge valid element rules into the schema.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the rules are malformed.
    pub fn add_rules(&mut self, rules: &str) -> Result<(), SchemaError> {
        self.parser.schema_mut().add_valid_elements(rules)
    }

    /// Replace the schema's valid element rules.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError` if the rules are malformed.
    pub fn set_rules(&mut self, rules: &str) -> Result<(), SchemaError> {
        self.parser.schema_mut().set_valid_elements(rules)
    }

    /// Serialize `node` after checking it belongs to `tree`.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError::NodeNotFound` for detached nodes.
    pub fn try_serialize(
        &self,
        tree: &Tree,
        node: NodeId,
        args: SerializeArgs,
    ) -> Result<String, SerializeError> {
        if !tree.is_attached(node) {
            return Err(SerializeError::NodeNotFound);
        }
        Ok(self.serialize(tree, node, args))
    }

    /// Serialize a node of `tree`.
    pub fn serialize(&self, tree: &Tree, node: NodeId, mut args: SerializeArgs) -> String {
        let (mut clone, clone_node) = self.clone_node(tree, node);

        if !args.no_events {
            for callback in &self.pre_process {
                callback(&mut clone, clone_node, &mut args);
            }
        }

        let markup = if args.get_inner {
            inner_html(&clone, clone_node)
        } else {
            outer_html(&clone, clone_node)
        };
        let markup = markup.trim();
        tracing::debug!(size = markup.len(), get_inner = args.get_inner, "Parsing clone");

        let mut parsed = self.parser.parse(markup);
        strip_caret_text(&mut parsed, self.settings.caret_char);

        let mut content = match args.format {
            Format::Html => self.writer(self.settings.entity_encoding).serialize(&parsed, parsed.root()),
            Format::Raw => self.writer(EntityEncoding::Raw).serialize(&parsed, parsed.root()),
            Format::Text => parsed.text_content(parsed.root()),
        };
        content.retain(|c| c != self.settings.caret_char);
        tracing::debug!(size = content.len(), format = ?args.format, "Rendered content");

        if !args.no_events {
            for callback in &self.post_process {
                callback(&mut content, &args);
            }
        }
        content
    }

    fn clone_node(&self, tree: &Tree, node: NodeId) -> (Tree, NodeId) {
        if !self.settings.shallow_clone || !tree.is_element(node) {
            return tree.clone_subtree(node);
        }

        let mut clone = Tree::new();
        let shell = clone.import_shallow(tree, node);
        let root = clone.root();
        clone.append_child(root, shell);

        // Re-parse inside a copy of the element so pre and script content
        // keeps its whitespace and stays undecoded.
        let mut context = Tree::new();
        let wrapper = context.import_shallow(tree, node);
        let context_root = context.root();
        context.append_child(context_root, wrapper);
        let inner = context.create_raw_text(inner_html(tree, node));
        context.append_child(wrapper, inner);

        let reparsed = DomParser::new().build(&outer_html(&context, wrapper));
        let mut top = reparsed.children(reparsed.root());
        // Implied closes can push trailing content out of the wrapper.
        let content: Vec<NodeId> = top
            .next()
            .into_iter()
            .flat_map(|first| reparsed.children(first))
            .chain(top)
            .collect();
        for child in content {
            let copy = clone.import(&reparsed, child);
            clone.append_child(shell, copy);
        }
        (clone, shell)
    }

    fn writer(&self, encoding: EntityEncoding) -> HtmlSerializer {
        HtmlSerializer::new()
            .with_schema(self.parser.schema().clone())
            .with_entity_encoding(encoding)
            .with_element_format(self.settings.element_format)
    }
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("settings", &self.settings)
            .field("pre_process", &self.pre_process.len())
            .field("post_process", &self.post_process.len())
            .finish_non_exhaustive()
    }
}

/// Remove caret characters from text nodes, dropping nodes left empty.
fn strip_caret_text(tree: &mut Tree, caret: char) {
    let nodes: Vec<NodeId> = tree
        .descendants(tree.root())
        .filter(|&node| {
            tree.node_type(node) == NodeType::Text
                && tree.value(node).is_some_and(|value| value.contains(caret))
        })
        .collect();

    for node in nodes {
        let stripped: String = tree
            .value(node)
            .unwrap_or_default()
            .chars()
            .filter(|&c| c != caret)
            .collect();
        if stripped.is_empty() {
            tree.remove(node);
        } else {
            tree.set_value(node, stripped);
        }
    }
}
