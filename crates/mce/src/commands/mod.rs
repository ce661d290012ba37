//! CLI command implementations.

pub(crate) mod inspect;
pub(crate) mod serialize;

use std::path::Path;

use mce_config::Config;
use mce_dom::Tree;
use mce_html::{DomParser, protect};
use mce_noneditable::{NonEditableSettings, register_parser_filters};

use crate::error::CliError;

pub(crate) use inspect::InspectArgs;
pub(crate) use serialize::SerializeArgs;

/// Read an HTML file into a tree, applying the editability class markers.
pub(crate) fn load_document(path: &Path, config: &Config) -> Result<Tree, CliError> {
    let html = std::fs::read_to_string(path)?;
    let html = protect(&html, &config.serializer.protect_patterns()?);
    let mut parser = DomParser::new();
    register_parser_filters(&mut parser, &NonEditableSettings::from(&config.noneditable));
    let tree = parser.parse(&html);
    tracing::info!(path = %path.display(), size = html.len(), "Loaded document");
    Ok(tree)
}
