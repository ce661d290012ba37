//! `mce serialize` command implementation.

use std::path::PathBuf;

use clap::Args;
use mce_config::{CliSettings, Config, ElementFormat, EntityEncoding};
use mce_dom::{NodeId, Tree};
use mce_noneditable::register_serializer_filters;
use mce_serializer::{Format, Serializer};

use crate::error::CliError;
use crate::output::Output;

use super::load_document;

/// Arguments for the serialize command.
#[derive(Args)]
pub(crate) struct SerializeArgs {
    /// Path to the HTML file.
    file: PathBuf,

    /// Serialize only the element with this id.
    #[arg(long)]
    id: Option<String>,

    /// Serialize the children of the element instead of the element itself.
    #[arg(long)]
    inner: bool,

    /// Output text content instead of markup.
    #[arg(long)]
    text: bool,

    /// Entity encoding (raw, named, numeric, named+numeric; overrides config).
    #[arg(long)]
    entity_encoding: Option<EntityEncoding>,

    /// Void element format (html, xhtml; overrides config).
    #[arg(long)]
    element_format: Option<ElementFormat>,

    /// Move stray nested lists into the preceding list item.
    #[arg(long)]
    fix_lists: bool,

    /// Base URL for URL conversion (overrides config).
    #[arg(long, env = "MCE_BASE_URL")]
    base_url: Option<String>,

    /// Path to configuration file (default: auto-discover mce.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl SerializeArgs {
    /// Execute the serialize command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, reading or serialization fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            entity_encoding: self.entity_encoding,
            element_format: self.element_format,
            fix_list_elements: self.fix_lists.then_some(true),
            document_base_url: self.base_url.clone(),
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let tree = load_document(&self.file, &config)?;
        let node = self.target(&tree)?;

        let mut serializer = Serializer::from_config(&config)?;
        register_serializer_filters(&mut serializer);

        let args = mce_serializer::SerializeArgs::new()
            .with_get_inner(self.inner)
            .with_format(if self.text { Format::Text } else { Format::Html });
        let content = serializer.try_serialize(&tree, node, args)?;
        output.content(&content);
        Ok(())
    }

    fn target(&self, tree: &Tree) -> Result<NodeId, CliError> {
        match &self.id {
            Some(id) => tree
                .get_element_by_id(id)
                .ok_or_else(|| CliError::Validation(format!("no element with id \"{id}\""))),
            None => Ok(tree.root()),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use mce_html::DomParser;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: SerializeArgs,
    }

    #[test]
    fn test_parse_args() {
        let cli = TestCli::parse_from([
            "mce",
            "page.html",
            "--entity-encoding",
            "numeric",
            "--element-format",
            "xhtml",
            "--fix-lists",
            "--inner",
        ]);
        assert_eq!(cli.args.file, PathBuf::from("page.html"));
        assert_eq!(cli.args.entity_encoding, Some(EntityEncoding::Numeric));
        assert_eq!(cli.args.element_format, Some(ElementFormat::Xhtml));
        assert!(cli.args.fix_lists);
        assert!(cli.args.inner);
    }

    #[test]
    fn test_target_by_id() {
        let cli = TestCli::parse_from(["mce", "page.html", "--id", "main"]);
        let tree = DomParser::new().build("<div id=\"main\"><p>x</p></div>");
        let node = cli.args.target(&tree).unwrap();
        assert_eq!(tree.name(node), "div");

        let cli = TestCli::parse_from(["mce", "page.html", "--id", "missing"]);
        assert!(matches!(cli.args.target(&tree), Err(CliError::Validation(_))));
    }
}
