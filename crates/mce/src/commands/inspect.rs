//! `mce inspect` command implementation.

use std::path::PathBuf;

use clap::Args;
use mce_config::Config;
use mce_dom::{NodeId, Tree};
use mce_noneditable::{ContentEditable, content_editable, is_editable};

use crate::error::CliError;
use crate::output::Output;

use super::load_document;

/// Arguments for the inspect command.
#[derive(Args)]
pub(crate) struct InspectArgs {
    /// Path to the HTML file.
    file: PathBuf,

    /// Path to configuration file (default: auto-discover mce.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub(crate) verbose: bool,
}

impl InspectArgs {
    /// Execute the inspect command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration or reading fails.
    pub(crate) fn execute(self, output: &Output) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), None)?;
        let tree = load_document(&self.file, &config)?;

        let lines = describe(&tree);
        if lines.is_empty() {
            output.info("No elements found.");
        }
        for line in lines {
            let label = if line.editable {
                output.dim("editable")
            } else {
                output.highlight("non-editable")
            };
            let marker = match line.marker {
                Some(ContentEditable::True) => " (marked editable)",
                Some(ContentEditable::False) => " (marked non-editable)",
                None => "",
            };
            output.content(&format!(
                "{}<{}> {label}{marker}",
                "  ".repeat(line.depth),
                line.name
            ));
        }
        Ok(())
    }
}

/// One element of the inspection report.
#[derive(Debug, PartialEq, Eq)]
struct Line {
    depth: usize,
    name: String,
    editable: bool,
    marker: Option<ContentEditable>,
}

fn describe(tree: &Tree) -> Vec<Line> {
    let root = tree.root();
    tree.descendants(root)
        .filter(|&node| tree.is_element(node))
        .map(|node: NodeId| Line {
            depth: tree.ancestors(node).take_while(|&a| a != root).count(),
            name: tree.name(node).to_owned(),
            editable: is_editable(tree, node),
            marker: content_editable(tree, node),
        })
        .collect()
}
