//! MCE CLI - Content pipeline.
//!
//! Provides commands for:
//! - `serialize`: Clean up an HTML document through the serializer pipeline
//! - `inspect`: Show the editability of every element in a document

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{InspectArgs, SerializeArgs};
use output::Output;

/// MCE - Content pipeline.
#[derive(Parser)]
#[command(name = "mce", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serialize an HTML document through the filter pipeline.
    Serialize(SerializeArgs),
    /// Print the editability of every element.
    Inspect(InspectArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = match &cli.command {
        Commands::Serialize(args) => args.verbose,
        Commands::Inspect(args) => args.verbose,
    };

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Serialize(args) => args.execute(&output),
        Commands::Inspect(args) => args.execute(&output),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
