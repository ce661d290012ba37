//! CLI error types.

use mce_config::ConfigError;
use mce_serializer::SerializeError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Serialize(#[from] SerializeError),

    #[error("{0}")]
    Validation(String),
}
