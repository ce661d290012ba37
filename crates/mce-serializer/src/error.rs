//! Error types for serializer construction and checked serialization.

use mce_dom::SchemaError;

/// Error raised while configuring or invoking the serializer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SerializeError {
    /// The node to serialize is not part of the tree.
    #[error("Node is not attached to the document")]
    NodeNotFound,

    /// Malformed valid-element rules.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// `document_base_url` could not be parsed.
    #[error("Invalid document base URL {url}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}
