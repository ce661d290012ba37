//! Error types for schema rule parsing.

/// Error raised while parsing valid-element rules.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// A `[` without a matching `]` (or the reverse).
    #[error("Unbalanced bracket in element rule: {0}")]
    UnbalancedBracket(String),

    /// A rule with attributes but no element name.
    #[error("Missing element name in rule: {0}")]
    EmptyElementName(String),
}
