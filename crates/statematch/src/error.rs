//! Pattern parsing errors

use thiserror::Error;

/// Errors that can occur when constructing a [`crate::TreeValue`] from raw input.
///
/// Parsing is the only fallible step in this crate; matching itself never
/// raises for well-formed operands.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The input is not a well-formed YAML/JSON document
    #[error("invalid document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A mapping uses a list or mapping as a key
    #[error("mapping key is not a scalar")]
    NonScalarKey,

    /// A mapping contains the same key twice
    #[error("duplicate mapping key: {0}")]
    DuplicateKey(String),
}
