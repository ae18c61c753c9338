//! Parse error types.

use thiserror::Error;

/// Errors that can occur while parsing.
///
/// Malformed markup is never an error: the parser always produces a tree.
/// Only reading the input and naming options can fail.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Reading the input failed.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// An option name was not recognized.
    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

impl ParseError {
    /// Creates a new unknown option error.
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Self::UnknownOption(name.into())
    }
}
