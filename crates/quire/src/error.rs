//! Engine error types.

use thiserror::Error;

/// Errors raised while loading an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration is not valid JSON or has the wrong shape.
    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),

    /// An entry of `options` does not name a flag.
    #[error("Unknown option: {0}")]
    UnknownOption(String),
}

impl ConfigError {
    /// Creates an unknown option error.
    pub fn unknown_option(name: impl Into<String>) -> Self {
        Self::UnknownOption(name.into())
    }
}

/// Any error the engine can return.
#[derive(Debug, Error)]
pub enum Error {
    /// A tree mutation was rejected.
    #[error("Tree error: {0}")]
    Tree(#[from] quire_ast::TreeError),

    /// Reading input failed.
    #[error("Parse error: {0}")]
    Parse(#[from] quire_parser::ParseError),

    /// The configuration was rejected.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
