//! Engine configuration.

use serde::{Deserialize, Serialize};
use tracing::debug;

use quire_parser::{Options, ParseError};

use crate::ConfigError;

/// Parse and render settings, usually loaded from JSON.
///
/// ```json
/// { "options": ["smart", "hardbreaks"], "width": 80 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Option flag names, as accepted by [`Options::from_names`].
    pub options: Vec<String>,

    /// Wrap column for rendering. `0` disables wrapping.
    pub width: usize,
}

impl EngineConfig {
    /// Creates a configuration with no options and no wrapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON and checks its option names.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        let options = config.resolve_options()?;
        debug!(%options, width = config.width, "loaded engine config");
        Ok(config)
    }

    /// Serializes the configuration as JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Resolves the option names into flags.
    pub fn resolve_options(&self) -> Result<Options, ConfigError> {
        Options::from_names(self.options.iter().map(String::as_str)).map_err(|e| match e {
            ParseError::UnknownOption(name) => ConfigError::unknown_option(name),
            other => ConfigError::unknown_option(other.to_string()),
        })
    }
}

impl From<Options> for EngineConfig {
    fn from(options: Options) -> Self {
        Self {
            options: options.names().into_iter().map(String::from).collect(),
            width: 0,
        }
    }
}
