//! Mapper configuration using Figment
//!
//! Configuration is loaded from:
//! 1. `config/mapper.toml` (missing file allowed, defaults apply)
//! 2. Environment variables (prefixed with `DAQ_MAPPER_`)
//!
//! # Environment Variable Overrides
//!
//! Nested keys are separated by a double underscore:
//!
//! ```text
//! DAQ_MAPPER_SUBMIT_POLICY=manual
//! DAQ_MAPPER_LOG_LEVEL=debug
//! DAQ_MAPPER_KINDS__SLIDER=value
//! ```
//!
//! # Example
//!
//! ```no_run
//! use daq_mapper::config::MapperConfig;
//! use daq_mapper::context::OwningContext;
//! use daq_mapper::mapper::Mapper;
//!
//! let config = MapperConfig::load()?;
//! let (handle, _ctx_loop) = OwningContext::new("gui");
//! let mapper = Mapper::with_config(handle, &config);
//! # Ok::<(), daq_mapper::config::ConfigError>(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::display::{EndpointKind, EndpointKindTable};
use crate::mapper::SubmitPolicy;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/mapper.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "DAQ_MAPPER_";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] figment::Error),
    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Mapper settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Policy new mappers start with.
    #[serde(default)]
    pub submit_policy: SubmitPolicy,
    /// Logging level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Extra endpoint kinds: kind tag -> default property name.
    #[serde(default)]
    pub kinds: BTreeMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            submit_policy: SubmitPolicy::default(),
            log_level: default_log_level(),
            kinds: BTreeMap::new(),
        }
    }
}

impl MapperConfig {
    /// Load configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the file cannot be parsed or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load configuration from a specific file path
    ///
    /// # Errors
    ///
    /// Returns a ConfigError if the file cannot be parsed or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Figment::from(Serialized::defaults(MapperConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        config.validate()?;
        tracing::debug!(path = %path.as_ref().display(), policy = %config.submit_policy, "Mapper configuration loaded");
        Ok(config)
    }

    /// Validate configuration after loading
    ///
    /// Checks:
    /// - Log level is valid (trace, debug, info, warn, error)
    /// - Kind tags and property names are non-empty
    ///
    /// # Errors
    ///
    /// Returns a ConfigError with a descriptive message for any validation failure.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        for (kind, property) in &self.kinds {
            if kind.trim().is_empty() {
                return Err(ConfigError::Validation("Empty endpoint kind tag in [kinds]".to_string()));
            }
            if property.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "Endpoint kind '{kind}' has an empty default property"
                )));
            }
        }

        Ok(())
    }

    /// Built-in kind table extended with the configured kinds.
    pub fn kind_table(&self) -> EndpointKindTable {
        let mut table = EndpointKindTable::default();
        for (kind, property) in &self.kinds {
            table.register(EndpointKind::from(kind.as_str()), property.clone());
        }
        table
    }
}
