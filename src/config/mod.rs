//! Application configuration.
//!
//! Loaded from YAML files and environment variables into a single
//! [`Config`] value that is passed explicitly to the store factory and the
//! repository facades. There is no process-wide configuration state.

mod storage;

pub use storage::{DynamoConfig, IndexNames, StorageConfig, StorageType};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "forgestore.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "FORGESTORE_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "FORGESTORE";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "FORGESTORE_LOG";

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `forgestore.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `FORGESTORE_CONFIG` environment variable (if set)
    /// 4. Environment variables with `FORGESTORE__` prefix,
    ///    e.g. `FORGESTORE__STORAGE__DYNAMO__TABLE_NAME`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config: Config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot address a store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.dynamo.table_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "storage.dynamo.table_name must not be empty".to_string(),
            ));
        }
        let indexes = &self.storage.indexes;
        for name in [
            &indexes.account_repositories,
            &indexes.stargazers,
            &indexes.account_forks,
            &indexes.status,
        ] {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "storage.indexes names must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
