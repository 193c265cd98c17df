//! Configuration management for nodekit.
//!
//! Settings are loaded from (in priority order):
//! 1. Environment variables (`NODEKIT__` prefix, `__` separator)
//! 2. Config file (`nodekit.toml` by default)
//! 3. Defaults

use serde::Deserialize;

use crate::error::CoreError;

/// Top-level settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Assign a generated identity to entities saved without one.
    #[serde(default = "default_true")]
    pub auto_identity: bool,
}

/// Connection parameters for the graph engine.
#[derive(Debug, Clone, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

/// Statement logging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Emit a debug event for every statement sent to the store.
    #[serde(default)]
    pub log_queries: bool,
}

impl Settings {
    /// Load settings from `<file_prefix>.toml` (optional) and `NODEKIT__*`
    /// environment variables.
    pub fn load(file_prefix: &str) -> Result<Self, CoreError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("NODEKIT")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        tracing::debug!(
            uri = %settings.neo4j.uri,
            database = %settings.neo4j.database,
            auto_identity = settings.auto_identity,
            "Loaded settings"
        );
        Ok(settings)
    }
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_database() -> String {
    "neo4j".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

fn default_true() -> bool {
    true
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            database: default_database(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            neo4j: Neo4jSettings::default(),
            logging: LoggingSettings::default(),
            auto_identity: default_true(),
        }
    }
}
