//! Server configuration
//!
//! Layered the usual way: built-in defaults, then an optional YAML file, then
//! `INTAKE_*` environment variables (`INTAKE_CACHE_TTL_SECONDS=60`,
//! `INTAKE_REDACTION__HASH_FOR_CORRELATION=false`).

use std::path::Path;
use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};
use database_layer::PoolSettings;
use error_common::{IntakeError, Result};
use logger_redacted::RedactionConfig;
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "INTAKE";

/// Where form configuration and submissions are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Postgres connection string. Falls back to `DATABASE_URL`.
    pub database_url: Option<String>,
    pub storage: StorageBackend,
    /// How long a loaded form configuration is served from memory
    pub cache_ttl_seconds: u64,
    /// Reject submissions that leave a visible required field blank
    pub enforce_required_fields: bool,
    pub max_connections: u32,
    pub run_migrations: bool,
    /// Browser origins allowed to call the API
    pub cors_origins: Vec<String>,
    pub redaction: RedactionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            storage: StorageBackend::Postgres,
            cache_ttl_seconds: 300,
            enforce_required_fields: false,
            max_connections: 10,
            run_migrations: true,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:8080".to_string(),
            ],
            redaction: RedactionConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads defaults, the YAML file at `path` when it exists, then the
    /// environment.
    ///
    /// # Errors
    ///
    /// [`IntakeError::ConfigError`] when a source cannot be read or a value
    /// has the wrong type.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Yaml).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut config = Self::build(builder)?;
        if config.database_url.is_none() {
            config.database_url = std::env::var("DATABASE_URL").ok();
        }
        Ok(config)
    }

    /// Defaults overlaid with an inline YAML document
    ///
    /// # Errors
    ///
    /// [`IntakeError::ConfigError`] for malformed YAML or mistyped values.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Self::build(Config::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        builder
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| IntakeError::ConfigError(e.to_string()))
    }

    /// Checks combinations the type system cannot
    ///
    /// # Errors
    ///
    /// [`IntakeError::ConfigError`] when Postgres is selected without a URL.
    pub fn validate(&self) -> Result<()> {
        if self.storage == StorageBackend::Postgres && self.database_url.as_deref().map_or(true, str::is_empty) {
            return Err(IntakeError::ConfigError(
                "database_url is required for postgres storage (set INTAKE_DATABASE_URL or use --storage memory)"
                    .to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(IntakeError::ConfigError("max_connections must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn pool_settings(&self) -> PoolSettings {
        PoolSettings {
            max_connections: self.max_connections,
            ..PoolSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert!(!config.enforce_required_fields);
        assert_eq!(config.storage, StorageBackend::Postgres);
    }

    #[test]
    fn test_yaml_overrides_defaults() {
        let config = ServerConfig::from_yaml(
            "storage: memory\ncache_ttl_seconds: 30\nenforce_required_fields: true\nredaction:\n  hash_for_correlation: false\n",
        )
        .unwrap();

        assert_eq!(config.storage, StorageBackend::Memory);
        assert_eq!(config.cache_ttl_seconds, 30);
        assert!(config.enforce_required_fields);
        assert!(!config.redaction.hash_for_correlation);
        assert!(config.redaction.redact_emails);
        assert_eq!(config.max_connections, 10);
    }

    #[test]
    fn test_mistyped_value_is_a_config_error() {
        let err = ServerConfig::from_yaml("cache_ttl_seconds: soon\n").unwrap_err();
        assert!(matches!(err, IntakeError::ConfigError(_)));
    }

    #[test]
    fn test_postgres_requires_url() {
        let config = ServerConfig::default();
        assert!(config.validate().is_err());

        let memory = ServerConfig {
            storage: StorageBackend::Memory,
            ..ServerConfig::default()
        };
        assert!(memory.validate().is_ok());

        let postgres = ServerConfig {
            database_url: Some("postgres://localhost/intake".to_string()),
            ..ServerConfig::default()
        };
        assert!(postgres.validate().is_ok());
    }
}
