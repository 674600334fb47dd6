use std::sync::Arc;
use std::time::{Duration, Instant};

use database_layer::{DatabasePool, InMemoryIntakeStore, IntakeFormStore, PostgresIntakeStore};
use error_common::{IntakeError, Result};
use logger_redacted::PiiRedactor;
use tracing::{info, warn};

use crate::config::{ServerConfig, StorageBackend};
use crate::services::{Clock, ConfigCache, FormConfigService, SystemClock};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct IntakeServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Configuration row and submission storage
    pub store: Arc<dyn IntakeFormStore>,
    /// Configuration record accessor
    pub forms: FormConfigService,
    /// Scrubs submitted values before they are logged
    pub redactor: Arc<PiiRedactor>,
    pub clock: Arc<dyn Clock>,
    started_at: Instant,
}

impl IntakeServer {
    pub fn new(config: ServerConfig, store: Arc<dyn IntakeFormStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(config: ServerConfig, store: Arc<dyn IntakeFormStore>, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(ConfigCache::new(config.cache_ttl(), clock.clone()));
        let redactor = Arc::new(PiiRedactor::new(config.redaction.clone()));
        Self {
            forms: FormConfigService::new(store.clone(), cache),
            config: Arc::new(config),
            store,
            redactor,
            clock,
            started_at: Instant::now(),
        }
    }

    /// Server backed by the process-local store
    pub fn in_memory(config: ServerConfig) -> Self {
        Self::new(config, Arc::new(InMemoryIntakeStore::new()))
    }

    /// Connects the configured storage backend and runs migrations when
    /// enabled.
    ///
    /// # Errors
    ///
    /// [`IntakeError::ConfigError`] for an invalid configuration and
    /// [`IntakeError::DatabaseError`] when Postgres is unreachable or a
    /// migration fails.
    pub async fn from_config(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        match config.storage {
            StorageBackend::Memory => {
                warn!("Using in-memory storage, data is lost on restart");
                Ok(Self::in_memory(config))
            }
            StorageBackend::Postgres => {
                let url = config.database_url.clone().unwrap_or_default();
                let pool = DatabasePool::connect(&url, &config.pool_settings())
                    .await
                    .map_err(|e| IntakeError::DatabaseError(e.to_string()))?;

                if config.run_migrations {
                    pool.run_migrations()
                        .await
                        .map_err(|e| IntakeError::DatabaseError(e.to_string()))?;
                }

                info!(max_connections = config.max_connections, "Using Postgres storage");
                Ok(Self::new(config, Arc::new(PostgresIntakeStore::new(pool))))
            }
        }
    }

    /// Get server configuration
    pub fn get_config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
