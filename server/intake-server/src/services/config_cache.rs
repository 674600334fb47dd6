//! Read-through cache for the form configuration row

use std::fmt::Debug;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use database_layer::IntakeFormRecord;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::debug;

/// Source of "now", injectable so expiry can be tested without sleeping
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(start) }
    }

    pub fn advance(&self, by: Duration) {
        let by = chrono::Duration::from_std(by).unwrap_or(chrono::Duration::zero());
        *self.now.lock() += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone)]
struct CachedConfig {
    record: IntakeFormRecord,
    loaded_at: DateTime<Utc>,
}

/// Holds the most recently loaded configuration row for `ttl`.
///
/// Every write path calls [`ConfigCache::invalidate`] after persisting, so a
/// reader never sees a configuration older than the last write made through
/// this process. A load that overlaps an invalidation is returned to its
/// caller but not cached.
#[derive(Debug)]
pub struct ConfigCache {
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    entry: RwLock<Option<CachedConfig>>,
    /// Bumped by every invalidation, under the entry write lock
    generation: AtomicU64,
}

impl ConfigCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::zero()),
            clock,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// The cached row, if present and not expired
    pub async fn get(&self) -> Option<IntakeFormRecord> {
        let now = self.clock.now();
        self.entry
            .read()
            .await
            .as_ref()
            .filter(|cached| now - cached.loaded_at < self.ttl)
            .map(|cached| cached.record.clone())
    }

    /// Returns the cached row or runs `load` and caches its result.
    ///
    /// Failed loads are not cached.
    pub async fn get_or_load<F, Fut, E>(&self, load: F) -> Result<IntakeFormRecord, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<IntakeFormRecord, E>>,
    {
        if let Some(record) = self.get().await {
            return Ok(record);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let record = load().await?;

        let mut entry = self.entry.write().await;
        if self.generation.load(Ordering::Acquire) == generation {
            debug!(form_version = record.form_version, "Form configuration cached");
            *entry = Some(CachedConfig {
                record: record.clone(),
                loaded_at: self.clock.now(),
            });
        } else {
            debug!(form_version = record.form_version, "Configuration changed during load, not cached");
        }
        Ok(record)
    }

    pub async fn put(&self, record: IntakeFormRecord) {
        let loaded_at = self.clock.now();
        debug!(form_version = record.form_version, "Form configuration cached");
        *self.entry.write().await = Some(CachedConfig { record, loaded_at });
    }

    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        if entry.take().is_some() {
            debug!("Form configuration cache invalidated");
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }
}
