use std::cmp::Reverse;
use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{DailySubmissionCount, IntakeFormRecord};
use crate::store::IntakeFormStore;

/// Process-local store for development and tests. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryIntakeStore {
    rows: RwLock<Vec<IntakeFormRecord>>,
}

impl InMemoryIntakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<IntakeFormRecord>) -> Self {
        Self {
            rows: RwLock::new(records),
        }
    }

    /// Copy of every row, in insertion order
    pub fn snapshot(&self) -> Vec<IntakeFormRecord> {
        self.rows.read().clone()
    }

    fn live_submissions_newest_first(&self) -> Vec<IntakeFormRecord> {
        let mut live: Vec<IntakeFormRecord> = self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_live_submission())
            .cloned()
            .collect();
        live.sort_by_key(|r| Reverse(r.created_at));
        live
    }
}

#[async_trait]
impl IntakeFormStore for InMemoryIntakeStore {
    async fn latest_config(&self) -> DatabaseResult<Option<IntakeFormRecord>> {
        Ok(self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_config)
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn list_configs(&self) -> DatabaseResult<Vec<IntakeFormRecord>> {
        let mut configs: Vec<IntakeFormRecord> = self.rows.read().iter().filter(|r| r.is_config).cloned().collect();
        configs.sort_by_key(|r| Reverse(r.created_at));
        Ok(configs)
    }

    async fn insert(&self, record: &IntakeFormRecord) -> DatabaseResult<()> {
        let mut rows = self.rows.write();
        if rows.iter().any(|r| r.id == record.id) {
            return Err(DatabaseError::QueryFailed(format!("duplicate id {}", record.id)));
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn update(&self, record: &IntakeFormRecord) -> DatabaseResult<()> {
        let mut rows = self.rows.write();
        let slot = rows
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(DatabaseError::RecordNotFound(record.id))?;
        *slot = record.clone();
        Ok(())
    }

    async fn find_submission(&self, id: Uuid) -> DatabaseResult<Option<IntakeFormRecord>> {
        Ok(self
            .rows
            .read()
            .iter()
            .find(|r| r.id == id && !r.is_config)
            .cloned())
    }

    async fn list_submissions(&self, offset: i64, limit: i64) -> DatabaseResult<Vec<IntakeFormRecord>> {
        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .live_submissions_newest_first()
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn count_submissions(&self) -> DatabaseResult<i64> {
        let count = self.rows.read().iter().filter(|r| r.is_live_submission()).count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn count_submissions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DatabaseResult<i64> {
        let count = self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_live_submission() && r.created_at >= from && r.created_at < to)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn daily_submission_counts(&self, since: DateTime<Utc>) -> DatabaseResult<Vec<DailySubmissionCount>> {
        let mut per_day = BTreeMap::new();
        for record in self
            .rows
            .read()
            .iter()
            .filter(|r| r.is_live_submission() && r.created_at >= since)
        {
            *per_day.entry(record.created_at.date_naive()).or_insert(0_i64) += 1;
        }
        Ok(per_day
            .into_iter()
            .map(|(day, count)| DailySubmissionCount { day, count })
            .collect())
    }

    async fn soft_delete_submission(&self, id: Uuid) -> DatabaseResult<bool> {
        let mut rows = self.rows.write();
        match rows.iter_mut().find(|r| r.id == id && r.is_live_submission()) {
            Some(record) => {
                record.is_deleted = Some(true);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
