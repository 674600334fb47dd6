//! Configuration record accessor.
//!
//! Every write to the form configuration goes through
//! [`FormConfigService::mutate`]: load the row, apply the change to a decoded
//! [`FormConfig`], bump `form_version`, touch `created_at`, persist, then drop
//! the cached copy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use database_layer::{IntakeFormRecord, IntakeFormStore};
use form_engine::registry::{normalize_legacy_fields_json, RemapSummary};
use form_engine::{schema, FieldLabels, FieldRegistry, Step};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::services::config_cache::ConfigCache;

/// Decoded view of the configuration row
#[derive(Debug, Clone)]
pub struct FormConfig {
    pub id: Uuid,
    pub form_version: i32,
    pub updated_at: DateTime<Utc>,
    schema_json: String,
    pub fields: FieldRegistry,
    pub labels: FieldLabels,
}

impl FormConfig {
    pub fn from_record(record: &IntakeFormRecord) -> Self {
        Self {
            id: record.id,
            form_version: record.form_version,
            updated_at: record.created_at,
            schema_json: record.form_schema_json.clone().unwrap_or_default(),
            fields: FieldRegistry::from_json(record.additional_fields_json.as_deref()),
            labels: FieldLabels::from_json(record.field_labels_json.as_deref()),
        }
    }

    pub fn schema_json(&self) -> &str {
        &self.schema_json
    }

    pub fn set_schema_json(&mut self, json: String) {
        self.schema_json = json;
    }

    /// All steps, disabled ones included, by order
    pub fn steps(&self) -> Vec<Step> {
        schema::read_steps(Some(&self.schema_json))
    }

    pub fn active_steps(&self) -> Vec<Step> {
        self.steps().into_iter().filter(|s| s.is_active).collect()
    }

    pub fn replace_steps(&mut self, steps: &[Step]) {
        self.schema_json = schema::write_steps(Some(&self.schema_json), steps);
    }

    fn write_to(&self, record: &mut IntakeFormRecord) {
        record.form_schema_json = Some(self.schema_json.clone());
        record.additional_fields_json = Some(self.fields.to_json());
        record.field_labels_json = Some(self.labels.to_json());
    }
}

/// A persisted configuration change
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    pub outcome: T,
    pub form_version: i32,
}

#[derive(Clone)]
pub struct FormConfigService {
    store: Arc<dyn IntakeFormStore>,
    cache: Arc<ConfigCache>,
}

impl FormConfigService {
    pub fn new(store: Arc<dyn IntakeFormStore>, cache: Arc<ConfigCache>) -> Self {
        Self { store, cache }
    }

    fn now(&self) -> DateTime<Utc> {
        self.cache.clock().now()
    }

    /// The configuration row, served from the cache while it is fresh.
    ///
    /// # Errors
    ///
    /// Store failures while loading, creating or re-seeding the row.
    pub async fn get_or_create_config(&self) -> ApiResult<IntakeFormRecord> {
        self.cache.get_or_load(|| self.load_or_create()).await
    }

    /// Decoded configuration for read paths
    ///
    /// # Errors
    ///
    /// See [`FormConfigService::get_or_create_config`].
    pub async fn current(&self) -> ApiResult<FormConfig> {
        Ok(FormConfig::from_record(&self.get_or_create_config().await?))
    }

    /// Loads the newest configuration row, bypassing the cache.
    ///
    /// With no row yet, one is created with the default steps, an empty
    /// field list and version 1. An existing row missing any default step
    /// gets it back, fields follow any renumbered step, and the row is
    /// persisted with a bumped version only then.
    async fn load_or_create(&self) -> ApiResult<IntakeFormRecord> {
        let Some(mut record) = self.store.latest_config().await? else {
            let (schema_json, steps) = schema::ensure_seeded_default_steps(None);
            let record = IntakeFormRecord::new_config(schema_json, FieldRegistry::default().to_json(), self.now());
            self.store.insert(&record).await?;
            info!(
                config_id = %record.id,
                step_count = steps.len(),
                form_version = record.form_version,
                "Form configuration created with default steps"
            );
            return Ok(record);
        };

        let current = record.form_schema_json.as_deref();
        let seeded = schema::seed_default_steps(current);
        if current.unwrap_or_default() != seeded.json {
            let mut summary = RemapSummary::default();
            if !seeded.remap.is_identity() {
                let mut fields = FieldRegistry::from_json(record.additional_fields_json.as_deref());
                summary = fields.apply_step_remap(&seeded.remap);
                record.additional_fields_json = Some(fields.to_json());
            }
            record.form_schema_json = Some(seeded.json);
            record.form_version += 1;
            self.store.update(&record).await?;
            warn!(
                config_id = %record.id,
                form_version = record.form_version,
                fields_moved = summary.moved,
                "Missing default steps restored"
            );
        }

        Ok(record)
    }

    /// Applies `action` to the current configuration and persists the result.
    ///
    /// Nothing is written when `action` fails.
    ///
    /// # Errors
    ///
    /// Whatever `action` returns, and store failures.
    pub async fn mutate<T, F>(&self, action: F) -> ApiResult<Mutation<T>>
    where
        F: FnOnce(&mut FormConfig) -> ApiResult<T>,
    {
        let mut record = self.load_or_create().await?;
        let mut config = FormConfig::from_record(&record);

        let outcome = action(&mut config)?;

        config.write_to(&mut record);
        record.form_version += 1;
        record.created_at = self.now();
        self.store.update(&record).await?;
        self.cache.invalidate().await;

        info!(
            config_id = %record.id,
            form_version = record.form_version,
            "Form configuration updated"
        );

        Ok(Mutation {
            outcome,
            form_version: record.form_version,
        })
    }

    /// Replaces the step list with the three default steps. Fields keep their
    /// step numbers.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn reseed_default_steps(&self) -> ApiResult<Mutation<Vec<Step>>> {
        self.mutate(|config| {
            let (_, defaults) = schema::ensure_seeded_default_steps(None);
            config.replace_steps(&defaults);

            let orders: Vec<i32> = defaults.iter().map(|s| s.order).collect();
            let orphaned = config.fields.orphaned(&orders).count();
            if orphaned > 0 {
                warn!(orphaned_fields = orphaned, "Fields reference steps that no longer exist after re-seed");
            }
            Ok(defaults)
        })
        .await
    }

    /// Rewrites configuration rows whose field list was stored as a single
    /// object instead of an array. Returns how many rows changed.
    ///
    /// This repairs storage shape only, so versions are left alone.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn normalize_legacy_fields(&self) -> ApiResult<usize> {
        let mut updated = 0;
        for mut record in self.store.list_configs().await? {
            let Some(normalized) = record
                .additional_fields_json
                .as_deref()
                .and_then(normalize_legacy_fields_json)
            else {
                continue;
            };
            record.additional_fields_json = Some(normalized);
            self.store.update(&record).await?;
            info!(config_id = %record.id, "Legacy field list normalized");
            updated += 1;
        }

        if updated > 0 {
            self.cache.invalidate().await;
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::services::config_cache::{Clock, ManualClock};
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use database_layer::{DailySubmissionCount, DatabaseError, DatabaseResult, InMemoryIntakeStore};
    use form_engine::{FieldDraft, FormError};
    use mockall::mock;
    use std::time::Duration;

    mock! {
        pub Store {}

        #[async_trait]
        impl IntakeFormStore for Store {
            async fn latest_config(&self) -> DatabaseResult<Option<IntakeFormRecord>>;
            async fn list_configs(&self) -> DatabaseResult<Vec<IntakeFormRecord>>;
            async fn insert(&self, record: &IntakeFormRecord) -> DatabaseResult<()>;
            async fn update(&self, record: &IntakeFormRecord) -> DatabaseResult<()>;
            async fn find_submission(&self, id: Uuid) -> DatabaseResult<Option<IntakeFormRecord>>;
            async fn list_submissions(&self, offset: i64, limit: i64) -> DatabaseResult<Vec<IntakeFormRecord>>;
            async fn count_submissions(&self) -> DatabaseResult<i64>;
            async fn count_submissions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DatabaseResult<i64>;
            async fn daily_submission_counts(&self, since: DateTime<Utc>) -> DatabaseResult<Vec<DailySubmissionCount>>;
            async fn soft_delete_submission(&self, id: Uuid) -> DatabaseResult<bool>;
            async fn is_healthy(&self) -> bool;
        }
    }

    fn service(store: Arc<dyn IntakeFormStore>) -> (FormConfigService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(ConfigCache::new(Duration::from_secs(300), clock.clone()));
        (FormConfigService::new(store, cache), clock)
    }

    fn seeded_record() -> IntakeFormRecord {
        let (schema_json, _) = schema::ensure_seeded_default_steps(None);
        IntakeFormRecord::new_config(schema_json, "[]".into(), Utc::now())
    }

    #[tokio::test]
    async fn creates_default_config_once() {
        let mut store = MockStore::new();
        store.expect_latest_config().times(1).returning(|| Ok(None));
        store
            .expect_insert()
            .withf(|record: &IntakeFormRecord| record.is_config && record.form_version == 1)
            .times(1)
            .returning(|_| Ok(()));
        store.expect_update().never();

        let (service, _) = service(Arc::new(store));
        let first = service.get_or_create_config().await.unwrap();
        let second = service.get_or_create_config().await.unwrap();

        assert_eq!(first.id, second.id);
        let names: Vec<String> = FormConfig::from_record(&first).steps().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Client Hx", "Substances", "Sex & Health"]);
    }

    #[tokio::test]
    async fn complete_config_is_not_rewritten() {
        let existing = seeded_record();
        let mut store = MockStore::new();
        store.expect_latest_config().returning(move || Ok(Some(existing.clone())));
        store.expect_update().never();
        store.expect_insert().never();

        let (service, _) = service(Arc::new(store));
        let record = service.get_or_create_config().await.unwrap();
        assert_eq!(record.form_version, 1);
    }

    #[tokio::test]
    async fn missing_default_step_is_restored_with_version_bump() {
        let mut existing = seeded_record();
        let mut steps = schema::read_steps(existing.form_schema_json.as_deref());
        steps.retain(|s| s.order != 2);
        existing.form_schema_json = Some(schema::write_steps(None, &steps));
        existing.form_version = 4;

        let mut store = MockStore::new();
        store.expect_latest_config().returning(move || Ok(Some(existing.clone())));
        store
            .expect_update()
            .withf(|record: &IntakeFormRecord| record.form_version == 5)
            .times(1)
            .returning(|_| Ok(()));

        let (service, _) = service(Arc::new(store));
        let record = service.get_or_create_config().await.unwrap();
        assert_eq!(FormConfig::from_record(&record).steps().len(), 3);
    }

    #[tokio::test]
    async fn restoring_defaults_moves_fields_with_renumbered_steps() {
        let mut existing = seeded_record();
        existing.form_schema_json = Some(schema::write_steps(
            None,
            &[Step::new("Client Hx", 1), Step::new("Substances", 2), Step::new("Late", 7)],
        ));
        let mut fields = FieldRegistry::default();
        fields.add(FieldDraft::new("Follow up", "text", 7), "admin").unwrap();
        existing.additional_fields_json = Some(fields.to_json());

        let store = Arc::new(InMemoryIntakeStore::with_records(vec![existing]));
        let (service, _) = service(store);
        let config = service.current().await.unwrap();

        let steps: Vec<(String, i32)> = config.steps().into_iter().map(|s| (s.name, s.order)).collect();
        assert_eq!(
            steps,
            vec![
                ("Client Hx".to_string(), 1),
                ("Substances".to_string(), 2),
                ("Sex & Health".to_string(), 3),
                ("Late".to_string(), 4),
            ]
        );
        assert_eq!(config.form_version, 2);
        assert_eq!(config.fields.fields()[0].step, 4);
        assert_eq!(config.fields.orphaned(&[1, 2, 3, 4]).count(), 0);
    }

    #[tokio::test]
    async fn failed_action_persists_nothing() {
        let existing = seeded_record();
        let mut store = MockStore::new();
        store.expect_latest_config().returning(move || Ok(Some(existing.clone())));
        store.expect_update().never();

        let (service, _) = service(Arc::new(store));
        let err = service
            .mutate(|_| -> ApiResult<()> { Err(FormError::StepNotFound.into()) })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_database_error() {
        let existing = seeded_record();
        let mut store = MockStore::new();
        store.expect_latest_config().returning(move || Ok(Some(existing.clone())));
        store
            .expect_update()
            .returning(|_| Err(DatabaseError::QueryFailed("disk full".into())));

        let (service, _) = service(Arc::new(store));
        let err = service.mutate(|_| Ok(())).await.unwrap_err();
        assert!(matches!(err, ApiError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn mutation_bumps_version_touches_timestamp_and_invalidates_cache() {
        let store = Arc::new(InMemoryIntakeStore::new());
        let (service, clock) = service(store.clone());

        let before = service.get_or_create_config().await.unwrap();
        clock.advance(Duration::from_secs(30));

        let mutation = service
            .mutate(|config| {
                let outcome = config.fields.add(FieldDraft::new("Preferred pharmacy", "text", 1), "admin")?;
                Ok(outcome.field().field_id)
            })
            .await
            .unwrap();

        assert_eq!(mutation.form_version, before.form_version + 1);

        let after = service.get_or_create_config().await.unwrap();
        assert_eq!(after.form_version, mutation.form_version);
        assert_eq!(after.created_at, clock.now());
        assert!(FormConfig::from_record(&after).fields.find(mutation.outcome).is_some());
    }

    #[tokio::test]
    async fn normalizes_single_object_field_lists() {
        let mut legacy = seeded_record();
        legacy.additional_fields_json =
            Some(r#"{"FieldId":"6f1c4c8e-6a43-4bd0-9d57-3c7b1e8a9d21","FieldName":"additional_notes","DisplayName":"Notes"}"#.into());
        let store = Arc::new(InMemoryIntakeStore::with_records(vec![legacy.clone(), seeded_record()]));
        let (service, _) = service(store.clone());

        assert_eq!(service.normalize_legacy_fields().await.unwrap(), 1);
        assert_eq!(service.normalize_legacy_fields().await.unwrap(), 0);

        let rows = store.snapshot();
        let repaired = rows.iter().find(|r| r.id == legacy.id).unwrap();
        assert!(repaired.additional_fields_json.as_deref().unwrap().starts_with('['));
        assert_eq!(repaired.form_version, legacy.form_version);
    }

    #[tokio::test]
    async fn reseed_replaces_steps_with_defaults() {
        let store = Arc::new(InMemoryIntakeStore::new());
        let (service, _) = service(store);

        service
            .mutate(|config| {
                let mut steps = config.steps();
                form_engine::layout::add_step(&mut steps, "Consent", None)?;
                config.replace_steps(&steps);
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(service.current().await.unwrap().steps().len(), 4);

        let mutation = service.reseed_default_steps().await.unwrap();
        assert_eq!(mutation.outcome.len(), 3);
        assert_eq!(service.current().await.unwrap().steps().len(), 3);
    }
}
