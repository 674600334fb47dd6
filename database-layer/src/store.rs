use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::connection::DatabasePool;
use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{DailySubmissionCount, IntakeFormRecord};

/// Persistence operations over the `intake_forms` table.
///
/// "Live" submissions are rows with `is_config = false` whose `is_deleted`
/// flag is not true.
#[async_trait]
pub trait IntakeFormStore: Send + Sync {
    /// Most recently touched configuration row
    async fn latest_config(&self) -> DatabaseResult<Option<IntakeFormRecord>>;

    /// Every configuration row, newest first
    async fn list_configs(&self) -> DatabaseResult<Vec<IntakeFormRecord>>;

    async fn insert(&self, record: &IntakeFormRecord) -> DatabaseResult<()>;

    /// Overwrites the row with the same id
    async fn update(&self, record: &IntakeFormRecord) -> DatabaseResult<()>;

    /// A submission row by id, including soft-deleted ones
    async fn find_submission(&self, id: Uuid) -> DatabaseResult<Option<IntakeFormRecord>>;

    /// Live submissions, newest first
    async fn list_submissions(&self, offset: i64, limit: i64) -> DatabaseResult<Vec<IntakeFormRecord>>;

    async fn count_submissions(&self) -> DatabaseResult<i64>;

    /// Live submissions created in `[from, to)`
    async fn count_submissions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DatabaseResult<i64>;

    /// Live submissions per UTC day, for days on or after `since`
    async fn daily_submission_counts(&self, since: DateTime<Utc>) -> DatabaseResult<Vec<DailySubmissionCount>>;

    /// Returns false when no live submission has that id
    async fn soft_delete_submission(&self, id: Uuid) -> DatabaseResult<bool>;

    async fn is_healthy(&self) -> bool;
}

const RECORD_COLUMNS: &str = "id, is_config, form_data_json, form_schema_json, field_labels_json, \
     additional_fields_json, is_deleted, created_at, form_version";

/// sqlx-backed store
#[derive(Clone, Debug)]
pub struct PostgresIntakeStore {
    db: DatabasePool,
}

impl PostgresIntakeStore {
    pub fn new(db: DatabasePool) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &DatabasePool {
        &self.db
    }
}

#[async_trait]
impl IntakeFormStore for PostgresIntakeStore {
    async fn latest_config(&self) -> DatabaseResult<Option<IntakeFormRecord>> {
        let record = sqlx::query_as::<_, IntakeFormRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM intake_forms \
             WHERE is_config = TRUE ORDER BY created_at DESC LIMIT 1"
        ))
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }

    async fn list_configs(&self) -> DatabaseResult<Vec<IntakeFormRecord>> {
        let records = sqlx::query_as::<_, IntakeFormRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM intake_forms \
             WHERE is_config = TRUE ORDER BY created_at DESC"
        ))
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    async fn insert(&self, record: &IntakeFormRecord) -> DatabaseResult<()> {
        sqlx::query(&format!(
            "INSERT INTO intake_forms ({RECORD_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(record.id)
        .bind(record.is_config)
        .bind(&record.form_data_json)
        .bind(&record.form_schema_json)
        .bind(&record.field_labels_json)
        .bind(&record.additional_fields_json)
        .bind(record.is_deleted)
        .bind(record.created_at)
        .bind(record.form_version)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }

    async fn update(&self, record: &IntakeFormRecord) -> DatabaseResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE intake_forms
            SET is_config = $2,
                form_data_json = $3,
                form_schema_json = $4,
                field_labels_json = $5,
                additional_fields_json = $6,
                is_deleted = $7,
                created_at = $8,
                form_version = $9
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(record.is_config)
        .bind(&record.form_data_json)
        .bind(&record.form_schema_json)
        .bind(&record.field_labels_json)
        .bind(&record.additional_fields_json)
        .bind(record.is_deleted)
        .bind(record.created_at)
        .bind(record.form_version)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::RecordNotFound(record.id));
        }
        Ok(())
    }

    async fn find_submission(&self, id: Uuid) -> DatabaseResult<Option<IntakeFormRecord>> {
        let record = sqlx::query_as::<_, IntakeFormRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM intake_forms WHERE id = $1 AND is_config = FALSE"
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(record)
    }

    async fn list_submissions(&self, offset: i64, limit: i64) -> DatabaseResult<Vec<IntakeFormRecord>> {
        let records = sqlx::query_as::<_, IntakeFormRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM intake_forms \
             WHERE is_config = FALSE AND is_deleted IS NOT TRUE \
             ORDER BY created_at DESC OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(records)
    }

    async fn count_submissions(&self) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM intake_forms WHERE is_config = FALSE AND is_deleted IS NOT TRUE",
        )
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn count_submissions_between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> DatabaseResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM intake_forms
            WHERE is_config = FALSE AND is_deleted IS NOT TRUE
              AND created_at >= $1 AND created_at < $2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(self.db.pool())
        .await?;

        Ok(count)
    }

    async fn daily_submission_counts(&self, since: DateTime<Utc>) -> DatabaseResult<Vec<DailySubmissionCount>> {
        let counts = sqlx::query_as::<_, DailySubmissionCount>(
            r#"
            SELECT (created_at AT TIME ZONE 'UTC')::date AS day, COUNT(*) AS count
            FROM intake_forms
            WHERE is_config = FALSE AND is_deleted IS NOT TRUE AND created_at >= $1
            GROUP BY day
            ORDER BY day
            "#,
        )
        .bind(since)
        .fetch_all(self.db.pool())
        .await?;

        Ok(counts)
    }

    async fn soft_delete_submission(&self, id: Uuid) -> DatabaseResult<bool> {
        let result = sqlx::query(
            "UPDATE intake_forms SET is_deleted = TRUE \
             WHERE id = $1 AND is_config = FALSE AND is_deleted IS NOT TRUE",
        )
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_healthy(&self) -> bool {
        self.db.is_healthy().await
    }
}
