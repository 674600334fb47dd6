// Database models
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of `intake_forms`.
///
/// The single configuration row has `is_config = true` and carries the schema,
/// field and label documents. Every other row is a submission carrying
/// `form_data_json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct IntakeFormRecord {
    pub id: Uuid,
    pub is_config: bool,
    pub form_data_json: Option<String>,
    pub form_schema_json: Option<String>,
    pub field_labels_json: Option<String>,
    pub additional_fields_json: Option<String>,
    pub is_deleted: Option<bool>,
    /// Rewritten on every configuration change, so it doubles as the audit
    /// timestamp for the configuration row
    pub created_at: DateTime<Utc>,
    pub form_version: i32,
}

impl IntakeFormRecord {
    pub fn new_config(form_schema_json: String, additional_fields_json: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_config: true,
            form_data_json: None,
            form_schema_json: Some(form_schema_json),
            field_labels_json: None,
            additional_fields_json: Some(additional_fields_json),
            is_deleted: Some(false),
            created_at: now,
            form_version: 1,
        }
    }

    pub fn new_submission(form_data_json: String, form_version: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_config: false,
            form_data_json: Some(form_data_json),
            form_schema_json: None,
            field_labels_json: None,
            additional_fields_json: None,
            is_deleted: Some(false),
            created_at: now,
            form_version,
        }
    }

    /// A missing flag counts as not deleted
    pub fn is_soft_deleted(&self) -> bool {
        self.is_deleted == Some(true)
    }

    pub fn is_live_submission(&self) -> bool {
        !self.is_config && !self.is_soft_deleted()
    }
}

/// Submissions per calendar day (UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DailySubmissionCount {
    pub day: NaiveDate,
    pub count: i64,
}
