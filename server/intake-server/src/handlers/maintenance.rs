//! Repair and inspection endpoints for administrators

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use form_engine::schema::FormSchemaDocument;
use form_engine::Step;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::server::IntakeServer;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReseedResponse {
    pub steps: Vec<Step>,
    pub step_count: usize,
    pub form_version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeResponse {
    /// Configuration rows rewritten
    pub updated: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepDiagnostics {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub is_active: bool,
    pub group_count: usize,
    pub field_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldDiagnostics {
    pub field_id: Uuid,
    pub field_name: String,
    pub display_name: String,
    pub field_type: String,
    pub step: i32,
    pub is_required: bool,
    pub is_conditional: bool,
}

/// Result of reading the stored schema document without repairs
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SchemaReport {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub warnings: Vec<String>,
}

impl SchemaReport {
    fn inspect(doc: &str) -> Self {
        match FormSchemaDocument::parse_strict(doc) {
            Ok(parsed) => Self {
                valid: true,
                schema_version: parsed.schema_version,
                error: None,
                warnings: parsed.warnings(),
            },
            Err(e) => Self {
                valid: false,
                schema_version: None,
                error: Some(e.to_string()),
                warnings: Vec::new(),
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    pub config_id: Uuid,
    pub form_version: i32,
    pub updated_at: DateTime<Utc>,
    pub total_steps: usize,
    pub active_steps: usize,
    pub steps: Vec<StepDiagnostics>,
    pub total_fields: usize,
    pub fields: Vec<FieldDiagnostics>,
    /// Names of live fields pointing at a step that does not exist
    pub orphaned_fields: Vec<String>,
    pub schema: SchemaReport,
}

/// Reset the step list to the three default steps
#[utoipa::path(
    post,
    path = "/api/v1/intake/maintenance/reseed-steps",
    responses(
        (status = 200, description = "Steps re-seeded", body = ReseedResponse)
    ),
    tag = "maintenance"
)]
pub async fn reseed_steps(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<ReseedResponse>>> {
    let mutation = server.forms.reseed_default_steps().await?;
    info!(
        step_count = mutation.outcome.len(),
        form_version = mutation.form_version,
        "Default steps re-seeded"
    );

    let response = ReseedResponse {
        step_count: mutation.outcome.len(),
        steps: mutation.outcome,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Default steps re-seeded successfully!")))
}

/// Rewrite field lists stored as a single object into arrays
#[utoipa::path(
    post,
    path = "/api/v1/intake/maintenance/normalize-fields",
    responses(
        (status = 200, description = "Rows normalized", body = NormalizeResponse)
    ),
    tag = "maintenance"
)]
pub async fn normalize_fields(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<NormalizeResponse>>> {
    let updated = server.forms.normalize_legacy_fields().await?;
    info!(updated, "Legacy field normalization finished");
    Ok(Json(api_success(NormalizeResponse { updated })))
}

/// Summary of the stored configuration for troubleshooting
#[utoipa::path(
    get,
    path = "/api/v1/intake/maintenance/diagnostics",
    responses(
        (status = 200, description = "Configuration summary", body = Diagnostics)
    ),
    tag = "maintenance"
)]
pub async fn diagnostics(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<Diagnostics>>> {
    let config = server.forms.current().await?;
    let steps = config.steps();
    let live = config.fields.active_fields();

    let step_orders: Vec<i32> = steps.iter().map(|s| s.order).collect();
    let orphaned_fields: Vec<String> = config
        .fields
        .orphaned(&step_orders)
        .map(|f| f.field_name.clone())
        .collect();
    if !orphaned_fields.is_empty() {
        warn!(orphaned = orphaned_fields.len(), "Fields reference missing steps");
    }

    let step_diagnostics = steps
        .iter()
        .map(|s| StepDiagnostics {
            id: s.id,
            name: s.name.clone(),
            order: s.order,
            is_active: s.is_active,
            group_count: s.groups.len(),
            field_count: live.iter().filter(|f| f.step == s.order).count(),
        })
        .collect();

    let fields = live
        .iter()
        .map(|f| FieldDiagnostics {
            field_id: f.field_id,
            field_name: f.field_name.clone(),
            display_name: f.display_name.clone(),
            field_type: f.field_type.clone(),
            step: f.step,
            is_required: f.is_required,
            is_conditional: f.is_conditional,
        })
        .collect();

    Ok(Json(api_success(Diagnostics {
        config_id: config.id,
        form_version: config.form_version,
        updated_at: config.updated_at,
        total_steps: steps.len(),
        active_steps: steps.iter().filter(|s| s.is_active).count(),
        steps: step_diagnostics,
        total_fields: live.len(),
        fields,
        orphaned_fields,
        schema: SchemaReport::inspect(config.schema_json()),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_report_for_seeded_document() {
        let (doc, _) = form_engine::schema::ensure_seeded_default_steps(None);
        let report = SchemaReport::inspect(&doc);
        assert!(report.valid);
        assert_eq!(report.schema_version, Some(form_engine::schema::SCHEMA_VERSION));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_schema_report_for_garbage() {
        let report = SchemaReport::inspect("{\"steps\": 3}");
        assert!(!report.valid);
        assert!(report.error.unwrap().contains("must be an array"));
    }
}
