use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use form_engine::{FieldLabels, Step};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::handlers::fields::FieldView;
use crate::server::IntakeServer;

/// Everything the builder screen renders
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuilderPage {
    pub config_id: Uuid,
    pub form_version: i32,
    pub updated_at: DateTime<Utc>,
    /// Disabled steps included
    pub steps: Vec<Step>,
    pub fields: Vec<FieldView>,
    pub labels: FieldLabels,
    /// Raw schema document as stored
    pub schema_json: String,
}

/// Builder page model
#[utoipa::path(
    get,
    path = "/api/v1/intake/builder",
    responses(
        (status = 200, description = "Current form configuration", body = BuilderPage)
    ),
    tag = "builder"
)]
pub async fn builder_page(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<BuilderPage>>> {
    let config = server.forms.current().await?;

    let page = BuilderPage {
        config_id: config.id,
        form_version: config.form_version,
        updated_at: config.updated_at,
        steps: config.steps(),
        fields: config.fields.active_fields().into_iter().map(FieldView::from).collect(),
        labels: config.labels.clone(),
        schema_json: config.schema_json().to_string(),
    };

    Ok(Json(api_success(page)))
}
