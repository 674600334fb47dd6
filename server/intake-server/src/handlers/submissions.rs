use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    response::Json,
};
use chrono::{DateTime, Utc};
use database_layer::IntakeFormRecord;
use form_engine::submission::{self, FixedValue, SubmissionValue};
use form_engine::Step;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::server::IntakeServer;
use crate::types::PaginationParams;

const SUBMISSION_NOT_FOUND: &str = "Submission not found";

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Configuration version the form was filled out against
    pub form_version: i32,
    pub values: BTreeMap<String, String>,
}

impl From<&IntakeFormRecord> for SubmissionSummary {
    fn from(record: &IntakeFormRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            form_version: record.form_version,
            values: submission::parse_submission_data(record.form_data_json.as_deref()),
        }
    }
}

/// Table column for one active field
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionColumn {
    pub field_name: String,
    pub display_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionList {
    pub submissions: Vec<SubmissionSummary>,
    pub columns: Vec<SubmissionColumn>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionDetail {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub form_version: i32,
    pub current_form_version: i32,
    /// Fixed intake fields with their current labels
    pub fixed: Vec<FixedValue>,
    /// Admin-defined field values joined with field metadata
    pub values: Vec<SubmissionValue>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedSubmission {
    pub submission_id: Uuid,
}

async fn live_submission(server: &IntakeServer, id: Uuid) -> ApiResult<IntakeFormRecord> {
    server
        .store
        .find_submission(id)
        .await?
        .filter(IntakeFormRecord::is_live_submission)
        .ok_or_else(|| ApiError::not_found(SUBMISSION_NOT_FOUND))
}

/// Submissions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/intake/submissions",
    params(PaginationParams),
    responses(
        (status = 200, description = "One page of submissions", body = SubmissionList)
    ),
    tag = "submissions"
)]
pub async fn list_submissions(
    State(server): State<IntakeServer>,
    params: Result<Query<PaginationParams>, QueryRejection>,
) -> ApiResult<Json<ApiResponse<SubmissionList>>> {
    let Query(params) = params?;

    let total = server.store.count_submissions().await?;
    let rows = server.store.list_submissions(params.offset(), params.limit()).await?;
    let config = server.forms.current().await?;

    let columns = config
        .fields
        .active_fields()
        .into_iter()
        .map(|f| SubmissionColumn {
            field_name: f.field_name.clone(),
            display_name: f.display_name.clone(),
        })
        .collect();

    let list = SubmissionList {
        submissions: rows.iter().map(SubmissionSummary::from).collect(),
        columns,
    };
    Ok(Json(params.wrap_response(list, total)))
}

/// One submission with its values labeled
#[utoipa::path(
    get,
    path = "/api/v1/intake/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission detail", body = SubmissionDetail),
        (status = 404, description = "Submission not found", body = ApiErrorResponse)
    ),
    tag = "submissions"
)]
pub async fn get_submission(
    State(server): State<IntakeServer>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<SubmissionDetail>>> {
    let Path(id) = id?;
    let record = live_submission(&server, id).await?;
    let config = server.forms.current().await?;

    let data = submission::parse_submission_data(record.form_data_json.as_deref());
    let detail = SubmissionDetail {
        id: record.id,
        created_at: record.created_at,
        form_version: record.form_version,
        current_form_version: config.form_version,
        fixed: submission::fixed_detail_values(&config.labels, &data),
        values: submission::detail_values(&config.fields.active_fields(), &data),
        steps: config.active_steps(),
    };
    Ok(Json(api_success(detail)))
}

/// Soft-delete a submission
#[utoipa::path(
    delete,
    path = "/api/v1/intake/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission id")),
    responses(
        (status = 200, description = "Submission deleted", body = DeletedSubmission),
        (status = 404, description = "Submission not found", body = ApiErrorResponse)
    ),
    tag = "submissions"
)]
pub async fn delete_submission(
    State(server): State<IntakeServer>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<ApiResponse<DeletedSubmission>>> {
    let Path(id) = id?;
    if !server.store.soft_delete_submission(id).await? {
        return Err(ApiError::not_found(SUBMISSION_NOT_FOUND));
    }

    info!(submission_id = %id, "Submission deleted");
    Ok(Json(
        api_success(DeletedSubmission { submission_id: id }).with_message("Submission deleted successfully!"),
    ))
}
