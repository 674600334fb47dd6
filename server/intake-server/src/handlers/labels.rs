use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::error::{api_success, ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::server::IntakeServer;
use crate::validation::RequestValidation;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    /// One of the fixed intake field keys, e.g. `FullName`
    #[serde(alias = "FieldKey", default)]
    pub field_key: String,
    #[serde(alias = "Label", default)]
    pub label: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub field_key: String,
    pub label: String,
    pub form_version: i32,
}

impl RequestValidation for UpdateLabelRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_required!(self.field_key, "Field key is required");
        crate::validate_required!(self.label, "Label is required");
        Ok(())
    }
}

/// Override the display label of a fixed intake field
#[utoipa::path(
    post,
    path = "/api/v1/intake/labels",
    request_body = UpdateLabelRequest,
    responses(
        (status = 200, description = "Label updated", body = LabelResponse),
        (status = 404, description = "Unknown field key", body = ApiErrorResponse)
    ),
    tag = "labels"
)]
pub async fn update_label(
    State(server): State<IntakeServer>,
    payload: Result<Json<UpdateLabelRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<LabelResponse>>> {
    let Json(request) = payload?;
    request.validate()?;

    let mutation = server
        .forms
        .mutate(|config| {
            config.labels.update(&request.field_key, &request.label)?;
            Ok(config.labels.label(&request.field_key).to_string())
        })
        .await?;

    info!(
        field_key = %request.field_key,
        form_version = mutation.form_version,
        "Field label updated"
    );

    let response = LabelResponse {
        field_key: request.field_key,
        label: mutation.outcome,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Label updated")))
}
