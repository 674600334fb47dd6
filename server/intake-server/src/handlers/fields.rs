//! Admin-defined field endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use form_engine::field::parse_conditional_logic;
use form_engine::registry::AddOutcome;
use form_engine::{ConditionalLogic, Field, FieldDraft, FieldOption, InputType};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::server::IntakeServer;
use crate::services::FormConfig;
use crate::validation::RequestValidation;

/// Recorded as `createdBy` on fields added through the API
pub const CREATED_BY: &str = "System";

/// A field with its decoded options and conditional logic
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    #[serde(flatten)]
    pub field: Field,
    pub input_type: InputType,
    pub options: Vec<FieldOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditional_logic: Option<ConditionalLogic>,
}

impl From<&Field> for FieldView {
    fn from(field: &Field) -> Self {
        Self {
            input_type: field.input_type(),
            options: field.options(),
            conditional_logic: field.conditional_logic(),
            field: field.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FieldResponse {
    pub field: FieldView,
    pub form_version: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFieldRequest {
    #[serde(alias = "FieldId")]
    pub field_id: Uuid,
    #[serde(flatten)]
    pub draft: FieldDraft,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteFieldRequest {
    #[serde(alias = "FieldId")]
    pub field_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedFieldResponse {
    pub field_id: Uuid,
    pub field_name: String,
    pub form_version: i32,
}

impl RequestValidation for FieldDraft {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_required!(self.display_name, "Field label is required");
        crate::validate_required!(self.field_type, "Field type is required");
        crate::validate_field!(
            self.conditional_logic_json,
            !self.is_conditional
                || self
                    .conditional_logic_json
                    .as_deref()
                    .map(str::trim)
                    .filter(|raw| !raw.is_empty())
                    .map_or(true, |raw| parse_conditional_logic(Some(raw)).is_some()),
            "Conditional logic is not valid JSON"
        );
        Ok(())
    }
}

impl RequestValidation for UpdateFieldRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_uuid!(self.field_id, "Field ID is required");
        self.draft.validate()
    }
}

impl RequestValidation for DeleteFieldRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_uuid!(self.field_id, "Field ID is required");
        Ok(())
    }
}

/// Fields may only point at a step that exists
fn ensure_step_exists(config: &FormConfig, step: i32) -> ApiResult<()> {
    let order = step.max(1);
    if config.steps().iter().any(|s| s.order == order) {
        Ok(())
    } else {
        Err(ApiError::validation(format!("Step {order} does not exist")))
    }
}

/// Add a field, or reactivate a deleted one with the same derived name
#[utoipa::path(
    post,
    path = "/api/v1/intake/fields",
    request_body = FieldDraft,
    responses(
        (status = 200, description = "Field added or restored", body = FieldResponse),
        (status = 400, description = "Invalid field", body = ApiErrorResponse),
        (status = 409, description = "An active field already has this name", body = ApiErrorResponse)
    ),
    tag = "fields"
)]
pub async fn add_field(
    State(server): State<IntakeServer>,
    payload: Result<Json<FieldDraft>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<FieldResponse>>> {
    let Json(draft) = payload?;
    draft.validate()?;

    let mutation = server
        .forms
        .mutate(|config| {
            ensure_step_exists(config, draft.step)?;
            Ok(config.fields.add(draft, CREATED_BY)?)
        })
        .await?;

    let outcome = mutation.outcome;
    let field = outcome.field();
    info!(
        field_id = %field.field_id,
        field_name = %field.field_name,
        step = field.step,
        reactivated = matches!(outcome, AddOutcome::Reactivated(_)),
        form_version = mutation.form_version,
        "Field added"
    );

    let response = FieldResponse {
        field: FieldView::from(field),
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message(outcome.message())))
}

/// Update a field's editable properties. The derived name never changes.
#[utoipa::path(
    post,
    path = "/api/v1/intake/fields/update",
    request_body = UpdateFieldRequest,
    responses(
        (status = 200, description = "Field updated", body = FieldResponse),
        (status = 400, description = "Invalid field", body = ApiErrorResponse),
        (status = 404, description = "Field not found", body = ApiErrorResponse)
    ),
    tag = "fields"
)]
pub async fn update_field(
    State(server): State<IntakeServer>,
    payload: Result<Json<UpdateFieldRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<FieldResponse>>> {
    let Json(request) = payload?;
    request.validate()?;
    let UpdateFieldRequest { field_id, draft } = request;

    let mutation = server
        .forms
        .mutate(|config| {
            ensure_step_exists(config, draft.step)?;
            let field = config.fields.update(field_id, draft)?;
            Ok(FieldView::from(field))
        })
        .await?;

    info!(
        field_id = %field_id,
        step = mutation.outcome.field.step,
        form_version = mutation.form_version,
        "Field updated"
    );

    let response = FieldResponse {
        field: mutation.outcome,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Field updated successfully!")))
}

/// Soft-delete a field
#[utoipa::path(
    post,
    path = "/api/v1/intake/fields/delete",
    request_body = DeleteFieldRequest,
    responses(
        (status = 200, description = "Field deleted", body = DeletedFieldResponse),
        (status = 404, description = "Field not found", body = ApiErrorResponse)
    ),
    tag = "fields"
)]
pub async fn delete_field(
    State(server): State<IntakeServer>,
    payload: Result<Json<DeleteFieldRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<DeletedFieldResponse>>> {
    let Json(request) = payload?;
    request.validate()?;

    let mutation = server
        .forms
        .mutate(|config| Ok(config.fields.delete(request.field_id)?.field_name.clone()))
        .await?;

    info!(
        field_id = %request.field_id,
        form_version = mutation.form_version,
        "Field deleted"
    );

    let response = DeletedFieldResponse {
        field_id: request.field_id,
        field_name: mutation.outcome,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Field deleted successfully!")))
}
