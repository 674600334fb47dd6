//! Step layout endpoints.
//!
//! Fields reference steps by order, so every change that moves or removes a
//! step also applies the resulting remap to the field list inside the same
//! mutation.

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use form_engine::{layout, schema, Step, StepGroup};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::server::IntakeServer;
use crate::validation::RequestValidation;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStepRequest {
    #[serde(alias = "StepName", default)]
    pub step_name: String,
    #[serde(alias = "StepDescription", default)]
    pub step_description: Option<String>,
    /// Position to insert at, appended when absent or past the end
    #[serde(alias = "StepOrder", default)]
    pub step_order: Option<i32>,
    #[serde(alias = "StepIcon", default)]
    pub step_icon: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStepRequest {
    #[serde(alias = "StepId")]
    pub step_id: Uuid,
    #[serde(alias = "StepName", default)]
    pub step_name: String,
    /// Ignored unless positive
    #[serde(alias = "StepOrder", default)]
    pub step_order: Option<i32>,
    #[serde(alias = "StepIcon", default)]
    pub step_icon: Option<String>,
    #[serde(alias = "StepDescription", default)]
    pub step_description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepIdRequest {
    #[serde(alias = "StepId")]
    pub step_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleStepRequest {
    #[serde(alias = "StepId")]
    pub step_id: Uuid,
    #[serde(alias = "IsActive")]
    pub is_active: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepGroupsRequest {
    #[serde(alias = "StepOrder")]
    pub step_order: i32,
    #[serde(alias = "Groups", default)]
    pub groups: Vec<StepGroup>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepResponse {
    pub step: Step,
    /// Fields that followed their step to a new order
    pub fields_moved: usize,
    /// Fields dropped together with a deleted step
    pub fields_removed: usize,
    pub form_version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepToggleResponse {
    pub step: Step,
    pub form_version: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DisabledStepsResponse {
    pub steps: Vec<Step>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StepGroupsResponse {
    pub step_order: i32,
    pub group_count: usize,
    pub form_version: i32,
}

impl RequestValidation for AddStepRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_required!(self.step_name, "Step name is required");
        Ok(())
    }
}

impl RequestValidation for UpdateStepRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_uuid!(self.step_id, "Step ID is required");
        crate::validate_required!(self.step_name, "Step name is required");
        Ok(())
    }
}

impl RequestValidation for StepIdRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_uuid!(self.step_id, "Step ID is required");
        Ok(())
    }
}

impl RequestValidation for StepGroupsRequest {
    fn validate(&self) -> Result<(), ApiError> {
        crate::validate_field!(self.step_order, self.step_order > 0, "Step order must be positive");
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Insert a step, shifting later steps and their fields down by one
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps",
    request_body = AddStepRequest,
    responses(
        (status = 200, description = "Step added", body = StepResponse),
        (status = 400, description = "Blank step name", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn add_step(
    State(server): State<IntakeServer>,
    payload: Result<Json<AddStepRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepResponse>>> {
    let Json(request) = payload?;
    request.validate()?;
    let AddStepRequest {
        step_name,
        step_description,
        step_order,
        step_icon,
    } = request;

    let mutation = server
        .forms
        .mutate(|config| {
            let mut steps = config.steps();
            let (added, remap) = layout::add_step(&mut steps, &step_name, step_order)?;

            let mut step = added;
            if let Some(stored) = steps.iter_mut().find(|s| s.id == step.id) {
                stored.icon = non_blank(step_icon);
                stored.description = non_blank(step_description);
                step = stored.clone();
            }

            config.replace_steps(&steps);
            let summary = config.fields.apply_step_remap(&remap);
            Ok((step, summary))
        })
        .await?;

    let (step, summary) = mutation.outcome;
    info!(
        step_id = %step.id,
        step_order = step.order,
        fields_moved = summary.moved,
        form_version = mutation.form_version,
        "Step added"
    );

    let message = format!("Step '{}' added successfully!", step.name);
    let response = StepResponse {
        step,
        fields_moved: summary.moved,
        fields_removed: summary.removed,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message(message)))
}

/// Rename a step and optionally move it
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps/update",
    request_body = UpdateStepRequest,
    responses(
        (status = 200, description = "Step updated", body = StepResponse),
        (status = 404, description = "Step not found", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn update_step(
    State(server): State<IntakeServer>,
    payload: Result<Json<UpdateStepRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepResponse>>> {
    let Json(request) = payload?;
    request.validate()?;
    let UpdateStepRequest {
        step_id,
        step_name,
        step_order,
        step_icon,
        step_description,
    } = request;

    let mutation = server
        .forms
        .mutate(|config| {
            let mut steps = config.steps();
            let (updated, remap) = layout::update_step(&mut steps, step_id, &step_name, step_order)?;

            let mut step = updated;
            if let Some(stored) = steps.iter_mut().find(|s| s.id == step_id) {
                if step_icon.is_some() {
                    stored.icon = non_blank(step_icon);
                }
                if step_description.is_some() {
                    stored.description = non_blank(step_description);
                }
                step = stored.clone();
            }

            config.replace_steps(&steps);
            let summary = config.fields.apply_step_remap(&remap);
            Ok((step, summary))
        })
        .await?;

    let (step, summary) = mutation.outcome;
    info!(
        step_id = %step.id,
        step_order = step.order,
        fields_moved = summary.moved,
        form_version = mutation.form_version,
        "Step updated"
    );

    let response = StepResponse {
        step,
        fields_moved: summary.moved,
        fields_removed: summary.removed,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Step updated successfully!")))
}

/// Remove a step together with its fields
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps/delete",
    request_body = StepIdRequest,
    responses(
        (status = 200, description = "Step deleted", body = StepResponse),
        (status = 404, description = "Step not found", body = ApiErrorResponse),
        (status = 409, description = "Last active step", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn delete_step(
    State(server): State<IntakeServer>,
    payload: Result<Json<StepIdRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepResponse>>> {
    let Json(request) = payload?;
    request.validate()?;

    let mutation = server
        .forms
        .mutate(|config| {
            let mut steps = config.steps();
            let (removed, remap) = layout::delete_step(&mut steps, request.step_id)?;
            config.replace_steps(&steps);
            let summary = config.fields.apply_step_remap(&remap);
            Ok((removed, summary))
        })
        .await?;

    let (step, summary) = mutation.outcome;
    info!(
        step_id = %step.id,
        step_order = step.order,
        fields_removed = summary.removed,
        fields_moved = summary.moved,
        form_version = mutation.form_version,
        "Step deleted"
    );

    let response = StepResponse {
        step,
        fields_moved: summary.moved,
        fields_removed: summary.removed,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Step deleted successfully!")))
}

/// Show or hide a step on the public form
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps/toggle",
    request_body = ToggleStepRequest,
    responses(
        (status = 200, description = "Step toggled", body = StepToggleResponse),
        (status = 404, description = "Step not found", body = ApiErrorResponse),
        (status = 409, description = "Last active step", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn toggle_step(
    State(server): State<IntakeServer>,
    payload: Result<Json<ToggleStepRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepToggleResponse>>> {
    let Json(request) = payload?;
    crate::validate_uuid!(request.step_id, "Step ID is required");

    let mutation = server
        .forms
        .mutate(|config| {
            let toggle = schema::toggle_step_active(Some(config.schema_json()), request.step_id, request.is_active)?;
            config.set_schema_json(toggle.json);
            Ok((toggle.step, toggle.message))
        })
        .await?;

    let (step, message) = mutation.outcome;
    info!(
        step_id = %step.id,
        is_active = step.is_active,
        form_version = mutation.form_version,
        "Step toggled"
    );

    let response = StepToggleResponse {
        step,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message(message)))
}

/// Re-enable a disabled step
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps/restore",
    request_body = StepIdRequest,
    responses(
        (status = 200, description = "Step restored", body = StepToggleResponse),
        (status = 404, description = "Step not found", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn restore_step(
    State(server): State<IntakeServer>,
    payload: Result<Json<StepIdRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepToggleResponse>>> {
    let Json(request) = payload?;
    request.validate()?;

    let mutation = server
        .forms
        .mutate(|config| {
            let restored = schema::restore_disabled_step(Some(config.schema_json()), request.step_id)?;
            config.set_schema_json(restored.json);
            Ok((restored.step, restored.message))
        })
        .await?;

    let (step, message) = mutation.outcome;
    info!(step_id = %step.id, form_version = mutation.form_version, "Step restored");

    let response = StepToggleResponse {
        step,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message(message)))
}

/// Steps currently hidden from the public form
#[utoipa::path(
    get,
    path = "/api/v1/intake/steps/disabled",
    responses(
        (status = 200, description = "Disabled steps by order", body = DisabledStepsResponse)
    ),
    tag = "steps"
)]
pub async fn disabled_steps(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<DisabledStepsResponse>>> {
    let config = server.forms.current().await?;
    let steps = schema::disabled_steps(Some(config.schema_json()));
    Ok(Json(api_success(DisabledStepsResponse { steps })))
}

/// Replace the groups of one step
#[utoipa::path(
    post,
    path = "/api/v1/intake/steps/groups",
    request_body = StepGroupsRequest,
    responses(
        (status = 200, description = "Groups replaced", body = StepGroupsResponse),
        (status = 404, description = "No step has that order", body = ApiErrorResponse)
    ),
    tag = "steps"
)]
pub async fn update_step_groups(
    State(server): State<IntakeServer>,
    payload: Result<Json<StepGroupsRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<StepGroupsResponse>>> {
    let Json(request) = payload?;
    request.validate()?;
    let StepGroupsRequest { step_order, groups } = request;
    let group_count = groups.len();

    let mutation = server
        .forms
        .mutate(|config| {
            let json = schema::upsert_step_groups(Some(config.schema_json()), step_order, groups)?;
            config.set_schema_json(json);
            Ok(())
        })
        .await?;

    info!(
        step_order,
        group_count,
        form_version = mutation.form_version,
        "Step groups updated"
    );

    let response = StepGroupsResponse {
        step_order,
        group_count,
        form_version: mutation.form_version,
    };
    Ok(Json(api_success(response).with_message("Groups updated successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_request_reads_builder_casing() {
        let request: AddStepRequest = serde_json::from_value(serde_json::json!({
            "StepName": "Medications",
            "StepOrder": 2,
            "StepIcon": "pill"
        }))
        .unwrap();

        assert_eq!(request.step_name, "Medications");
        assert_eq!(request.step_order, Some(2));
        assert!(request.step_description.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_blank_step_name_rejected() {
        let request = AddStepRequest {
            step_name: "   ".into(),
            step_description: None,
            step_order: None,
            step_icon: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank(Some("  pill ".into())), Some("pill".to_string()));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_groups_need_a_positive_order() {
        let request = StepGroupsRequest {
            step_order: 0,
            groups: Vec::new(),
        };
        assert!(request.validate().is_err());
    }
}
