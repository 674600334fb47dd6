//! Public form endpoints.
//!
//! The public form shows active steps only. Fields attached to a disabled
//! step are neither rendered nor demanded.

use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::Json,
};
use database_layer::IntakeFormRecord;
use form_engine::schema;
use form_engine::submission::{self, PostedForm};
use form_engine::{Field, FieldLabels, Step};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{api_success, ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::handlers::fields::FieldView;
use crate::server::IntakeServer;
use crate::services::FormConfig;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FillPage {
    pub form_version: i32,
    /// Active steps by order, each with at least one group
    pub steps: Vec<Step>,
    pub fields: Vec<FieldView>,
    pub labels: FieldLabels,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreated {
    pub submission_id: Uuid,
    pub form_version: i32,
}

/// Live fields whose step is currently shown
fn fields_on_active_steps<'a>(config: &'a FormConfig, steps: &[Step]) -> Vec<&'a Field> {
    config
        .fields
        .active_fields()
        .into_iter()
        .filter(|f| steps.iter().any(|s| s.order == f.step))
        .collect()
}

/// Public fill page model. Steps saved before grouping existed get their
/// default group here, which counts as a configuration change.
#[utoipa::path(
    get,
    path = "/api/v1/intake/form",
    responses(
        (status = 200, description = "Form to fill out", body = FillPage)
    ),
    tag = "form"
)]
pub async fn fill_page(State(server): State<IntakeServer>) -> ApiResult<Json<ApiResponse<FillPage>>> {
    let mut config = server.forms.current().await?;

    let (_, needs_groups) = schema::ensure_default_groups_seeded(Some(config.schema_json()));
    if needs_groups {
        let mutation = server
            .forms
            .mutate(|config| {
                let (json, _) = schema::ensure_default_groups_seeded(Some(config.schema_json()));
                config.set_schema_json(json);
                Ok(())
            })
            .await?;
        info!(form_version = mutation.form_version, "Default step groups seeded");
        config = server.forms.current().await?;
    }

    let steps = config.active_steps();
    let fields = fields_on_active_steps(&config, &steps)
        .into_iter()
        .map(FieldView::from)
        .collect();

    Ok(Json(api_success(FillPage {
        form_version: config.form_version,
        steps,
        fields,
        labels: config.labels.clone(),
    })))
}

/// Store a filled-out form.
///
/// Values are keyed by field name. Fields on disabled steps are ignored.
/// Required fields are only enforced when `enforce_required_fields` is on,
/// and then only for visible fields.
#[utoipa::path(
    post,
    path = "/api/v1/intake/form",
    request_body(content = HashMap<String, String>, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 201, description = "Submission stored", body = SubmissionCreated),
        (status = 400, description = "Required fields missing", body = ApiErrorResponse)
    ),
    tag = "form"
)]
pub async fn submit_form(
    State(server): State<IntakeServer>,
    payload: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> ApiResult<(StatusCode, Json<ApiResponse<SubmissionCreated>>)> {
    let Form(pairs) = payload?;
    let posted: PostedForm = pairs.into_iter().collect();
    let config = server.forms.current().await?;

    let steps = config.active_steps();
    let shown = fields_on_active_steps(&config, &steps);

    let mut data = submission::map_fixed_values(&config.labels, &posted);
    data.extend(submission::map_posted_values(&shown, &posted));

    if server.config.enforce_required_fields {
        let missing = submission::missing_required(&shown, &data, &posted);
        if !missing.is_empty() {
            let field_errors: HashMap<String, Vec<String>> = missing
                .iter()
                .map(|name| (name.clone(), vec!["This field is required".to_string()]))
                .collect();
            return Err(ApiError::validation_with_fields(
                format!("Please complete the required fields: {}", missing.join(", ")),
                field_errors,
            ));
        }
    }

    let data_json = serde_json::to_string(&data).map_err(|e| ApiError::internal(e.to_string()))?;
    let record = IntakeFormRecord::new_submission(data_json, config.form_version, server.clock.now());
    server.store.insert(&record).await?;

    info!(
        submission_id = %record.id,
        form_version = config.form_version,
        value_count = data.len(),
        values = ?server.redactor.redact_submission(&data),
        "Form submitted"
    );

    let response = SubmissionCreated {
        submission_id: record.id,
        form_version: config.form_version,
    };
    Ok((
        StatusCode::CREATED,
        Json(api_success(response).with_message("Form submitted successfully!")),
    ))
}
