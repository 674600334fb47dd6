use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::routes::paths;
use crate::server::IntakeServer;

/// Main OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health endpoints
        crate::handlers::health::health_check,
        crate::handlers::health::version_info,

        // Builder endpoints
        crate::handlers::builder::builder_page,
        crate::handlers::fields::add_field,
        crate::handlers::fields::update_field,
        crate::handlers::fields::delete_field,
        crate::handlers::labels::update_label,

        // Step endpoints
        crate::handlers::steps::add_step,
        crate::handlers::steps::update_step,
        crate::handlers::steps::delete_step,
        crate::handlers::steps::toggle_step,
        crate::handlers::steps::restore_step,
        crate::handlers::steps::disabled_steps,
        crate::handlers::steps::update_step_groups,

        // Public form and submissions
        crate::handlers::fill::fill_page,
        crate::handlers::fill::submit_form,
        crate::handlers::submissions::list_submissions,
        crate::handlers::submissions::get_submission,
        crate::handlers::submissions::delete_submission,
        crate::handlers::dashboard::dashboard,

        // Maintenance
        crate::handlers::maintenance::reseed_steps,
        crate::handlers::maintenance::normalize_fields,
        crate::handlers::maintenance::diagnostics,
    ),
    components(
        schemas(
            crate::handlers::health::HealthResponse,
            crate::handlers::health::VersionResponse,

            form_engine::Field,
            form_engine::FieldDraft,
            form_engine::FieldOption,
            form_engine::ConditionalLogic,
            form_engine::InputType,
            form_engine::FieldLabels,
            form_engine::Step,
            form_engine::StepGroup,
            form_engine::submission::SubmissionValue,
            form_engine::submission::FixedValue,
            form_engine::stats::DailyCount,

            crate::handlers::builder::BuilderPage,
            crate::handlers::fields::FieldView,
            crate::handlers::fields::FieldResponse,
            crate::handlers::fields::UpdateFieldRequest,
            crate::handlers::fields::DeleteFieldRequest,
            crate::handlers::fields::DeletedFieldResponse,
            crate::handlers::labels::UpdateLabelRequest,
            crate::handlers::labels::LabelResponse,
            crate::handlers::steps::AddStepRequest,
            crate::handlers::steps::UpdateStepRequest,
            crate::handlers::steps::StepIdRequest,
            crate::handlers::steps::ToggleStepRequest,
            crate::handlers::steps::StepGroupsRequest,
            crate::handlers::steps::StepResponse,
            crate::handlers::steps::StepToggleResponse,
            crate::handlers::steps::DisabledStepsResponse,
            crate::handlers::steps::StepGroupsResponse,
            crate::handlers::fill::FillPage,
            crate::handlers::fill::SubmissionCreated,
            crate::handlers::submissions::SubmissionSummary,
            crate::handlers::submissions::SubmissionColumn,
            crate::handlers::submissions::SubmissionList,
            crate::handlers::submissions::SubmissionDetail,
            crate::handlers::submissions::DeletedSubmission,
            crate::handlers::dashboard::Dashboard,
            crate::handlers::maintenance::ReseedResponse,
            crate::handlers::maintenance::NormalizeResponse,
            crate::handlers::maintenance::Diagnostics,
            crate::handlers::maintenance::StepDiagnostics,
            crate::handlers::maintenance::FieldDiagnostics,
            crate::handlers::maintenance::SchemaReport,
            crate::error::ApiErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Service health and build information"),
        (name = "builder", description = "Form builder page model"),
        (name = "fields", description = "Admin-defined fields"),
        (name = "labels", description = "Label overrides for the fixed intake fields"),
        (name = "steps", description = "Step layout, visibility and groups"),
        (name = "form", description = "Public intake form"),
        (name = "submissions", description = "Submission review and statistics"),
        (name = "maintenance", description = "Configuration repair and diagnostics"),
    ),
    info(
        title = "Intake Forms API",
        version = "0.1.0",
        description = "Multi-step public intake form builder: configure steps and fields, collect submissions, review them.",
    )
)]
pub struct ApiDoc;

/// Create OpenAPI documentation routes
pub fn create_docs_routes() -> Router<IntakeServer> {
    Router::new().merge(SwaggerUi::new(paths::docs::SWAGGER_UI).url(paths::docs::OPENAPI_JSON, ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_intake_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/intake/builder"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/intake/submissions/{id}"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
