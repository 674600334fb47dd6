//! Route path constants
//!
//! utoipa `#[utoipa::path(...)]` attributes need string literals, so the
//! paths written there must match the full paths built from these constants.

/// API base path
pub const API_V1: &str = "/api/v1";

/// Health check endpoints, served outside the versioned API
pub mod health {
    pub const HEALTH: &str = "/health";
    pub const VERSION: &str = "/version";
}

/// Intake form endpoints, nested under `INTAKE`
pub mod intake {
    pub const INTAKE: &str = "/intake";

    pub const BUILDER: &str = "/builder";
    pub const FORM: &str = "/form";

    pub const FIELDS: &str = "/fields";
    pub const FIELDS_UPDATE: &str = "/fields/update";
    pub const FIELDS_DELETE: &str = "/fields/delete";

    pub const LABELS: &str = "/labels";

    pub const STEPS: &str = "/steps";
    pub const STEPS_UPDATE: &str = "/steps/update";
    pub const STEPS_DELETE: &str = "/steps/delete";
    pub const STEPS_TOGGLE: &str = "/steps/toggle";
    pub const STEPS_RESTORE: &str = "/steps/restore";
    pub const STEPS_DISABLED: &str = "/steps/disabled";
    pub const STEPS_GROUPS: &str = "/steps/groups";

    pub const SUBMISSIONS: &str = "/submissions";
    pub const SUBMISSION_BY_ID: &str = "/submissions/:id";
    pub const DASHBOARD: &str = "/dashboard";

    pub const MAINTENANCE_RESEED_STEPS: &str = "/maintenance/reseed-steps";
    pub const MAINTENANCE_NORMALIZE_FIELDS: &str = "/maintenance/normalize-fields";
    pub const MAINTENANCE_DIAGNOSTICS: &str = "/maintenance/diagnostics";
}

/// Swagger UI and the generated document
pub mod docs {
    pub const SWAGGER_UI: &str = "/swagger-ui";
    pub const OPENAPI_JSON: &str = "/api-docs/openapi.json";
}
