pub mod paths;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{
    handlers::{builder, dashboard, fields, fill, health, labels, maintenance, steps, submissions},
    openapi,
    server::IntakeServer,
};
use paths::intake;

/// Create health check routes
pub fn health_routes() -> Router<IntakeServer> {
    Router::new()
        .route(paths::health::HEALTH, get(health::health_check))
        .route(paths::health::VERSION, get(health::version_info))
}

/// Builder page, fields and label overrides
pub fn builder_routes() -> Router<IntakeServer> {
    Router::new()
        .route(intake::BUILDER, get(builder::builder_page))
        .route(intake::FIELDS, post(fields::add_field))
        .route(intake::FIELDS_UPDATE, post(fields::update_field))
        .route(intake::FIELDS_DELETE, post(fields::delete_field))
        .route(intake::LABELS, post(labels::update_label))
}

/// Step layout management
pub fn step_routes() -> Router<IntakeServer> {
    Router::new()
        .route(intake::STEPS, post(steps::add_step))
        .route(intake::STEPS_UPDATE, post(steps::update_step))
        .route(intake::STEPS_DELETE, post(steps::delete_step))
        .route(intake::STEPS_TOGGLE, post(steps::toggle_step))
        .route(intake::STEPS_RESTORE, post(steps::restore_step))
        .route(intake::STEPS_DISABLED, get(steps::disabled_steps))
        .route(intake::STEPS_GROUPS, post(steps::update_step_groups))
}

/// Public form plus submission review
pub fn submission_routes() -> Router<IntakeServer> {
    Router::new()
        .route(intake::FORM, get(fill::fill_page).post(fill::submit_form))
        .route(intake::SUBMISSIONS, get(submissions::list_submissions))
        .route(
            intake::SUBMISSION_BY_ID,
            get(submissions::get_submission).delete(submissions::delete_submission),
        )
        .route(intake::DASHBOARD, get(dashboard::dashboard))
}

pub fn maintenance_routes() -> Router<IntakeServer> {
    Router::new()
        .route(intake::MAINTENANCE_RESEED_STEPS, post(maintenance::reseed_steps))
        .route(intake::MAINTENANCE_NORMALIZE_FIELDS, post(maintenance::normalize_fields))
        .route(intake::MAINTENANCE_DIAGNOSTICS, get(maintenance::diagnostics))
}

fn intake_routes() -> Router<IntakeServer> {
    Router::new()
        .merge(builder_routes())
        .merge(step_routes())
        .merge(submission_routes())
        .merge(maintenance_routes())
}

/// API v1 routes
pub fn api_v1_routes() -> Router<IntakeServer> {
    Router::new().nest(intake::INTAKE, intake_routes())
}

/// Create all application routes
pub fn create_routes() -> Router<IntakeServer> {
    Router::new()
        .merge(health_routes())
        .merge(openapi::create_docs_routes())
        .nest(paths::API_V1, api_v1_routes())
}
