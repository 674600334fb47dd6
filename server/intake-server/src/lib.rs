//! Intake Server - HTTP API for the multi-step intake form builder
//!
//! Administrators arrange steps, fields and labels through the builder
//! endpoints; the public form endpoints render the active configuration and
//! store submissions, which are then reviewed through list, detail and
//! dashboard views.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{ServerConfig, StorageBackend};
pub use error::*;
pub use server::IntakeServer;

use axum::{middleware::from_fn, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the main application router with all routes and middleware
pub fn create_app(server: IntakeServer) -> Router {
    let cors = middleware::create_cors_layer(&server.config.cors_origins);

    routes::create_routes()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(middleware::request_timing_middleware)),
        )
        .with_state(server)
}
