use axum::{
    extract::rejection::{FormRejection, JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use database_layer::DatabaseError;
use form_engine::FormError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;
use uuid::Uuid;

/// Message returned for every 5xx. The real cause is only logged.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Standard API error response structure
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    /// Always false, mirrors the success envelope
    pub success: bool,
    /// Human-readable error message
    pub message: String,
    /// Unique error ID, also present in the server log
    pub error_id: String,
    /// Error type/code
    pub error_type: String,
    /// Timestamp when error occurred
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<HashMap<String, Vec<String>>>,
    /// Suggested actions for resolving the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<String>>,
}

/// Standard API success response wrapper.
///
/// The payload is flattened next to `success` and `message`, so a field
/// echo serializes as `{"success":true,"message":"...","field":{...}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl<T> ApiResponse<T> {
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Response metadata for pagination
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Empty payload for responses that only carry `success` and `message`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NoContent {}

/// Main API error enum
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Unprocessable entity: {message}")]
    UnprocessableEntity { message: String },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    /// Create a validation error with field-specific errors
    pub fn validation_with_fields(
        message: impl Into<String>,
        field_errors: HashMap<String, Vec<String>>,
    ) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }

    /// Create a simple validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(DatabaseError::RecordNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Conflict { .. } => "conflict",
            ApiError::BadRequest { .. } => "bad_request",
            ApiError::UnprocessableEntity { .. } => "unprocessable_entity",
            ApiError::Database(_) => "database_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    /// Message safe to show to the caller
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Validation { message, .. }
            | ApiError::NotFound { message }
            | ApiError::Conflict { message }
            | ApiError::BadRequest { message }
            | ApiError::UnprocessableEntity { message } => message.clone(),
            ApiError::Database(DatabaseError::RecordNotFound(_)) => "Record not found".to_string(),
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => {
                "The database is unavailable. Please try again shortly.".to_string()
            }
            ApiError::Database(_) | ApiError::Internal { .. } => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Get suggested actions for resolving the error
    pub fn suggestions(&self) -> Option<Vec<String>> {
        match self {
            ApiError::Validation { .. } => Some(vec![
                "Check the request payload for missing or blank values".to_string(),
                "Ensure all required fields are provided".to_string(),
            ]),
            ApiError::NotFound { .. } => Some(vec![
                "Verify the id is correct".to_string(),
                "Reload the builder, the item may have been removed".to_string(),
            ]),
            ApiError::Conflict { .. } => Some(vec![
                "Choose a different label or restore the existing item".to_string(),
            ]),
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => Some(vec![
                "Try again in a few moments".to_string(),
                "Contact support if the issue persists".to_string(),
            ]),
            _ => None,
        }
    }

    fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        // Log the error with correlation ID
        if self.is_server_error() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let field_errors = match &self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            _ => None,
        };

        let error_response = ApiErrorResponse {
            success: false,
            message: self.public_message(),
            error_id,
            error_type: self.error_type().to_string(),
            timestamp: chrono::Utc::now(),
            field_errors,
            suggestions: self.suggestions(),
        };

        (status_code, Json(error_response)).into_response()
    }
}

/// Domain rule violations from the form engine
impl From<FormError> for ApiError {
    fn from(error: FormError) -> Self {
        let message = error.to_string();
        match error {
            FormError::DuplicateFieldName { .. } | FormError::LastActiveStep => ApiError::conflict(message),
            FormError::FieldNotFound { .. } | FormError::StepNotFound | FormError::LabelKeyNotFound { .. } => {
                ApiError::not_found(message)
            }
            FormError::InvalidRequest(_) => ApiError::validation(message),
            FormError::MalformedDocument(_) | FormError::UnsupportedSchemaVersion { .. } => {
                ApiError::UnprocessableEntity { message }
            }
        }
    }
}

/// Unreadable request bodies get the same envelope as every other failure
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

/// Convert anyhow errors to API errors
impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        ApiError::Internal {
            message: error.to_string(),
        }
    }
}

/// Helper function to create successful API responses
pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        message: None,
        data,
        metadata: None,
    }
}

/// Success with only a message
pub fn api_message(message: impl Into<String>) -> ApiResponse<NoContent> {
    api_success(NoContent::default()).with_message(message)
}

/// Helper function to create successful API responses with metadata
pub fn api_success_with_meta<T>(data: T, metadata: ResponseMetadata) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        message: None,
        data,
        metadata: Some(metadata),
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_errors_map_to_status_codes() {
        let cases = [
            (FormError::DuplicateFieldName { field_name: "additional_x".into() }, StatusCode::CONFLICT),
            (FormError::LastActiveStep, StatusCode::CONFLICT),
            (FormError::StepNotFound, StatusCode::NOT_FOUND),
            (FormError::FieldNotFound { field_id: Uuid::nil() }, StatusCode::NOT_FOUND),
            (FormError::invalid("Step name is required"), StatusCode::BAD_REQUEST),
            (FormError::MalformedDocument("steps".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (form_error, status) in cases {
            assert_eq!(ApiError::from(form_error).status_code(), status);
        }
    }

    #[test]
    fn test_domain_message_is_returned_verbatim() {
        let err = ApiError::from(FormError::StepNotFound);
        assert_eq!(err.public_message(), "Step not found");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Database(DatabaseError::QueryFailed("relation intake_forms does not exist".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_success_envelope_flattens_payload() {
        #[derive(Serialize)]
        struct Echo {
            step: i32,
        }
        let body = serde_json::to_value(api_success(Echo { step: 2 }).with_message("ok")).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "message": "ok", "step": 2}));
    }
}
