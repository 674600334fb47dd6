use thiserror::Error;
use uuid::Uuid;

/// Domain-rule violations raised by schema, layout and registry operations.
///
/// Malformed JSON on the lenient read paths never produces one of these; it is
/// recovered locally as an empty collection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("A field with this name already exists")]
    DuplicateFieldName { field_name: String },

    #[error("Field not found")]
    FieldNotFound { field_id: Uuid },

    #[error("Step not found")]
    StepNotFound,

    #[error("Cannot disable the last active step. At least one step must remain active.")]
    LastActiveStep,

    #[error("Field key not found")]
    LabelKeyNotFound { key: String },

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Malformed form schema: {0}")]
    MalformedDocument(String),

    #[error("Unsupported schema version {found} (newest known is {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },
}

impl FormError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Whether the error refers to something that does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FormError::FieldNotFound { .. } | FormError::StepNotFound | FormError::LabelKeyNotFound { .. }
        )
    }
}

pub type FormResult<T> = Result<T, FormError>;
