use thiserror::Error;

/// Errors that can stop the intake server process
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Bad or missing configuration (CLI, file or environment)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Connecting to or migrating the database failed
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Binding or serving HTTP failed
    #[error("Server error: {0}")]
    ServerError(String),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    LoggingError(String),

    /// Wrapped external errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntakeError {
    /// Short machine-readable category, used as a log field
    pub fn kind(&self) -> &'static str {
        match self {
            IntakeError::ConfigError(_) => "config",
            IntakeError::DatabaseError(_) => "database",
            IntakeError::ServerError(_) => "server",
            IntakeError::LoggingError(_) => "logging",
            IntakeError::Other(_) => "other",
        }
    }
}

/// Result type alias for process bootstrap
pub type Result<T> = std::result::Result<T, IntakeError>;

/// Logs an error with its category before the process gives up on it
pub fn log_error(context: &str, error: &IntakeError) {
    tracing::error!(
        context = context,
        kind = error.kind(),
        error = %error,
        "Intake server error occurred"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_display() {
        let err = IntakeError::ConfigError("port is not a number".to_string());
        assert_eq!(err.kind(), "config");
        assert_eq!(err.to_string(), "Configuration error: port is not a number");
    }

    #[test]
    fn test_anyhow_is_transparent() {
        let err: IntakeError = anyhow::anyhow!("boom").into();
        assert_eq!(err.kind(), "other");
        assert_eq!(err.to_string(), "boom");
    }
}
