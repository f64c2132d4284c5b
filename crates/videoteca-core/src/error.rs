//! Error types module
//!
//! All failures of the data layer are unified under [`AppError`]: field and
//! publishing validation, integrity violations reported by PostgreSQL
//! (uniqueness, protect-on-delete), missing rows, configuration and storage.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for integrity conflicts the caller can resolve
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented by the view layer
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Protected: {0}")]
    Protected(String),

    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        let messages: Vec<String> = fields
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", field, message)
                })
            })
            .collect();

        AppError::Validation(messages.join("; "))
    }
}

impl AppError {
    /// Short variant name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Validation(_) => "Validation",
            AppError::Conflict(_) => "Conflict",
            AppError::Protected(_) => "Protected",
            AppError::InvalidReference(_) => "InvalidReference",
            AppError::NotFound(_) => "NotFound",
            AppError::Config(_) => "Config",
            AppError::Storage(_) => "Storage",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, LogLevel::Error),
        AppError::Validation(_) => (400, "VALIDATION_ERROR", false, LogLevel::Debug),
        AppError::Conflict(_) => (409, "CONFLICT", false, LogLevel::Warn),
        AppError::Protected(_) => (409, "PROTECTED", false, LogLevel::Warn),
        AppError::InvalidReference(_) => (400, "INVALID_REFERENCE", false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, LogLevel::Debug),
        AppError::Config(_) => (500, "CONFIGURATION_ERROR", false, LogLevel::Error),
        AppError::Storage(_) => (500, "STORAGE_ERROR", true, LogLevel::Error),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, LogLevel::Error)
        }
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Config(_) => "Service misconfigured".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::Validation(msg)
            | AppError::Conflict(msg)
            | AppError::Protected(msg)
            | AppError::InvalidReference(msg)
            | AppError::NotFound(msg) => msg.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_error_metadata_database() {
        #[cfg(feature = "sqlx")]
        let err = AppError::from(sqlx::Error::PoolClosed);
        #[cfg(not(feature = "sqlx"))]
        let err = AppError::Database("pool closed".to_string());
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_conflict_and_protected() {
        let conflict = AppError::Conflict("tag with this name already exists".to_string());
        assert_eq!(conflict.http_status_code(), 409);
        assert_eq!(conflict.error_code(), "CONFLICT");
        assert_eq!(conflict.log_level(), LogLevel::Warn);

        let protected = AppError::Protected("user is referenced by videos".to_string());
        assert_eq!(protected.http_status_code(), 409);
        assert_eq!(protected.error_code(), "PROTECTED");
        assert_eq!(protected.client_message(), "user is referenced by videos");
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Tag not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Tag not found");
        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn test_validation_errors_are_flattened_by_field() {
        let mut errors = ValidationErrors::new();
        errors.add(
            "title",
            ValidationError::new("special_characters").with_message("bad title".into()),
        );
        errors.add("name", ValidationError::new("length"));

        let err = AppError::from(errors);
        match err {
            AppError::Validation(msg) => assert_eq!(msg, "name: length; title: bad title"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_detailed_message_includes_source() {
        let err = AppError::from(anyhow::anyhow!("disk full"));
        assert!(err.detailed_message().contains("disk full"));
        assert_eq!(err.http_status_code(), 500);
    }
}
