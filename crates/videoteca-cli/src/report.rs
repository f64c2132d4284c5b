//! Error reporting for the `videoteca` binary
//!
//! Repository failures are printed as a JSON object on stderr and logged at
//! the level their [`ErrorMetadata`] asks for. Anything that is not an
//! [`AppError`] is left to `anyhow`'s default rendering.

use serde::Serialize;
use videoteca_core::{AppError, ErrorMetadata, LogLevel};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorReport {
    pub error: &'static str,
    pub kind: &'static str,
    pub message: String,
    pub status: u16,
    pub recoverable: bool,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            error: err.error_code(),
            kind: err.kind(),
            message: err.client_message(),
            status: err.http_status_code(),
            recoverable: err.is_recoverable(),
        }
    }
}

/// Log `err` at its own level and build the report printed to the user
pub fn report_app_error(err: &AppError) -> ErrorReport {
    let report = ErrorReport::from(err);
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(kind = report.kind, error = %err, "Command rejected"),
        LogLevel::Warn => tracing::warn!(kind = report.kind, error = %err, "Command rejected"),
        LogLevel::Error => {
            tracing::error!(kind = report.kind, error = %err.detailed_message(), "Command failed")
        }
    }
    report
}

/// The `AppError` behind an `anyhow` chain, if there is one
pub fn find_app_error(err: &anyhow::Error) -> Option<&AppError> {
    err.chain().find_map(|cause| cause.downcast_ref::<AppError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_conflict_report_keeps_message() {
        let err = AppError::Conflict("Tag with this name already exists".to_string());
        let report = report_app_error(&err);
        assert_eq!(
            report,
            ErrorReport {
                error: "CONFLICT",
                kind: "Conflict",
                message: "Tag with this name already exists".to_string(),
                status: 409,
                recoverable: false,
            }
        );
    }

    #[test]
    fn test_storage_report_hides_details() {
        let err = AppError::Storage("disk /srv/media is full".to_string());
        let report = report_app_error(&err);
        assert_eq!(report.error, "STORAGE_ERROR");
        assert_eq!(report.message, "Failed to access storage");
        assert!(report.recoverable);
    }

    #[test]
    fn test_find_app_error_through_context() {
        let result: Result<(), AppError> = Err(AppError::NotFound("Video not found".to_string()));
        let err = result.context("Failed to load video").unwrap_err();
        let found = find_app_error(&err).expect("app error in chain");
        assert!(matches!(found, AppError::NotFound(_)));

        let plain = anyhow::anyhow!("Nothing to update");
        assert!(find_app_error(&plain).is_none());
    }
}
