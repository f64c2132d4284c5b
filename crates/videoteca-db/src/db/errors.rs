//! Translation of driver errors into `AppError`
//!
//! Uniqueness violations become `Conflict`. Foreign-key violations become
//! `Protected` when a delete is blocked by a referencing row and
//! `InvalidReference` when an insert or update points at a missing row.

use sqlx::error::ErrorKind;
use videoteca_core::AppError;

/// Statement kind, needed to tell a blocked delete from a dangling reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DbOperation {
    Insert,
    Update,
    Delete,
}

pub(crate) fn classify(err: sqlx::Error, entity: &str, operation: DbOperation) -> AppError {
    let db_err = match err {
        sqlx::Error::RowNotFound => return AppError::NotFound(format!("{} not found", entity)),
        sqlx::Error::Database(db_err) => db_err,
        other => return AppError::Database(other),
    };

    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
    match db_err.kind() {
        ErrorKind::UniqueViolation => {
            tracing::debug!(entity, constraint = %constraint, "Unique constraint violated");
            AppError::Conflict(format!(
                "{} with this {} already exists",
                entity,
                unique_field(&constraint)
            ))
        }
        ErrorKind::ForeignKeyViolation if operation == DbOperation::Delete => {
            tracing::debug!(entity, constraint = %constraint, "Delete blocked by reference");
            AppError::Protected(format!(
                "{} is referenced by other records ({}) and cannot be deleted",
                entity, constraint
            ))
        }
        ErrorKind::ForeignKeyViolation => AppError::InvalidReference(format!(
            "{} references a record that does not exist ({})",
            entity, constraint
        )),
        ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
            AppError::Validation(format!("{} violates constraint {}", entity, constraint))
        }
        _ => AppError::Database(sqlx::Error::Database(db_err)),
    }
}

/// Column name from a default PostgreSQL unique constraint name (`{table}_{column}_key`)
fn unique_field(constraint: &str) -> &str {
    constraint
        .strip_suffix("_key")
        .and_then(|rest| {
            ["users_", "tags_", "videos_", "video_media_"]
                .iter()
                .find_map(|table| rest.strip_prefix(table))
        })
        .unwrap_or(constraint)
}

pub(crate) trait ResultExt<T> {
    fn map_db_err(self, entity: &str, operation: DbOperation) -> Result<T, AppError>;
}

impl<T> ResultExt<T> for Result<T, sqlx::Error> {
    fn map_db_err(self, entity: &str, operation: DbOperation) -> Result<T, AppError> {
        self.map_err(|e| classify(e, entity, operation))
    }
}
