use turnstile_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a sqlx failure onto the application error taxonomy.
///
/// `context` describes the attempted operation, e.g. "create permission".
pub(crate) fn map_sqlx_error(error: sqlx::Error, context: &str) -> AppError {
    if let sqlx::Error::Database(database_error) = &error {
        match database_error.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return AppError::Conflict(format!(
                    "{context} conflicts with an existing row: {}",
                    database_error.message()
                ));
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return AppError::NotFound(format!(
                    "{context} references a missing row: {}",
                    database_error.message()
                ));
            }
            _ => {}
        }
    }

    match error {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            AppError::Transient(format!("failed to {context}: {error}"))
        }
        other => AppError::Internal(format!("failed to {context}: {other}")),
    }
}
