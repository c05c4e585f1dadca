//! Store-level errors that abort a whole batch.
//!
//! Per-record problems never surface here; they are recorded in
//! [`crate::loader::LoadReport`].

/// PostgreSQL SQLSTATE for unique constraint violations.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Network, TLS, authentication, or pool exhaustion.
    #[error("Database connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    /// Anything else that makes continuing the batch pointless.
    #[error("Fatal store error: {0}")]
    Fatal(#[source] sqlx::Error),

    #[error("Schema setup failed: {0}")]
    Schema(#[from] sqlx::migrate::MigrateError),
}

impl StoreError {
    /// Wrap a sqlx error as either a connection or a fatal store error.
    pub fn classify(err: sqlx::Error) -> Self {
        if is_connection_error(&err) {
            StoreError::Connection(err)
        } else {
            StoreError::Fatal(err)
        }
    }
}

/// Whether an error means the connection itself is unusable.
///
/// Covers transport failures, pool exhaustion, and the SQLSTATE classes
/// `08` (connection exception), `28` (invalid authorization), and `57P`
/// (operator intervention, e.g. server shutdown).
pub fn is_connection_error(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::Protocol(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| {
            code.starts_with("08") || code.starts_with("28") || code.starts_with("57P")
        }),
        _ => false,
    }
}

/// Whether an error is a unique constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_failures_are_connection_errors() {
        assert!(is_connection_error(&sqlx::Error::PoolTimedOut));
        assert!(is_connection_error(&sqlx::Error::PoolClosed));
        assert!(matches!(
            StoreError::classify(sqlx::Error::PoolTimedOut),
            StoreError::Connection(_)
        ));
    }

    #[test]
    fn row_not_found_is_fatal_not_connection() {
        assert!(!is_connection_error(&sqlx::Error::RowNotFound));
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
        assert!(matches!(
            StoreError::classify(sqlx::Error::RowNotFound),
            StoreError::Fatal(_)
        ));
    }
}
