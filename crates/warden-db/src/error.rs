//! Database-specific error types and conversions.

use warden_core::error::WardenError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    /// Optimistic transaction lost to a concurrent writer; safe to retry.
    #[error("Transaction conflict: {0}")]
    TransactionConflict(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Email in use")]
    DuplicateEmail,
}

impl DbError {
    /// Classify a SurrealDB error, separating retryable commit conflicts
    /// ("Failed to commit transaction due to a read or write conflict")
    /// from other query failures.
    pub fn from_query(err: surrealdb::Error) -> Self {
        let msg = err.to_string();
        if msg.contains("read or write conflict") || msg.contains("can be retried") {
            Self::TransactionConflict(msg)
        } else {
            Self::Query(msg)
        }
    }
}

impl From<DbError> for WardenError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => WardenError::NotFound { entity, id },
            DbError::DuplicateEmail => WardenError::Conflict {
                message: err.to_string(),
            },
            other => WardenError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err: WardenError = DbError::DuplicateEmail.into();
        assert!(matches!(err, WardenError::Conflict { .. }));
        assert_eq!(err.to_string(), "Email in use");
    }

    #[test]
    fn exhausted_retries_are_internal() {
        let err: WardenError = DbError::TransactionConflict("busy".into()).into();
        assert!(matches!(err, WardenError::Database(_)));
    }
}
