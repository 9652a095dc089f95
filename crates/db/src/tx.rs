//! Transactional execution with bounded retry.
//!
//! Every mutating operation runs through [`with_retry`]: a single logical
//! change inside one transaction, re-run a small fixed number of times when
//! the database reports a transient conflict. On exhaustion the caller gets
//! a database error that the API layer collapses to a generic retryable
//! message, never partial state.

use std::future::Future;
use std::pin::Pin;

use hearth_common::{AppError, AppResult};
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionError, TransactionTrait};

/// Maximum attempts for a single logical change.
pub const MAX_ATTEMPTS: u32 = 3;

/// Returns whether a connection-level error is worth retrying.
#[must_use]
pub fn is_transient(err: &DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("serialization")
        || msg.contains("could not serialize")
        || msg.contains("deadlock")
}

/// Returns whether an error is a unique-constraint violation.
///
/// The unique index is the authoritative uniqueness check for slugs and
/// heart rows; a violation means a concurrent writer won the race and the
/// operation should re-run against the new state.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    let msg = err.to_string().to_lowercase();
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

/// Run `op` inside a transaction, retrying up to [`MAX_ATTEMPTS`] times on
/// transient conflicts.
///
/// The closure is re-invoked from scratch on every attempt, so any
/// generated values (slugs, IDs) must be produced inside it.
pub async fn with_retry<T, F>(db: &DatabaseConnection, op: F) -> AppResult<T>
where
    T: Send,
    F: for<'c> Fn(
            &'c DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'c>>
        + Send
        + Sync,
{
    let mut attempt: u32 = 1;
    loop {
        match db.transaction::<_, T, AppError>(|txn| op(txn)).await {
            Ok(value) => return Ok(value),
            Err(TransactionError::Connection(e)) => {
                if attempt < MAX_ATTEMPTS && is_transient(&e) {
                    tracing::warn!(attempt, error = %e, "Transient transaction failure, retrying");
                } else {
                    return Err(AppError::Database(e.to_string()));
                }
            }
            Err(TransactionError::Transaction(e)) => {
                if attempt < MAX_ATTEMPTS && e.is_retryable() {
                    tracing::warn!(attempt, error = %e, "Retryable conflict, re-running transaction");
                } else {
                    return Err(e);
                }
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(msg: &str) -> DbErr {
        DbErr::Custom(msg.to_string())
    }

    #[test]
    fn test_transient_detection() {
        assert!(is_transient(&custom("could not serialize access")));
        assert!(is_transient(&custom("deadlock detected")));
        assert!(!is_transient(&custom("syntax error at or near")));
    }

    #[test]
    fn test_unique_violation_detection() {
        assert!(is_unique_violation(&custom(
            "duplicate key value violates unique constraint \"idx_post_slug\""
        )));
        assert!(is_unique_violation(&custom("UNIQUE constraint failed: post.slug")));
        assert!(!is_unique_violation(&custom("connection refused")));
    }
}
