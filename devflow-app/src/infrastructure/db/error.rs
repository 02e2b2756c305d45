use devflow_errors::AppError;
use sea_orm::{DbErr, SqlErr};

/// Failure inside a transaction body: either the store itself failed, or a
/// domain check (not found, not permitted) aborted the transaction.
#[derive(Debug, thiserror::Error)]
pub(crate) enum TxnError {
    #[error(transparent)]
    Db(#[from] DbErr),

    #[error(transparent)]
    App(#[from] AppError),

    /// A conditional write matched no row: another writer changed it after
    /// this transaction read it.
    #[error("Concurrent write on {0}")]
    Conflict(&'static str),
}

impl TxnError {
    /// Conflicts with a concurrent writer. Replaying the transaction re-reads
    /// the state the other writer committed.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            Self::Db(err) => is_conflict(err),
            Self::App(_) => false,
            Self::Conflict(_) => true,
        }
    }

    pub(crate) fn into_app_error(self) -> AppError {
        match self {
            Self::Db(err) => map_db_err(err),
            Self::App(err) => err,
            Self::Conflict(what) => AppError::Persistence(format!("write conflict on {what}")),
        }
    }
}

pub(crate) fn map_db_err(err: DbErr) -> AppError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        return AppError::Forbidden(format!("Duplicate entry: {detail}"));
    }
    match err {
        DbErr::RecordNotFound(what) => AppError::NotFound(what),
        other => AppError::Persistence(other.to_string()),
    }
}

fn is_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }
    let message = err.to_string().to_lowercase();
    ["could not serialize", "deadlock", "database is locked", "write conflict"]
        .iter()
        .any(|needle| message.contains(needle))
}
