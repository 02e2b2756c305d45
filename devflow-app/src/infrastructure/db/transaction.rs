use super::TxnError;
use devflow_errors::AppError;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::future::Future;
use std::time::Duration;

const MAX_BACKOFF: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `attempt` (1-based), doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(25))
    }
}

/// One unit of work that must commit or roll back as a whole.
pub(crate) trait Transactional {
    type Output: Send;

    fn name(&self) -> &'static str;

    fn run(
        &self,
        txn: &DatabaseTransaction,
    ) -> impl Future<Output = Result<Self::Output, TxnError>> + Send;
}

/// Runs `op` in a fresh transaction, replaying it on write conflicts.
///
/// Any failure rolls back everything `op` wrote in that attempt.
pub(crate) async fn run_transaction<T>(
    db: &DatabaseConnection,
    retry: &RetryPolicy,
    op: &T,
) -> Result<T::Output, AppError>
where
    T: Transactional + Sync,
{
    let mut attempt = 0;
    loop {
        let err = match attempt_once(db, op).await {
            Ok(output) => return Ok(output),
            Err(err) => err,
        };

        if err.is_retryable() && attempt < retry.max_retries {
            attempt += 1;
            let delay = retry.backoff(attempt);
            tracing::debug!(
                operation = op.name(),
                attempt,
                ?delay,
                error = %err,
                "Transaction conflict, retrying"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        if let TxnError::Db(db_err) = &err {
            tracing::warn!(operation = op.name(), error = %db_err, "Transaction failed");
        }
        return Err(err.into_app_error());
    }
}

async fn attempt_once<T>(db: &DatabaseConnection, op: &T) -> Result<T::Output, TxnError>
where
    T: Transactional + Sync,
{
    let txn = db.begin().await?;
    match op.run(&txn).await {
        Ok(output) => {
            txn.commit().await?;
            Ok(output)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::warn!(
                    operation = op.name(),
                    error = %rollback_err,
                    "Rollback failed"
                );
            }
            Err(err)
        }
    }
}
