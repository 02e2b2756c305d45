use super::ReputationUpdater;
use crate::domain::{InteractionEvent, RecordOutcome};
use crate::infrastructure::db::{
    run_transaction, InteractionRepository, RetryPolicy, Transactional, TxnError,
};
use devflow_errors::AppError;
use sea_orm::{DatabaseConnection, DatabaseTransaction};

/// Writes the audit row for a committed action and settles its reputation,
/// in a transaction of its own.
#[derive(Clone)]
pub struct InteractionRecorder {
    db: DatabaseConnection,
    retry: RetryPolicy,
}

impl InteractionRecorder {
    pub fn new(db: DatabaseConnection, retry: RetryPolicy) -> Self {
        Self { db, retry }
    }

    pub async fn record(&self, event: InteractionEvent) -> Result<RecordOutcome, AppError> {
        let outcome = run_transaction(&self.db, &self.retry, &RecordInteraction { event }).await?;
        match outcome {
            RecordOutcome::Recorded => tracing::info!(
                event_id = %event.event_id,
                action = %event.action,
                target = %event.target_kind,
                action_id = %event.action_id,
                "Interaction recorded"
            ),
            RecordOutcome::AlreadyRecorded => tracing::warn!(
                event_id = %event.event_id,
                "Interaction already recorded, skipping"
            ),
        }
        Ok(outcome)
    }
}

struct RecordInteraction {
    event: InteractionEvent,
}

impl Transactional for RecordInteraction {
    type Output = RecordOutcome;

    fn name(&self) -> &'static str {
        "record_interaction"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<RecordOutcome, TxnError> {
        let event = &self.event;
        if InteractionRepository::exists(txn, event.event_id).await? {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        InteractionRepository::create(txn, event).await?;
        ReputationUpdater::apply(
            txn,
            event.action,
            event.target_kind,
            event.performer_id,
            event.author_id,
        )
        .await?;

        Ok(RecordOutcome::Recorded)
    }
}
