mod accounts;
mod answer_lifecycle;
mod collection_toggle;
mod interaction_recorder;
mod interaction_worker;
mod question_lifecycle;
mod reputation_updater;
mod vote_engine;

pub use accounts::Accounts;
pub use answer_lifecycle::AnswerLifecycle;
pub use collection_toggle::CollectionToggle;
pub use interaction_recorder::InteractionRecorder;
pub use interaction_worker::{InteractionScheduler, InteractionWorker};
pub use question_lifecycle::QuestionLifecycle;
pub use reputation_updater::ReputationUpdater;
pub use vote_engine::VoteEngine;

use crate::domain::InteractionEvent;
use crate::infrastructure::cache::Revalidator;
use crate::infrastructure::db::{run_transaction, RetryPolicy, Transactional};
use devflow_errors::AppError;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

/// What every mutating service needs: the store, how to retry against it,
/// and where to send post-commit work.
#[derive(Clone)]
pub(crate) struct Ledger {
    pub db: DatabaseConnection,
    pub retry: RetryPolicy,
    pub interactions: InteractionScheduler,
    pub revalidator: Arc<dyn Revalidator>,
}

impl Ledger {
    pub async fn transact<T>(&self, op: &T) -> Result<T::Output, AppError>
    where
        T: Transactional + Sync,
    {
        run_transaction(&self.db, &self.retry, op).await
    }

    /// Post-commit side effects. Only call once the primary transaction has
    /// committed.
    pub fn after_commit(&self, event: Option<InteractionEvent>, stale_routes: &[String]) {
        if let Some(event) = event {
            self.interactions.schedule(event);
        }
        for route in stale_routes {
            self.revalidator.revalidate(route);
        }
    }
}

pub(crate) fn require_actor(actor: Option<Uuid>) -> Result<Uuid, AppError> {
    actor.ok_or(AppError::Unauthorized)
}
