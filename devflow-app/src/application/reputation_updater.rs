use crate::domain::{InteractionAction, ReputationPlan, TargetKind};
use crate::infrastructure::db::UserRepository;
use sea_orm::{ConnectionTrait, DbErr};
use uuid::Uuid;

pub struct ReputationUpdater;

impl ReputationUpdater {
    /// Applies the point table for one interaction on `conn`.
    ///
    /// Both users' updates go through the same connection, so inside a
    /// transaction neither is applied without the other.
    pub(crate) async fn apply<C: ConnectionTrait>(
        conn: &C,
        action: InteractionAction,
        target_kind: TargetKind,
        performer_id: Uuid,
        author_id: Uuid,
    ) -> Result<ReputationPlan, DbErr> {
        let plan = ReputationPlan::for_interaction(action, target_kind, performer_id, author_id);

        match plan {
            ReputationPlan::SelfAction { user, delta } => {
                Self::adjust(conn, user, delta).await?;
            }
            ReputationPlan::Split {
                performer,
                performer_delta,
                author,
                author_delta,
            } => {
                Self::adjust(conn, performer, performer_delta).await?;
                Self::adjust(conn, author, author_delta).await?;
            }
        }

        Ok(plan)
    }

    async fn adjust<C: ConnectionTrait>(conn: &C, user_id: Uuid, delta: i64) -> Result<(), DbErr> {
        if delta == 0 {
            return Ok(());
        }
        if !UserRepository::adjust_reputation(conn, user_id, delta).await? {
            tracing::warn!(%user_id, delta, "Reputation change skipped, user does not exist");
        }
        Ok(())
    }
}
