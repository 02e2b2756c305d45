use super::entities::{vote, Vote};
use crate::domain::{TargetKind, VoteType};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

pub(crate) struct VoteRepository;

impl VoteRepository {
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        action_id: Uuid,
        action_type: TargetKind,
    ) -> Result<Option<vote::Model>, DbErr> {
        Vote::find()
            .filter(vote::Column::AuthorId.eq(author_id))
            .filter(vote::Column::ActionId.eq(action_id))
            .filter(vote::Column::ActionType.eq(action_type))
            .one(conn)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        action_id: Uuid,
        action_type: TargetKind,
        vote_type: VoteType,
    ) -> Result<vote::Model, DbErr> {
        let now = chrono::Utc::now();
        let active = vote::ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            action_id: Set(action_id),
            action_type: Set(action_type),
            vote_type: Set(vote_type),
            created_at: Set(now),
            updated_at: Set(now),
        };
        active.insert(conn).await
    }

    /// Switches the vote only if it still has the type the caller read.
    /// Returns whether a row changed.
    pub async fn change_type<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        previous: VoteType,
        vote_type: VoteType,
    ) -> Result<bool, DbErr> {
        let result = Vote::update_many()
            .col_expr(vote::Column::VoteType, Expr::value(vote_type))
            .col_expr(vote::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
            .filter(vote::Column::Id.eq(id))
            .filter(vote::Column::VoteType.eq(previous))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Deletes the vote only if it still has the type the caller read.
    /// Returns whether a row was removed.
    pub async fn delete<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        vote_type: VoteType,
    ) -> Result<bool, DbErr> {
        let result = Vote::delete_many()
            .filter(vote::Column::Id.eq(id))
            .filter(vote::Column::VoteType.eq(vote_type))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Removes every vote cast on the given targets.
    pub async fn delete_for_targets<C: ConnectionTrait>(
        conn: &C,
        action_ids: Vec<Uuid>,
        action_type: TargetKind,
    ) -> Result<u64, DbErr> {
        if action_ids.is_empty() {
            return Ok(0);
        }
        let result = Vote::delete_many()
            .filter(vote::Column::ActionId.is_in(action_ids))
            .filter(vote::Column::ActionType.eq(action_type))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    #[cfg(test)]
    pub async fn count_for_target<C: ConnectionTrait>(
        conn: &C,
        action_id: Uuid,
        action_type: TargetKind,
    ) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Vote::find()
            .filter(vote::Column::ActionId.eq(action_id))
            .filter(vote::Column::ActionType.eq(action_type))
            .count(conn)
            .await
    }
}
