use super::entities::{answer, question};
use super::TxnError;
use crate::domain::{TargetKind, VoteType};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

/// A target that carries vote counters: questions and answers.
pub(crate) trait Votable: EntityTrait {
    const KIND: TargetKind;
    const LABEL: &'static str;

    fn id_column() -> Self::Column;
    fn upvotes_column() -> Self::Column;
    fn downvotes_column() -> Self::Column;

    fn author_of(model: &Self::Model) -> Uuid;
    /// The question whose page shows this target.
    fn question_of(model: &Self::Model) -> Uuid;
    fn tally_of(model: &Self::Model) -> (i32, i32);

    fn counter_column(vote_type: VoteType) -> Self::Column {
        match vote_type {
            VoteType::Upvote => Self::upvotes_column(),
            VoteType::Downvote => Self::downvotes_column(),
        }
    }
}

impl Votable for question::Entity {
    const KIND: TargetKind = TargetKind::Question;
    const LABEL: &'static str = "Question";

    fn id_column() -> Self::Column {
        question::Column::Id
    }

    fn upvotes_column() -> Self::Column {
        question::Column::Upvotes
    }

    fn downvotes_column() -> Self::Column {
        question::Column::Downvotes
    }

    fn author_of(model: &question::Model) -> Uuid {
        model.author_id
    }

    fn question_of(model: &question::Model) -> Uuid {
        model.id
    }

    fn tally_of(model: &question::Model) -> (i32, i32) {
        (model.upvotes, model.downvotes)
    }
}

impl Votable for answer::Entity {
    const KIND: TargetKind = TargetKind::Answer;
    const LABEL: &'static str = "Answer";

    fn id_column() -> Self::Column {
        answer::Column::Id
    }

    fn upvotes_column() -> Self::Column {
        answer::Column::Upvotes
    }

    fn downvotes_column() -> Self::Column {
        answer::Column::Downvotes
    }

    fn author_of(model: &answer::Model) -> Uuid {
        model.author_id
    }

    fn question_of(model: &answer::Model) -> Uuid {
        model.question_id
    }

    fn tally_of(model: &answer::Model) -> (i32, i32) {
        (model.upvotes, model.downvotes)
    }
}

pub(crate) async fn find_target<E, C>(conn: &C, id: Uuid) -> Result<Option<E::Model>, DbErr>
where
    E: Votable,
    C: ConnectionTrait,
{
    E::find().filter(E::id_column().eq(id)).one(conn).await
}

/// Loads the target with `SELECT ... FOR UPDATE`, so writers touching the
/// same target queue behind each other until this transaction ends. SQLite
/// has no row locks and serialises writers on its database lock instead.
pub(crate) async fn lock_target<E, C>(conn: &C, id: Uuid) -> Result<Option<E::Model>, DbErr>
where
    E: Votable,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::id_column().eq(id))
        .lock_exclusive()
        .one(conn)
        .await
}

/// Atomically adds `delta` to the counter for `vote_type` on the target.
/// A decrement only applies while the counter can absorb it.
pub(crate) async fn adjust_counter<E, C>(
    conn: &C,
    id: Uuid,
    vote_type: VoteType,
    delta: i32,
) -> Result<(), TxnError>
where
    E: Votable,
    C: ConnectionTrait,
{
    let column = E::counter_column(vote_type);
    let mut update = E::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(E::id_column().eq(id));
    if delta < 0 {
        update = update.filter(column.gte(-delta));
    }

    if update.exec(conn).await?.rows_affected == 0 {
        return Err(TxnError::Conflict(E::LABEL));
    }
    Ok(())
}
