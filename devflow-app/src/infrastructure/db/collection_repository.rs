use super::entities::{collection, Collection};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

pub(crate) struct CollectionRepository;

impl CollectionRepository {
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        question_id: Uuid,
    ) -> Result<Option<collection::Model>, DbErr> {
        Collection::find()
            .filter(collection::Column::AuthorId.eq(author_id))
            .filter(collection::Column::QuestionId.eq(question_id))
            .one(conn)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        question_id: Uuid,
    ) -> Result<collection::Model, DbErr> {
        let active = collection::ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            question_id: Set(question_id),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    /// Returns whether a row was removed.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let result = Collection::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = Collection::delete_many()
            .filter(collection::Column::QuestionId.eq(question_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    #[cfg(test)]
    pub async fn count_for<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        question_id: Uuid,
    ) -> Result<u64, DbErr> {
        use sea_orm::PaginatorTrait;
        Collection::find()
            .filter(collection::Column::AuthorId.eq(author_id))
            .filter(collection::Column::QuestionId.eq(question_id))
            .count(conn)
            .await
    }
}
