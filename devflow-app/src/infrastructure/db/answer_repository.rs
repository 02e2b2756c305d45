use super::entities::{answer, user, Answer, User};
use crate::domain::{AnswerSort, PageRequest};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr, PaginatorTrait};
use uuid::Uuid;

pub(crate) struct AnswerRepository;

impl AnswerRepository {
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<answer::Model>, DbErr> {
        Answer::find_by_id(id).one(conn).await
    }

    /// `find_by_id` holding a row lock until the transaction ends.
    pub async fn lock_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<answer::Model>, DbErr> {
        Answer::find_by_id(id).lock_exclusive().one(conn).await
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        question_id: Uuid,
        content: &str,
    ) -> Result<answer::Model, DbErr> {
        let active = answer::ActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            question_id: Set(question_id),
            content: Set(content.to_string()),
            upvotes: Set(0),
            downvotes: Set(0),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    /// Returns whether the answer was still there to delete.
    pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        let result = Answer::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn ids_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        Answer::find()
            .select_only()
            .column(answer::Column::Id)
            .filter(answer::Column::QuestionId.eq(question_id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await
    }

    pub async fn delete_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = Answer::delete_many()
            .filter(answer::Column::QuestionId.eq(question_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    pub async fn count_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<u64, DbErr> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .count(conn)
            .await
    }

    pub async fn page_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
        page: PageRequest,
        sort: AnswerSort,
    ) -> Result<Vec<(answer::Model, Option<user::Model>)>, DbErr> {
        let select = Answer::find().filter(answer::Column::QuestionId.eq(question_id));
        let select = match sort {
            AnswerSort::Latest => select.order_by_desc(answer::Column::CreatedAt),
            AnswerSort::Oldest => select.order_by_asc(answer::Column::CreatedAt),
            AnswerSort::Popular => select.order_by_desc(answer::Column::Upvotes),
        };

        select
            .order_by_asc(answer::Column::Id)
            .offset(page.offset())
            .limit(page.page_size)
            .find_also_related(User)
            .all(conn)
            .await
    }
}
