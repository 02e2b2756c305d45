use super::entities::{collection, question, user, Collection, Question, User};
use super::TagRepository;
use crate::domain::{AuthorSummary, PageRequest, QuestionSummary, SavedSort};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{entity::*, query::*, Condition, ConnectionTrait, DbErr, PaginatorTrait};
use uuid::Uuid;

pub(crate) struct QuestionRepository;

impl QuestionRepository {
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<question::Model>, DbErr> {
        Question::find_by_id(id).one(conn).await
    }

    pub async fn lock_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<question::Model>, DbErr> {
        Question::find_by_id(id).lock_exclusive().one(conn).await
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        title: &str,
        content: &str,
    ) -> Result<question::Model, DbErr> {
        let active = question::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            content: Set(content.to_string()),
            author_id: Set(author_id),
            views: Set(0),
            answers: Set(0),
            upvotes: Set(0),
            downvotes: Set(0),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    /// Atomically adds `delta` to the question's answer counter.
    pub async fn adjust_answers<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        delta: i32,
    ) -> Result<(), DbErr> {
        let result = Question::update_many()
            .col_expr(
                question::Column::Answers,
                Expr::col(question::Column::Answers).add(delta),
            )
            .filter(question::Column::Id.eq(id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(DbErr::RecordNotFound("Question".to_string()));
        }
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<(), DbErr> {
        Question::delete_by_id(id).exec(conn).await?;
        Ok(())
    }

    /// Joins in the author and tag names.
    pub async fn summarize<C: ConnectionTrait>(
        conn: &C,
        model: question::Model,
    ) -> Result<QuestionSummary, DbErr> {
        let author: user::Model = User::find_by_id(model.author_id)
            .one(conn)
            .await?
            .ok_or(DbErr::RecordNotFound("User".to_string()))?;
        let tags = TagRepository::names_for_question(conn, model.id).await?;

        Ok(QuestionSummary {
            id: model.id,
            title: model.title,
            content: model.content,
            tags,
            author: AuthorSummary::from(&author),
            views: model.views,
            answers: model.answers,
            upvotes: model.upvotes,
            downvotes: model.downvotes,
            created_at: model.created_at,
        })
    }

    /// Questions `author_id` has saved, one page at a time, with the total
    /// number of matches.
    pub async fn saved_by<C: ConnectionTrait>(
        conn: &C,
        author_id: Uuid,
        page: PageRequest,
        query: Option<&str>,
        sort: SavedSort,
    ) -> Result<(Vec<question::Model>, u64), DbErr> {
        let mut select = Question::find()
            .inner_join(Collection)
            .filter(collection::Column::AuthorId.eq(author_id));

        if let Some(query) = query {
            let pattern = format!("%{}%", query.to_lowercase());
            select = select.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            question::Entity,
                            question::Column::Title,
                        ))))
                        .like(pattern.clone()),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            question::Entity,
                            question::Column::Content,
                        ))))
                        .like(pattern),
                    ),
            );
        }

        let total = select.clone().count(conn).await?;

        let select = match sort {
            SavedSort::MostRecent => select.order_by_desc(question::Column::CreatedAt),
            SavedSort::Oldest => select.order_by_asc(question::Column::CreatedAt),
            SavedSort::MostVoted => select.order_by_desc(question::Column::Upvotes),
            SavedSort::MostViewed => select.order_by_desc(question::Column::Views),
            SavedSort::MostAnswered => select.order_by_desc(question::Column::Answers),
        };

        let rows = select
            .order_by_asc(question::Column::Id)
            .offset(page.offset())
            .limit(page.page_size)
            .all(conn)
            .await?;

        Ok((rows, total))
    }
}
