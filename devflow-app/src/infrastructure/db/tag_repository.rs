use super::entities::{tag, tag_question, Tag, TagQuestion};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

pub(crate) struct TagRepository;

impl TagRepository {
    /// `name` must already be normalised (trimmed, lower-case).
    pub async fn find_or_create<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<tag::Model, DbErr> {
        if let Some(existing) = Tag::find()
            .filter(tag::Column::Name.eq(name))
            .one(conn)
            .await?
        {
            return Ok(existing);
        }

        let active = tag::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            questions: Set(0),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    pub async fn adjust_questions<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        delta: i32,
    ) -> Result<(), DbErr> {
        Tag::update_many()
            .col_expr(
                tag::Column::Questions,
                Expr::col(tag::Column::Questions).add(delta),
            )
            .filter(tag::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(())
    }

    pub async fn link<C: ConnectionTrait>(
        conn: &C,
        tag_id: Uuid,
        question_id: Uuid,
    ) -> Result<(), DbErr> {
        let active = tag_question::ActiveModel {
            tag_id: Set(tag_id),
            question_id: Set(question_id),
        };
        TagQuestion::insert(active).exec_without_returning(conn).await?;
        Ok(())
    }

    pub async fn ids_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<Vec<Uuid>, DbErr> {
        TagQuestion::find()
            .select_only()
            .column(tag_question::Column::TagId)
            .filter(tag_question::Column::QuestionId.eq(question_id))
            .into_tuple::<Uuid>()
            .all(conn)
            .await
    }

    pub async fn names_for_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<Vec<String>, DbErr> {
        let tags = Tag::find()
            .inner_join(TagQuestion)
            .filter(tag_question::Column::QuestionId.eq(question_id))
            .order_by_asc(tag::Column::Name)
            .all(conn)
            .await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    pub async fn unlink_question<C: ConnectionTrait>(
        conn: &C,
        question_id: Uuid,
    ) -> Result<u64, DbErr> {
        let result = TagQuestion::delete_many()
            .filter(tag_question::Column::QuestionId.eq(question_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    #[cfg(test)]
    pub async fn find_by_name<C: ConnectionTrait>(
        conn: &C,
        name: &str,
    ) -> Result<Option<tag::Model>, DbErr> {
        Tag::find().filter(tag::Column::Name.eq(name)).one(conn).await
    }
}
