use super::entities::{user, User};
use crate::domain::NewUser;
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, Condition, ConnectionTrait, DbErr};
use uuid::Uuid;

pub(crate) struct UserRepository;

impl UserRepository {
    pub async fn find_by_id<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(id).one(conn).await
    }

    pub async fn find_by_email_or_username<C: ConnectionTrait>(
        conn: &C,
        email: &str,
        username: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(email))
                    .add(user::Column::Username.eq(username)),
            )
            .one(conn)
            .await
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        new_user: &NewUser,
    ) -> Result<user::Model, DbErr> {
        let active = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new_user.name.clone()),
            username: Set(new_user.username.clone()),
            email: Set(new_user.email.clone()),
            image: Set(new_user.image.clone()),
            reputation: Set(0),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    /// Adds `delta` to the user's reputation. Returns whether the user exists.
    pub async fn adjust_reputation<C: ConnectionTrait>(
        conn: &C,
        id: Uuid,
        delta: i64,
    ) -> Result<bool, DbErr> {
        let result = User::update_many()
            .col_expr(
                user::Column::Reputation,
                Expr::col(user::Column::Reputation).add(delta),
            )
            .filter(user::Column::Id.eq(id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
