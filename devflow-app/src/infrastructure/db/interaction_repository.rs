use super::entities::{interaction, Interaction};
use crate::domain::InteractionEvent;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use uuid::Uuid;

pub(crate) struct InteractionRepository;

impl InteractionRepository {
    pub async fn exists<C: ConnectionTrait>(conn: &C, event_id: Uuid) -> Result<bool, DbErr> {
        let found = Interaction::find()
            .filter(interaction::Column::EventId.eq(event_id))
            .one(conn)
            .await?;
        Ok(found.is_some())
    }

    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        event: &InteractionEvent,
    ) -> Result<interaction::Model, DbErr> {
        let active = interaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            event_id: Set(event.event_id),
            user_id: Set(event.performer_id),
            action: Set(event.action),
            action_id: Set(event.action_id),
            action_type: Set(event.target_kind),
            created_at: Set(chrono::Utc::now()),
        };
        active.insert(conn).await
    }

    #[cfg(test)]
    pub async fn all_for_user<C: ConnectionTrait>(
        conn: &C,
        user_id: Uuid,
    ) -> Result<Vec<interaction::Model>, DbErr> {
        Interaction::find()
            .filter(interaction::Column::UserId.eq(user_id))
            .order_by_asc(interaction::Column::CreatedAt)
            .all(conn)
            .await
    }
}
