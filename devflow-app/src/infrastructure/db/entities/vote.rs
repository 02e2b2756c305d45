use crate::domain::{TargetKind, VoteType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's vote on a question or answer. `action_id` is polymorphic over
/// `action_type`, so it carries no foreign key; at most one row exists per
/// (author_id, action_id, action_type).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "votes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub author_id: Uuid,
    pub action_id: Uuid,
    pub action_type: TargetKind,
    pub vote_type: VoteType,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
