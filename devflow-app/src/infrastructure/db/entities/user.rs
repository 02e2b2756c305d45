use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub username: String,
    #[sea_orm(unique)]
    pub email: String,
    pub image: Option<String>,
    pub reputation: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for crate::domain::UserProfile {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            username: m.username,
            email: m.email,
            image: m.image,
            reputation: m.reputation,
            created_at: m.created_at,
        }
    }
}

impl From<&Model> for crate::domain::AuthorSummary {
    fn from(m: &Model) -> Self {
        Self {
            id: m.id,
            name: m.name.clone(),
            image: m.image.clone(),
        }
    }
}
