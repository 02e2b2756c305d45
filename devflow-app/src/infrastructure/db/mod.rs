pub(crate) mod entities;
mod error;
mod transaction;
pub(crate) mod votable;

mod answer_repository;
mod collection_repository;
mod interaction_repository;
mod question_repository;
mod tag_repository;
mod user_repository;
mod vote_repository;

pub(crate) use answer_repository::AnswerRepository;
pub(crate) use collection_repository::CollectionRepository;
pub(crate) use error::{map_db_err, TxnError};
pub(crate) use interaction_repository::InteractionRepository;
pub(crate) use question_repository::QuestionRepository;
pub(crate) use tag_repository::TagRepository;
pub(crate) use transaction::{run_transaction, Transactional};
pub use transaction::RetryPolicy;
pub(crate) use user_repository::UserRepository;
pub(crate) use vote_repository::VoteRepository;

use entities::{answer, collection, interaction, question, vote};
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};
use std::time::Duration;

pub async fn create_connection(
    database_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Creates every table and index the ledger needs, skipping ones that exist.
/// Statements are derived from the entities for the connected backend.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    // Referenced tables first.
    create_table(db, &schema, entities::User).await?;
    create_table(db, &schema, entities::Question).await?;
    create_table(db, &schema, entities::Answer).await?;
    create_table(db, &schema, entities::Vote).await?;
    create_table(db, &schema, entities::Collection).await?;
    create_table(db, &schema, entities::Interaction).await?;
    create_table(db, &schema, entities::Tag).await?;
    create_table(db, &schema, entities::TagQuestion).await?;

    for index in indexes() {
        db.execute(db.get_database_backend().build(&index)).await?;
    }

    tracing::info!("Ledger schema ready");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<(), DbErr> {
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(db.get_database_backend().build(&stmt)).await?;
    Ok(())
}

fn indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .if_not_exists()
            .name("uq_votes_author_action")
            .table(entities::Vote)
            .col(vote::Column::AuthorId)
            .col(vote::Column::ActionId)
            .col(vote::Column::ActionType)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_votes_action")
            .table(entities::Vote)
            .col(vote::Column::ActionId)
            .col(vote::Column::ActionType)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("uq_collections_author_question")
            .table(entities::Collection)
            .col(collection::Column::AuthorId)
            .col(collection::Column::QuestionId)
            .unique()
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_answers_question")
            .table(entities::Answer)
            .col(answer::Column::QuestionId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_questions_author")
            .table(entities::Question)
            .col(question::Column::AuthorId)
            .to_owned(),
        Index::create()
            .if_not_exists()
            .name("idx_interactions_user")
            .table(entities::Interaction)
            .col(interaction::Column::UserId)
            .to_owned(),
    ]
}
