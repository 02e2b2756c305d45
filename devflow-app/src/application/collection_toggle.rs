use super::{require_actor, Ledger};
use crate::domain::{routes, PageRequest, SaveResult, SavedQuestionsPage, SavedSort};
use crate::infrastructure::db::{
    map_db_err, CollectionRepository, QuestionRepository, Transactional, TxnError,
};
use crate::infrastructure::security::InputValidator;
use devflow_errors::AppError;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

/// A user's saved questions. Saving twice un-saves.
pub struct CollectionToggle {
    ledger: Ledger,
}

impl CollectionToggle {
    pub(crate) fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub async fn toggle_save_question(
        &self,
        question_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<SaveResult, AppError> {
        let actor = require_actor(actor)?;
        let result = self
            .ledger
            .transact(&ToggleSave { question_id, actor })
            .await?;

        tracing::info!(%question_id, %actor, saved = result.saved, "Collection toggled");
        self.ledger.after_commit(None, &[routes::question(question_id)]);

        Ok(result)
    }

    pub async fn has_saved_question(
        &self,
        question_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<SaveResult, AppError> {
        let actor = require_actor(actor)?;
        let saved = CollectionRepository::find(&self.ledger.db, actor, question_id)
            .await
            .map_err(map_db_err)?
            .is_some();
        Ok(SaveResult { saved })
    }

    pub async fn get_saved_questions(
        &self,
        actor: Option<Uuid>,
        page: PageRequest,
        query: Option<&str>,
        sort: SavedSort,
    ) -> Result<SavedQuestionsPage, AppError> {
        let actor = require_actor(actor)?;
        let page = InputValidator::page(page)?;
        let query = InputValidator::search_query(query)?;
        let db = &self.ledger.db;

        let (rows, total) = QuestionRepository::saved_by(db, actor, page, query.as_deref(), sort)
            .await
            .map_err(map_db_err)?;
        let is_next = page.has_next(total, rows.len());

        let mut questions = Vec::with_capacity(rows.len());
        for row in rows {
            questions.push(QuestionRepository::summarize(db, row).await.map_err(map_db_err)?);
        }

        Ok(SavedQuestionsPage { questions, is_next })
    }
}

struct ToggleSave {
    question_id: Uuid,
    actor: Uuid,
}

impl Transactional for ToggleSave {
    type Output = SaveResult;

    fn name(&self) -> &'static str {
        "toggle_save_question"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<SaveResult, TxnError> {
        QuestionRepository::lock_by_id(txn, self.question_id)
            .await?
            .ok_or_else(|| AppError::not_found("Question"))?;

        match CollectionRepository::find(txn, self.actor, self.question_id).await? {
            Some(existing) => {
                if !CollectionRepository::delete(txn, existing.id).await? {
                    return Err(TxnError::Conflict("Collection"));
                }
                Ok(SaveResult { saved: false })
            }
            None => {
                CollectionRepository::create(txn, self.actor, self.question_id).await?;
                Ok(SaveResult { saved: true })
            }
        }
    }
}
