use super::{require_actor, Ledger};
use crate::domain::{
    routes, InteractionAction, InteractionEvent, NewQuestion, QuestionSummary, TargetKind,
};
use crate::infrastructure::db::entities::question;
use crate::infrastructure::db::{
    map_db_err, AnswerRepository, CollectionRepository, QuestionRepository, TagRepository,
    Transactional, TxnError, VoteRepository,
};
use crate::infrastructure::security::{InputValidator, ValidQuestion};
use devflow_errors::AppError;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

pub struct QuestionLifecycle {
    ledger: Ledger,
}

impl QuestionLifecycle {
    pub(crate) fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub async fn create_question(
        &self,
        new_question: NewQuestion,
        actor: Option<Uuid>,
    ) -> Result<QuestionSummary, AppError> {
        let actor = require_actor(actor)?;
        let question = InputValidator::question(&new_question)?;

        let summary = self
            .ledger
            .transact(&CreateQuestion { question, actor })
            .await?;

        tracing::info!(question_id = %summary.id, %actor, tags = ?summary.tags, "Question posted");
        self.ledger.after_commit(
            Some(InteractionEvent::new(
                InteractionAction::Post,
                TargetKind::Question,
                summary.id,
                actor,
                actor,
            )),
            &[routes::profile(actor)],
        );

        Ok(summary)
    }

    /// Removes the question with its answers, votes on either, saves and tag
    /// links, all in one transaction.
    pub async fn delete_question(
        &self,
        question_id: Uuid,
        actor: Option<Uuid>,
    ) -> Result<(), AppError> {
        let actor = require_actor(actor)?;

        let question = QuestionRepository::find_by_id(&self.ledger.db, question_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("Question"))?;
        ensure_author(&question, actor)?;

        let removed_answers = self
            .ledger
            .transact(&DeleteQuestion { question_id, actor })
            .await?;

        tracing::info!(%question_id, %actor, removed_answers, "Question deleted");
        self.ledger.after_commit(
            Some(InteractionEvent::new(
                InteractionAction::Delete,
                TargetKind::Question,
                question_id,
                actor,
                actor,
            )),
            &[routes::question(question_id), routes::profile(actor)],
        );

        Ok(())
    }

    pub async fn get_question(&self, question_id: Uuid) -> Result<QuestionSummary, AppError> {
        let db = &self.ledger.db;
        let question = QuestionRepository::find_by_id(db, question_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("Question"))?;

        QuestionRepository::summarize(db, question)
            .await
            .map_err(map_db_err)
    }
}

fn ensure_author(question: &question::Model, actor: Uuid) -> Result<(), AppError> {
    if question.author_id != actor {
        return Err(AppError::Authorization(
            "You are not allowed to delete this question".to_string(),
        ));
    }
    Ok(())
}

struct CreateQuestion {
    question: ValidQuestion,
    actor: Uuid,
}

impl Transactional for CreateQuestion {
    type Output = QuestionSummary;

    fn name(&self) -> &'static str {
        "create_question"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<QuestionSummary, TxnError> {
        let question = &self.question;
        let created =
            QuestionRepository::create(txn, self.actor, &question.title, &question.content).await?;

        for name in &question.tags {
            let tag = TagRepository::find_or_create(txn, name).await?;
            TagRepository::adjust_questions(txn, tag.id, 1).await?;
            TagRepository::link(txn, tag.id, created.id).await?;
        }

        Ok(QuestionRepository::summarize(txn, created).await?)
    }
}

struct DeleteQuestion {
    question_id: Uuid,
    actor: Uuid,
}

impl Transactional for DeleteQuestion {
    type Output = u64;

    fn name(&self) -> &'static str {
        "delete_question"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<u64, TxnError> {
        let question = QuestionRepository::lock_by_id(txn, self.question_id)
            .await?
            .ok_or_else(|| AppError::not_found("Question"))?;
        ensure_author(&question, self.actor)?;

        let answer_ids = AnswerRepository::ids_for_question(txn, question.id).await?;
        if !answer_ids.is_empty() {
            VoteRepository::delete_for_targets(txn, answer_ids, TargetKind::Answer).await?;
        }
        VoteRepository::delete_for_targets(txn, vec![question.id], TargetKind::Question).await?;
        let removed_answers = AnswerRepository::delete_for_question(txn, question.id).await?;
        CollectionRepository::delete_for_question(txn, question.id).await?;

        for tag_id in TagRepository::ids_for_question(txn, question.id).await? {
            TagRepository::adjust_questions(txn, tag_id, -1).await?;
        }
        TagRepository::unlink_question(txn, question.id).await?;

        QuestionRepository::delete(txn, question.id).await?;
        Ok(removed_answers)
    }
}
