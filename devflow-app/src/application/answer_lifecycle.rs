use super::{require_actor, Ledger};
use crate::domain::{
    routes, AnswerSort, AnswerView, AnswersPage, AuthorSummary, InteractionAction, InteractionEvent,
    NewAnswer, PageRequest, TargetKind,
};
use crate::infrastructure::db::entities::{answer, user};
use crate::infrastructure::db::{
    map_db_err, AnswerRepository, QuestionRepository, Transactional, TxnError, UserRepository,
    VoteRepository,
};
use crate::infrastructure::security::InputValidator;
use devflow_errors::AppError;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

/// Creates and deletes answers, keeping the parent question's answer counter
/// equal to the number of answers that exist.
pub struct AnswerLifecycle {
    ledger: Ledger,
}

impl AnswerLifecycle {
    pub(crate) fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub async fn create_answer(
        &self,
        new_answer: NewAnswer,
        actor: Option<Uuid>,
    ) -> Result<AnswerView, AppError> {
        let actor = require_actor(actor)?;
        let content = InputValidator::answer_content(&new_answer.content)?;

        let view = self
            .ledger
            .transact(&CreateAnswer {
                question_id: new_answer.question_id,
                content,
                actor,
            })
            .await?;

        tracing::info!(answer_id = %view.id, question_id = %view.question_id, %actor, "Answer posted");
        self.ledger.after_commit(
            Some(InteractionEvent::new(
                InteractionAction::Post,
                TargetKind::Answer,
                view.id,
                actor,
                actor,
            )),
            &[routes::question(view.question_id)],
        );

        Ok(view)
    }

    pub async fn delete_answer(&self, answer_id: Uuid, actor: Option<Uuid>) -> Result<(), AppError> {
        let actor = require_actor(actor)?;

        let answer = AnswerRepository::find_by_id(&self.ledger.db, answer_id)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::not_found("Answer"))?;
        ensure_author(&answer, actor)?;

        let question_id = self
            .ledger
            .transact(&DeleteAnswer { answer_id, actor })
            .await?;

        tracing::info!(%answer_id, %question_id, %actor, "Answer deleted");
        self.ledger.after_commit(
            Some(InteractionEvent::new(
                InteractionAction::Delete,
                TargetKind::Answer,
                answer_id,
                actor,
                actor,
            )),
            &[routes::question(question_id), routes::profile(actor)],
        );

        Ok(())
    }

    pub async fn get_answers(
        &self,
        question_id: Uuid,
        page: PageRequest,
        sort: AnswerSort,
    ) -> Result<AnswersPage, AppError> {
        let page = InputValidator::page(page)?;
        let db = &self.ledger.db;

        let total_answers = AnswerRepository::count_for_question(db, question_id)
            .await
            .map_err(map_db_err)?;
        let rows = AnswerRepository::page_for_question(db, question_id, page, sort)
            .await
            .map_err(map_db_err)?;

        let is_next = page.has_next(total_answers, rows.len());
        let answers = into_views(rows)?;

        Ok(AnswersPage {
            answers,
            is_next,
            total_answers,
        })
    }
}

fn ensure_author(answer: &answer::Model, actor: Uuid) -> Result<(), AppError> {
    if answer.author_id != actor {
        return Err(AppError::Authorization(
            "You are not allowed to delete this answer".to_string(),
        ));
    }
    Ok(())
}

/// Every answer has an author (foreign key), so a missing one is a store fault.
fn into_views(
    rows: Vec<(answer::Model, Option<user::Model>)>,
) -> Result<Vec<AnswerView>, AppError> {
    rows.into_iter()
        .map(|(answer, author)| match author {
            Some(author) => Ok(to_view(answer, AuthorSummary::from(&author))),
            None => {
                tracing::error!(answer_id = %answer.id, "Answer author missing");
                Err(AppError::Persistence(format!("answer {} has no author", answer.id)))
            }
        })
        .collect()
}

fn to_view(answer: answer::Model, author: AuthorSummary) -> AnswerView {
    AnswerView {
        id: answer.id,
        question_id: answer.question_id,
        author,
        content: answer.content,
        upvotes: answer.upvotes,
        downvotes: answer.downvotes,
        created_at: answer.created_at,
    }
}

struct CreateAnswer {
    question_id: Uuid,
    content: String,
    actor: Uuid,
}

impl Transactional for CreateAnswer {
    type Output = AnswerView;

    fn name(&self) -> &'static str {
        "create_answer"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<AnswerView, TxnError> {
        QuestionRepository::find_by_id(txn, self.question_id)
            .await?
            .ok_or_else(|| AppError::not_found("Question"))?;
        let author = UserRepository::find_by_id(txn, self.actor)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        let answer = AnswerRepository::create(txn, self.actor, self.question_id, &self.content).await?;
        QuestionRepository::adjust_answers(txn, self.question_id, 1).await?;

        Ok(to_view(answer, AuthorSummary::from(&author)))
    }
}

struct DeleteAnswer {
    answer_id: Uuid,
    actor: Uuid,
}

impl Transactional for DeleteAnswer {
    type Output = Uuid;

    fn name(&self) -> &'static str {
        "delete_answer"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<Uuid, TxnError> {
        // Re-read under a row lock; a concurrent delete may have won.
        let answer = AnswerRepository::lock_by_id(txn, self.answer_id)
            .await?
            .ok_or_else(|| AppError::not_found("Answer"))?;
        ensure_author(&answer, self.actor)?;

        if !AnswerRepository::delete(txn, answer.id).await? {
            return Err(AppError::not_found("Answer").into());
        }
        VoteRepository::delete_for_targets(txn, vec![answer.id], TargetKind::Answer).await?;
        QuestionRepository::adjust_answers(txn, answer.question_id, -1).await?;

        Ok(answer.question_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{VoteRequest, VoteType};
    use crate::test_support::TestApp;

    fn new_answer(question_id: Uuid, content: &str) -> NewAnswer {
        NewAnswer {
            question_id,
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_then_delete_by_other_user_is_rejected() {
        let app = TestApp::new().await;
        let asker = app.user("asker").await;
        let x = app.user("xavier").await;
        let other = app.user("other").await;
        let q = app.question(asker).await;
        assert_eq!(app.summary(q).await.answers, 0);

        let view = app
            .ctx
            .answers
            .create_answer(new_answer(q, "text"), Some(x))
            .await
            .unwrap();
        assert_eq!(app.summary(q).await.answers, 1);
        assert_eq!(view.author.id, x);

        let err = app
            .ctx
            .answers
            .delete_answer(view.id, Some(other))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
        assert_eq!(app.summary(q).await.answers, 1);
        assert_eq!(app.answer_rows(q).await, 1);
    }

    #[tokio::test]
    async fn test_delete_removes_answer_votes_and_decrements_counter() {
        let app = TestApp::new().await;
        let asker = app.user("asker").await;
        let writer = app.user("writer").await;
        let voter = app.user("voter").await;
        let q = app.question(asker).await;
        let keep = app.answer(q, asker).await;
        let doomed = app.answer(q, writer).await;

        for target_id in [keep, doomed] {
            app.ctx
                .votes
                .cast_vote(
                    VoteRequest {
                        target_id,
                        target_type: TargetKind::Answer,
                        vote_type: VoteType::Upvote,
                    },
                    Some(voter),
                )
                .await
                .unwrap();
        }

        app.ctx.answers.delete_answer(doomed, Some(writer)).await.unwrap();

        assert_eq!(app.summary(q).await.answers, 1);
        assert_eq!(app.answer_rows(q).await, 1);
        assert_eq!(app.vote_rows(doomed, TargetKind::Answer).await, 0);
        assert_eq!(app.vote_rows(keep, TargetKind::Answer).await, 1);
        assert!(app.ctx.stale_routes.is_stale(&routes::profile(writer)));
    }

    #[tokio::test]
    async fn test_answer_reputation_post_and_delete() {
        let app = TestApp::new().await;
        let asker = app.user("asker").await;
        let writer = app.user("writer").await;
        let q = app.question(asker).await;

        let answer_id = app.answer(q, writer).await;
        app.settle().await;
        assert_eq!(app.reputation(writer).await, 10);

        app.ctx.answers.delete_answer(answer_id, Some(writer)).await.unwrap();
        app.settle().await;
        assert_eq!(app.reputation(writer).await, 0);
    }

    #[tokio::test]
    async fn test_create_answer_failures() {
        let app = TestApp::new().await;
        let writer = app.user("writer").await;
        let q = app.question(writer).await;

        assert_eq!(
            app.ctx
                .answers
                .create_answer(new_answer(Uuid::new_v4(), "text"), Some(writer))
                .await
                .unwrap_err(),
            AppError::NotFound("Question".to_string())
        );
        assert!(matches!(
            app.ctx.answers.create_answer(new_answer(q, "   "), Some(writer)).await,
            Err(AppError::Validation { .. })
        ));
        assert_eq!(
            app.ctx.answers.create_answer(new_answer(q, "text"), None).await.unwrap_err(),
            AppError::Unauthorized
        );
        assert_eq!(app.summary(q).await.answers, 0);
    }

    #[tokio::test]
    async fn test_delete_missing_answer() {
        let app = TestApp::new().await;
        let writer = app.user("writer").await;

        assert_eq!(
            app.ctx
                .answers
                .delete_answer(Uuid::new_v4(), Some(writer))
                .await
                .unwrap_err(),
            AppError::NotFound("Answer".to_string())
        );
    }

    #[tokio::test]
    async fn test_racing_deletes_decrement_once() {
        for app in TestApp::racing().await {
            let asker = app.user("asker").await;
            let writer = app.user("writer").await;
            for _ in 0..10 {
                let q = app.question(asker).await;
                app.answer(q, asker).await;
                let doomed = app.answer(q, writer).await;

                let (a, b) = tokio::join!(
                    app.ctx.answers.delete_answer(doomed, Some(writer)),
                    app.ctx.answers.delete_answer(doomed, Some(writer)),
                );
                let mut failures: Vec<AppError> = [a, b].into_iter().filter_map(Result::err).collect();

                assert_eq!(failures.pop(), Some(AppError::NotFound("Answer".to_string())));
                assert!(failures.is_empty());
                assert_eq!(app.summary(q).await.answers, 1);
                assert_eq!(app.answer_rows(q).await, 1);
            }
            app.settle().await;
        }
    }

    #[test]
    fn test_answer_without_author_is_a_store_fault() {
        let orphan = answer::Model {
            id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            author_id: Uuid::new_v4(),
            content: "text".to_string(),
            upvotes: 0,
            downvotes: 0,
            created_at: chrono::Utc::now(),
        };

        assert!(matches!(
            into_views(vec![(orphan, None)]),
            Err(AppError::Persistence(msg)) if msg.contains("no author")
        ));
        assert!(into_views(Vec::new()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_answers_pages_and_sorts() {
        let app = TestApp::new().await;
        let asker = app.user("asker").await;
        let voter = app.user("voter").await;
        let q = app.question(asker).await;

        let mut ids = Vec::new();
        for _ in 0..3 {
            ids.push(app.answer(q, asker).await);
        }
        app.ctx
            .votes
            .cast_vote(
                VoteRequest {
                    target_id: ids[1],
                    target_type: TargetKind::Answer,
                    vote_type: VoteType::Upvote,
                },
                Some(voter),
            )
            .await
            .unwrap();

        let first = app
            .ctx
            .answers
            .get_answers(q, PageRequest::new(Some(1), Some(2)), AnswerSort::Popular)
            .await
            .unwrap();
        assert_eq!(first.total_answers, 3);
        assert!(first.is_next);
        assert_eq!(first.answers.len(), 2);
        assert_eq!(first.answers[0].id, ids[1]);
        assert_eq!(first.answers[0].author.id, asker);

        let second = app
            .ctx
            .answers
            .get_answers(q, PageRequest::new(Some(2), Some(2)), AnswerSort::Popular)
            .await
            .unwrap();
        assert_eq!(second.answers.len(), 1);
        assert!(!second.is_next);

        assert!(app
            .ctx
            .answers
            .get_answers(q, PageRequest::new(Some(0), Some(2)), AnswerSort::Latest)
            .await
            .is_err());
    }
}
