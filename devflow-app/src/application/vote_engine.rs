use super::{require_actor, Ledger};
use crate::domain::{
    routes, InteractionEvent, TargetKind, VoteOutcome, VoteRequest, VoteStatus,
};
use crate::infrastructure::db::entities::{answer, question};
use crate::infrastructure::db::votable::{self, Votable};
use crate::infrastructure::db::{map_db_err, Transactional, TxnError, VoteRepository};
use devflow_errors::AppError;
use sea_orm::DatabaseTransaction;
use uuid::Uuid;

/// Toggles and switches votes, keeping the target's counters in step with
/// the vote rows.
pub struct VoteEngine {
    ledger: Ledger,
}

impl VoteEngine {
    pub(crate) fn new(ledger: Ledger) -> Self {
        Self { ledger }
    }

    pub async fn cast_vote(
        &self,
        request: VoteRequest,
        actor: Option<Uuid>,
    ) -> Result<VoteOutcome, AppError> {
        let actor = require_actor(actor)?;
        let committed = self.ledger.transact(&CastVote { request, actor }).await?;

        tracing::info!(
            target_id = %request.target_id,
            target = %request.target_type,
            vote = %request.vote_type,
            actor = %actor,
            upvotes = committed.outcome.upvotes,
            downvotes = committed.outcome.downvotes,
            "Vote applied"
        );

        self.ledger.after_commit(
            Some(InteractionEvent::new(
                request.vote_type.into(),
                request.target_type,
                request.target_id,
                actor,
                committed.author_id,
            )),
            &[routes::question(committed.question_id)],
        );

        Ok(committed.outcome)
    }

    pub async fn has_voted(
        &self,
        target_id: Uuid,
        target_kind: TargetKind,
        actor: Option<Uuid>,
    ) -> Result<VoteStatus, AppError> {
        let actor = require_actor(actor)?;
        let vote = VoteRepository::find(&self.ledger.db, actor, target_id, target_kind)
            .await
            .map_err(map_db_err)?;

        Ok(match vote {
            Some(vote) => VoteStatus::Voted(vote.vote_type),
            None => VoteStatus::NoVoteFound,
        })
    }
}

struct CastVote {
    request: VoteRequest,
    actor: Uuid,
}

struct CommittedVote {
    outcome: VoteOutcome,
    author_id: Uuid,
    question_id: Uuid,
}

impl CastVote {
    async fn cast_on<E: Votable>(&self, txn: &DatabaseTransaction) -> Result<CommittedVote, TxnError> {
        let target_id = self.request.target_id;
        let vote_type = self.request.vote_type;

        // Locked first: every read and write below runs against the state
        // the previous writer on this target committed.
        let target = votable::lock_target::<E, _>(txn, target_id)
            .await?
            .ok_or_else(|| AppError::not_found(E::LABEL))?;

        let existing = VoteRepository::find(txn, self.actor, target_id, E::KIND).await?;

        let status = match existing {
            None => {
                VoteRepository::create(txn, self.actor, target_id, E::KIND, vote_type).await?;
                votable::adjust_counter::<E, _>(txn, target_id, vote_type, 1).await?;
                VoteStatus::Voted(vote_type)
            }
            Some(vote) if vote.vote_type == vote_type => {
                if !VoteRepository::delete(txn, vote.id, vote_type).await? {
                    return Err(TxnError::Conflict("Vote"));
                }
                votable::adjust_counter::<E, _>(txn, target_id, vote_type, -1).await?;
                VoteStatus::NoVoteFound
            }
            Some(vote) => {
                let previous = vote.vote_type;
                if !VoteRepository::change_type(txn, vote.id, previous, vote_type).await? {
                    return Err(TxnError::Conflict("Vote"));
                }
                // Two separate updates, so neither counter ever dips below zero.
                votable::adjust_counter::<E, _>(txn, target_id, vote_type, 1).await?;
                votable::adjust_counter::<E, _>(txn, target_id, previous, -1).await?;
                VoteStatus::Voted(vote_type)
            }
        };

        let refreshed = votable::find_target::<E, _>(txn, target_id)
            .await?
            .ok_or_else(|| AppError::not_found(E::LABEL))?;
        let (upvotes, downvotes) = E::tally_of(&refreshed);

        Ok(CommittedVote {
            outcome: VoteOutcome {
                status,
                upvotes,
                downvotes,
            },
            author_id: E::author_of(&target),
            question_id: E::question_of(&target),
        })
    }
}

impl Transactional for CastVote {
    type Output = CommittedVote;

    fn name(&self) -> &'static str {
        "cast_vote"
    }

    async fn run(&self, txn: &DatabaseTransaction) -> Result<CommittedVote, TxnError> {
        match self.request.target_type {
            TargetKind::Question => self.cast_on::<question::Entity>(txn).await,
            TargetKind::Answer => self.cast_on::<answer::Entity>(txn).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::VoteType;
    use crate::infrastructure::db::run_transaction;
    use crate::test_support::TestApp;

    fn vote(target_id: Uuid, target_type: TargetKind, vote_type: VoteType) -> VoteRequest {
        VoteRequest {
            target_id,
            target_type,
            vote_type,
        }
    }

    #[tokio::test]
    async fn test_second_identical_vote_toggles_off() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;
        let up = vote(q, TargetKind::Question, VoteType::Upvote);

        let first = app.ctx.votes.cast_vote(up, Some(voter)).await.unwrap();
        assert_eq!(first.status, VoteStatus::Voted(VoteType::Upvote));
        assert_eq!(first.upvotes, 1);

        let second = app.ctx.votes.cast_vote(up, Some(voter)).await.unwrap();
        assert_eq!(second.status, VoteStatus::NoVoteFound);
        assert_eq!((second.upvotes, second.downvotes), (0, 0));

        assert_eq!(app.vote_rows(q, TargetKind::Question).await, 0);
        assert_eq!(app.tally(q).await, (0, 0));
    }

    #[tokio::test]
    async fn test_switch_moves_the_vote_between_counters() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;

        app.ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(voter))
            .await
            .unwrap();
        let switched = app
            .ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Downvote), Some(voter))
            .await
            .unwrap();

        assert_eq!(switched.status, VoteStatus::Voted(VoteType::Downvote));
        assert_eq!(app.tally(q).await, (0, 1));
        assert_eq!(app.vote_rows(q, TargetKind::Question).await, 1);
        assert_eq!(
            app.ctx.votes.has_voted(q, TargetKind::Question, Some(voter)).await.unwrap(),
            VoteStatus::Voted(VoteType::Downvote)
        );
    }

    #[tokio::test]
    async fn test_two_voters_then_switch_then_remove() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let a = app.user("alice").await;
        let b = app.user("bob").await;
        let q = app.question(author).await;
        assert_eq!(app.tally(q).await, (0, 0));

        let up = vote(q, TargetKind::Question, VoteType::Upvote);
        let down = vote(q, TargetKind::Question, VoteType::Downvote);

        app.ctx.votes.cast_vote(up, Some(a)).await.unwrap();
        assert_eq!(app.tally(q).await, (1, 0));
        app.ctx.votes.cast_vote(up, Some(b)).await.unwrap();
        assert_eq!(app.tally(q).await, (2, 0));
        app.ctx.votes.cast_vote(down, Some(a)).await.unwrap();
        assert_eq!(app.tally(q).await, (1, 1));
        app.ctx.votes.cast_vote(down, Some(a)).await.unwrap();
        assert_eq!(app.tally(q).await, (1, 0));
    }

    #[tokio::test]
    async fn test_votes_on_answers_revalidate_the_question() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;
        let answer_id = app.answer(q, author).await;
        app.ctx.stale_routes.take_stale();

        let outcome = app
            .ctx
            .votes
            .cast_vote(vote(answer_id, TargetKind::Answer, VoteType::Downvote), Some(voter))
            .await
            .unwrap();

        assert_eq!((outcome.upvotes, outcome.downvotes), (0, 1));
        assert_eq!(app.vote_rows(answer_id, TargetKind::Answer).await, 1);
        assert!(app.ctx.stale_routes.is_stale(&routes::question(q)));
        // The question itself is untouched.
        assert_eq!(app.tally(q).await, (0, 0));
    }

    #[tokio::test]
    async fn test_vote_requires_actor_and_target() {
        let app = TestApp::new().await;
        let voter = app.user("voter").await;
        let missing = vote(Uuid::new_v4(), TargetKind::Question, VoteType::Upvote);

        assert_eq!(
            app.ctx.votes.cast_vote(missing, None).await.unwrap_err(),
            AppError::Unauthorized
        );
        assert_eq!(
            app.ctx.votes.cast_vote(missing, Some(voter)).await.unwrap_err(),
            AppError::NotFound("Question".to_string())
        );
        assert_eq!(app.vote_rows(missing.target_id, TargetKind::Question).await, 0);
    }

    #[tokio::test]
    async fn test_has_voted_without_vote() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let q = app.question(author).await;

        assert_eq!(
            app.ctx.votes.has_voted(q, TargetKind::Question, Some(author)).await.unwrap(),
            VoteStatus::NoVoteFound
        );
        assert_eq!(
            app.ctx.votes.has_voted(q, TargetKind::Question, None).await.unwrap_err(),
            AppError::Unauthorized
        );
    }

    #[tokio::test]
    async fn test_vote_reputation_after_commit() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;
        app.settle().await;
        let baseline = app.reputation(author).await;

        app.ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(voter))
            .await
            .unwrap();
        app.settle().await;

        assert_eq!(app.reputation(voter).await, 2);
        assert_eq!(app.reputation(author).await, baseline + 10);
    }

    #[tokio::test]
    async fn test_self_vote_grants_author_points_once() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let q = app.question(author).await;
        app.settle().await;
        let baseline = app.reputation(author).await;

        app.ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(author))
            .await
            .unwrap();
        app.settle().await;

        assert_eq!(app.reputation(author).await, baseline + 10);
    }

    #[tokio::test]
    async fn test_concurrent_voters_are_all_counted() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let a = app.user("alice").await;
        let b = app.user("bob").await;
        let c = app.user("carol").await;
        let q = app.question(author).await;
        let up = vote(q, TargetKind::Question, VoteType::Upvote);

        let (ra, rb, rc) = tokio::join!(
            app.ctx.votes.cast_vote(up, Some(a)),
            app.ctx.votes.cast_vote(up, Some(b)),
            app.ctx.votes.cast_vote(up, Some(c)),
        );
        ra.unwrap();
        rb.unwrap();
        rc.unwrap();

        assert_eq!(app.tally(q).await, (3, 0));
        assert_eq!(app.vote_rows(q, TargetKind::Question).await, 3);
    }

    const RACE_ROUNDS: usize = 10;

    #[tokio::test]
    async fn test_same_voter_racing_switches_apply_in_turn() {
        for app in TestApp::racing().await {
            let author = app.user("author").await;
            let voter = app.user("voter").await;
            for _ in 0..RACE_ROUNDS {
                let q = app.question(author).await;
                let down = vote(q, TargetKind::Question, VoteType::Downvote);
                app.ctx
                    .votes
                    .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(voter))
                    .await
                    .unwrap();

                let (a, b) = tokio::join!(
                    app.ctx.votes.cast_vote(down, Some(voter)),
                    app.ctx.votes.cast_vote(down, Some(voter)),
                );
                let mut statuses = vec![a.unwrap().status, b.unwrap().status];
                statuses.sort_by_key(|status| *status == VoteStatus::NoVoteFound);

                // One switches up to down, the other then toggles the downvote off.
                assert_eq!(statuses, vec![VoteStatus::Voted(VoteType::Downvote), VoteStatus::NoVoteFound]);
                assert_eq!(app.tally(q).await, (0, 0));
                assert_eq!(app.vote_rows(q, TargetKind::Question).await, 0);
            }
            app.settle().await;
        }
    }

    #[tokio::test]
    async fn test_same_voter_racing_toggles_never_go_negative() {
        for app in TestApp::racing().await {
            let author = app.user("author").await;
            let voter = app.user("voter").await;
            for _ in 0..RACE_ROUNDS {
                let q = app.question(author).await;
                let up = vote(q, TargetKind::Question, VoteType::Upvote);
                app.ctx.votes.cast_vote(up, Some(voter)).await.unwrap();

                let (a, b) = tokio::join!(
                    app.ctx.votes.cast_vote(up, Some(voter)),
                    app.ctx.votes.cast_vote(up, Some(voter)),
                );
                a.unwrap();
                b.unwrap();

                // Off then on again.
                assert_eq!(app.tally(q).await, (1, 0));
                assert_eq!(app.vote_rows(q, TargetKind::Question).await, 1);
            }
            app.settle().await;
        }
    }

    #[tokio::test]
    async fn test_stale_vote_writes_match_no_row() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;
        app.ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(voter))
            .await
            .unwrap();
        let row = VoteRepository::find(&app.ctx.db, voter, q, TargetKind::Question)
            .await
            .unwrap()
            .unwrap();

        let db = &app.ctx.db;
        assert!(!VoteRepository::change_type(db, row.id, VoteType::Downvote, VoteType::Upvote).await.unwrap());
        assert!(!VoteRepository::delete(db, row.id, VoteType::Downvote).await.unwrap());
        assert!(VoteRepository::delete(db, row.id, VoteType::Upvote).await.unwrap());
        assert!(!VoteRepository::delete(db, row.id, VoteType::Upvote).await.unwrap());

        // Decrementing a zero counter is refused instead of going below zero.
        votable::adjust_counter::<question::Entity, _>(db, q, VoteType::Upvote, -1)
            .await
            .unwrap();
        assert!(matches!(
            votable::adjust_counter::<question::Entity, _>(db, q, VoteType::Upvote, -1).await,
            Err(TxnError::Conflict("Question"))
        ));
        assert_eq!(app.tally(q).await, (0, 0));
    }

    struct CrashMidSwitch {
        target: Uuid,
    }

    impl Transactional for CrashMidSwitch {
        type Output = ();

        fn name(&self) -> &'static str {
            "crash_mid_switch"
        }

        async fn run(&self, txn: &DatabaseTransaction) -> Result<(), TxnError> {
            votable::adjust_counter::<question::Entity, _>(txn, self.target, VoteType::Downvote, 1)
                .await?;
            votable::adjust_counter::<question::Entity, _>(txn, self.target, VoteType::Upvote, -1)
                .await?;
            Err(AppError::Persistence("connection lost".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_switch_counters_roll_back_together() {
        let app = TestApp::new().await;
        let author = app.user("author").await;
        let voter = app.user("voter").await;
        let q = app.question(author).await;
        app.ctx
            .votes
            .cast_vote(vote(q, TargetKind::Question, VoteType::Upvote), Some(voter))
            .await
            .unwrap();

        let result = run_transaction(
            &app.ctx.db,
            &app.ctx.config.retry_policy(),
            &CrashMidSwitch { target: q },
        )
        .await;

        assert!(result.is_err());
        assert_eq!(app.tally(q).await, (1, 0));
    }
}
