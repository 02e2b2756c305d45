mod answer;
mod collection;
mod interaction;
mod pagination;
mod question;
mod reputation;
mod user;
mod vote;

pub mod routes;

pub use answer::{AnswerSort, AnswerView, AnswersPage, NewAnswer};
pub use collection::{SaveResult, SavedQuestionsPage, SavedSort};
pub use interaction::{InteractionAction, InteractionEvent, RecordOutcome};
pub use pagination::{PageRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
pub use question::{NewQuestion, QuestionSummary};
pub use reputation::{PointDelta, ReputationPlan};
pub use user::{AuthorSummary, NewUser, UserProfile};
pub use vote::{HasVoted, TargetKind, VoteOutcome, VoteRequest, VoteStatus, VoteType};
