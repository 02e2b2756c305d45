use super::AuthorSummary;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
    pub question_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub id: Uuid,
    pub question_id: Uuid,
    pub author: AuthorSummary,
    pub content: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerSort {
    #[default]
    Latest,
    Oldest,
    Popular,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswersPage {
    pub answers: Vec<AnswerView>,
    pub is_next: bool,
    pub total_answers: u64,
}
