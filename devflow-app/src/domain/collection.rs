use super::QuestionSummary;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub saved: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavedSort {
    #[default]
    MostRecent,
    Oldest,
    MostVoted,
    MostViewed,
    MostAnswered,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedQuestionsPage {
    pub questions: Vec<QuestionSummary>,
    pub is_next: bool,
}
