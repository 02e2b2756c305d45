use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a vote or save action points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    #[sea_orm(string_value = "question")]
    Question,
    #[sea_orm(string_value = "answer")]
    Answer,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Answer => "answer",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    #[sea_orm(string_value = "upvote")]
    Upvote,
    #[sea_orm(string_value = "downvote")]
    Downvote,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
        }
    }
}

impl fmt::Display for VoteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub target_id: Uuid,
    pub target_type: TargetKind,
    pub vote_type: VoteType,
}

/// The actor's vote on a target. `NoVoteFound` is an answer, not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "voteType", rename_all = "camelCase")]
pub enum VoteStatus {
    NoVoteFound,
    Voted(VoteType),
}

impl VoteStatus {
    pub fn has_upvoted(&self) -> bool {
        matches!(self, Self::Voted(VoteType::Upvote))
    }

    pub fn has_downvoted(&self) -> bool {
        matches!(self, Self::Voted(VoteType::Downvote))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasVoted {
    pub has_upvoted: bool,
    pub has_downvoted: bool,
}

impl From<VoteStatus> for HasVoted {
    fn from(status: VoteStatus) -> Self {
        Self {
            has_upvoted: status.has_upvoted(),
            has_downvoted: status.has_downvoted(),
        }
    }
}

/// Result of a vote toggle: the actor's state afterwards and the fresh tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub status: VoteStatus,
    pub upvotes: i32,
    pub downvotes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_request_wire_format() {
        let req: VoteRequest = serde_json::from_value(serde_json::json!({
            "targetId": "6f9619ff-8b86-d011-b42d-00c04fc964ff",
            "targetType": "answer",
            "voteType": "downvote",
        }))
        .unwrap();
        assert_eq!(req.target_type, TargetKind::Answer);
        assert_eq!(req.vote_type, VoteType::Downvote);
    }

    #[test]
    fn test_has_voted_flags() {
        assert_eq!(
            HasVoted::from(VoteStatus::NoVoteFound),
            HasVoted { has_upvoted: false, has_downvoted: false }
        );
        let down = HasVoted::from(VoteStatus::Voted(VoteType::Downvote));
        assert!(!down.has_upvoted);
        assert!(down.has_downvoted);
    }
}
