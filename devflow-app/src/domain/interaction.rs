use super::{TargetKind, VoteType};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum InteractionAction {
    #[sea_orm(string_value = "upvote")]
    Upvote,
    #[sea_orm(string_value = "downvote")]
    Downvote,
    #[sea_orm(string_value = "post")]
    Post,
    #[sea_orm(string_value = "delete")]
    Delete,
}

impl From<VoteType> for InteractionAction {
    fn from(vote_type: VoteType) -> Self {
        match vote_type {
            VoteType::Upvote => Self::Upvote,
            VoteType::Downvote => Self::Downvote,
        }
    }
}

impl fmt::Display for InteractionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Upvote => "upvote",
            Self::Downvote => "downvote",
            Self::Post => "post",
            Self::Delete => "delete",
        })
    }
}

/// One committed user action awaiting its audit record and reputation change.
///
/// `event_id` is minted once per logical event; re-delivering the same event
/// is recognised by it and applied at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub event_id: Uuid,
    pub action: InteractionAction,
    pub target_kind: TargetKind,
    pub action_id: Uuid,
    pub performer_id: Uuid,
    pub author_id: Uuid,
}

impl InteractionEvent {
    pub fn new(
        action: InteractionAction,
        target_kind: TargetKind,
        action_id: Uuid,
        performer_id: Uuid,
        author_id: Uuid,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            action,
            target_kind,
            action_id,
            performer_id,
            author_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    AlreadyRecorded,
}
