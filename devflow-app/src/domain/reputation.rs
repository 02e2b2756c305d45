use super::{InteractionAction, TargetKind};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointDelta {
    pub performer: i64,
    pub author: i64,
}

impl PointDelta {
    pub fn for_interaction(action: InteractionAction, target_kind: TargetKind) -> Self {
        let (performer, author) = match (action, target_kind) {
            (InteractionAction::Upvote, _) => (2, 10),
            (InteractionAction::Downvote, _) => (-1, -2),
            (InteractionAction::Post, TargetKind::Question) => (0, 5),
            (InteractionAction::Post, TargetKind::Answer) => (0, 10),
            (InteractionAction::Delete, TargetKind::Question) => (0, -5),
            (InteractionAction::Delete, TargetKind::Answer) => (0, -10),
        };
        Self { performer, author }
    }
}

/// Reputation changes owed for one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReputationPlan {
    /// Performer and author are the same user: only the author delta applies.
    SelfAction { user: Uuid, delta: i64 },
    Split {
        performer: Uuid,
        performer_delta: i64,
        author: Uuid,
        author_delta: i64,
    },
}

impl ReputationPlan {
    pub fn for_interaction(
        action: InteractionAction,
        target_kind: TargetKind,
        performer: Uuid,
        author: Uuid,
    ) -> Self {
        let delta = PointDelta::for_interaction(action, target_kind);
        if performer == author {
            Self::SelfAction {
                user: author,
                delta: delta.author,
            }
        } else {
            Self::Split {
                performer,
                performer_delta: delta.performer,
                author,
                author_delta: delta.author,
            }
        }
    }
}
