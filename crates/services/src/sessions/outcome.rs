//! Results of player actions, and the tokens that carry an async request
//! from `begin_*` to `complete_*`.

use thiserror::Error;

use lesson_core::board::PositionNotice;
use lesson_core::hints::RevealedHint;
use lesson_core::model::{CompletionReport, Feedback, LessonId, StageId};
use lesson_core::rules::BoardPosition;

use crate::remote::ValidationRequest;

/// Why a move was refused before anything happened.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum MoveRejection {
    #[error("a move is already being checked")]
    Busy,
    #[error("the lesson is finished")]
    NoActiveStage,
    #[error("stage is locked")]
    StageLocked,
    #[error("stage is already solved")]
    StageCompleted,
    #[error("the board is being reset")]
    ResetPending,
}

/// A graded move waiting for the validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMove {
    pub lesson_id: LessonId,
    pub stage_id: StageId,
    pub epoch: u64,
    pub notation: String,
    pub position: BoardPosition,
    pub elapsed_seconds: u64,
    /// Matches the session's outstanding move; settles at most once.
    pub(crate) ticket: u64,
}

impl PendingMove {
    #[must_use]
    pub fn request(&self) -> ValidationRequest {
        ValidationRequest {
            lesson_id: self.lesson_id,
            stage_id: self.stage_id,
            notation: self.notation.clone(),
            resulting_position: self.position.description().to_owned(),
            elapsed_seconds: self.elapsed_seconds,
        }
    }
}

/// First phase of a move.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveStep {
    /// Nothing to wait for.
    Settled(MoveOutcome),
    /// Send `PendingMove::request` to the validator, then `complete_move`.
    Pending(PendingMove),
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Ungraded stage; the move was simply played.
    Played { notation: String, position: BoardPosition },
    /// Rejected by the local rules check.
    Invalid { feedback: Feedback },
    Solved { score: f64, feedback: Feedback },
    Failed {
        remaining: u32,
        feedback: Feedback,
        revealed_hint: Option<RevealedHint>,
    },
    Locked { feedback: Feedback },
    /// The validator could not be reached; nothing was counted.
    Unjudged { feedback: Feedback },
    /// The stage changed while the move was being judged.
    Discarded,
}

impl MoveOutcome {
    #[must_use]
    pub fn feedback(&self) -> Option<&Feedback> {
        match self {
            Self::Invalid { feedback }
            | Self::Solved { feedback, .. }
            | Self::Failed { feedback, .. }
            | Self::Locked { feedback }
            | Self::Unjudged { feedback } => Some(feedback),
            Self::Played { .. } | Self::Discarded => None,
        }
    }
}

/// A manual hint request waiting for the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HintRequest {
    pub lesson_id: LessonId,
    pub stage_id: StageId,
    pub index: usize,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HintOutcome {
    Revealed(RevealedHint),
    Exhausted,
    Unavailable { feedback: Feedback },
    Discarded,
}

/// Where `advance` ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Stage {
        index: usize,
        notice: Option<PositionNotice>,
    },
    Finished(CompletionReport),
}

/// What happened when due timers fired.
#[derive(Debug, Clone, PartialEq)]
pub enum TimerEvent {
    Advanced(Advance),
    PuzzleReset { stage: StageId },
    /// The timer outlived its stage and was dropped.
    Stale { stage: StageId },
}

