//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{LessonError, LessonId, StageId};
use lesson_core::quiz::QuizRejection;
use storage::repository::StorageError;

use crate::sessions::MoveRejection;

/// Errors from the remote validation and hint collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteError {
    #[error("remote lesson api is not configured")]
    Disabled,
    #[error("remote lesson api returned status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),
    #[error("unknown stage {stage} in lesson {lesson}")]
    UnknownStage { lesson: LessonId, stage: StageId },
}

/// Errors emitted by lesson sessions and their orchestration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("lesson {0} could not be loaded")]
    ContentLoad(LessonId),
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error("current stage is not finished yet")]
    AdvanceBlocked,
    #[error("already at the first stage")]
    AtFirstStage,
    #[error("stage is locked")]
    StageLocked,
    #[error("another request is still in flight")]
    Busy,
    #[error("lesson is not finished")]
    NotFinished,
    #[error("lesson is already finished")]
    Finished,
    #[error("only practice lessons can be finished on demand")]
    NotPractice,
    #[error("current stage has no quiz question {0}")]
    NoSuchQuestion(usize),
    #[error(transparent)]
    Quiz(#[from] QuizRejection),
    #[error(transparent)]
    Move(#[from] MoveRejection),
    #[error("failed to submit completion: {0}")]
    CompletionSubmit(#[source] StorageError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
