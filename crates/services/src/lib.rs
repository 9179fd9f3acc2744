#![forbid(unsafe_code)]

pub mod error;
pub mod remote;
pub mod sessions;

pub use lesson_core::Clock;
pub use sessions as session;

pub use error::{RemoteError, SessionError};
pub use remote::{
    HintProvider, HintResponse, HttpLessonApi, MoveValidator, OfflineJudge, RemoteConfig,
    ValidationRequest, Verdict,
};
pub use sessions::{
    Advance, HintOutcome, HintRequest, LessonLoopService, LessonProgress, LessonSession,
    MoveOutcome, MoveRejection, MoveStep, PendingMove, SessionView, TimerEvent,
};
