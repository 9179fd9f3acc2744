mod outcome;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use outcome::{
    Advance, HintOutcome, HintRequest, MoveOutcome, MoveRejection, MoveStep, PendingMove,
    TimerEvent,
};
pub use progress::LessonProgress;
pub use service::LessonSession;
pub use view::SessionView;
pub use workflow::LessonLoopService;
