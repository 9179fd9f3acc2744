mod attempt;
mod ids;
mod lesson;
mod progress;
mod quiz;
mod report;
mod settings;
mod stage;

pub use attempt::{AttemptOutcome, Feedback, FeedbackKind};
pub use ids::{LessonId, ParseIdError, SessionId, StageId};
pub use lesson::{Lesson, LessonDraft, LessonError, LessonFlags, LessonKind};
pub use progress::{StageProgress, StageState};
pub use quiz::{QuestionKey, QuizQuestion};
pub use report::{CompletionReport, RewardMetadata};
pub use settings::{EngineSettings, SettingsError};
pub use stage::{AutoAdvance, Stage, StageContent, VisualAid};
