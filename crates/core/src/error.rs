use thiserror::Error;

use crate::model::{LessonError, SettingsError};
use crate::rules::{IllegalMove, PositionParseError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Position(#[from] PositionParseError),
    #[error(transparent)]
    Move(#[from] IllegalMove),
}
