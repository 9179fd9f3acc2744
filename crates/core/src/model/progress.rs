use serde::{Deserialize, Serialize};

/// Lifecycle of a single stage within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    NotStarted,
    InProgress,
    Completed,
    Locked,
}

impl StageState {
    /// Terminal states allow moving on to the next stage.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Locked)
    }
}

/// Per-stage attempt and score bookkeeping.
///
/// Only the scoring policy mutates this; everyone else reads it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StageProgress {
    attempts: u32,
    best_score: f64,
    is_completed: bool,
    is_locked: bool,
}

impl StageProgress {
    /// Rehydrate progress from persisted storage.
    ///
    /// Values are sanitized so the stage invariants hold: the score is clamped to
    /// `[0, base]`, and a locked stage is always completed with a zero score.
    #[must_use]
    pub fn from_persisted(
        attempts: u32,
        best_score: f64,
        is_completed: bool,
        is_locked: bool,
        base: f64,
    ) -> Self {
        let best_score = if is_locked || !best_score.is_finite() {
            0.0
        } else {
            best_score.clamp(0.0, base.max(0.0))
        };
        Self {
            attempts,
            best_score,
            is_completed: is_completed || is_locked,
            is_locked,
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn best_score(&self) -> f64 {
        self.best_score
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    #[must_use]
    pub fn state(&self) -> StageState {
        if self.is_locked {
            StageState::Locked
        } else if self.is_completed {
            StageState::Completed
        } else if self.attempts > 0 {
            StageState::InProgress
        } else {
            StageState::NotStarted
        }
    }

    pub(crate) fn set_attempts(&mut self, attempts: u32) {
        self.attempts = attempts;
    }

    pub(crate) fn set_best_score(&mut self, best_score: f64) {
        self.best_score = best_score;
    }

    pub(crate) fn mark_completed(&mut self) {
        self.is_completed = true;
    }

    pub(crate) fn mark_locked(&mut self) {
        self.is_completed = true;
        self.is_locked = true;
        self.best_score = 0.0;
    }
}
