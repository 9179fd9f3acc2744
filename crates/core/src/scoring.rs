//! Stage Scoring Policy: worth of a stage, attempt decay, lockout.
//!
//! All functions are pure; they take the current `StageProgress` and return
//! what changed.

use crate::model::{LessonKind, Stage, StageProgress};

/// Total points a lesson is worth.
pub const MAX_LESSON_SCORE: f64 = 100.0;

/// Rounds to two decimals, the precision scores are displayed with.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of the lesson's 100 points a single stage is worth.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_stage_base(total_stages: usize) -> f64 {
    if total_stages == 0 {
        return 0.0;
    }
    round2(MAX_LESSON_SCORE / total_stages as f64)
}

/// Score for solving a stage after `attempts_before` unsuccessful tries:
/// `base / 2^attempts_before`.
#[must_use]
pub fn success_score(base: f64, attempts_before: u32) -> f64 {
    let exponent = i32::try_from(attempts_before).unwrap_or(i32::MAX);
    base / 2_f64.powi(exponent)
}

/// Whether moves on `stage` are judged and scored per attempt.
///
/// Demonstrations, slides and practice lessons are never graded; other
/// non-graded lessons grade only boards that carry a solution.
#[must_use]
pub fn is_graded_stage(kind: LessonKind, stage: &Stage) -> bool {
    if stage.is_demonstration || stage.is_slide() || kind == LessonKind::Practice {
        return false;
    }
    kind.is_graded() || stage.solution().is_some()
}

/// What a scoring decision did to a stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StageTransition {
    /// Solved; `score` is what this success was worth.
    Solved { score: f64 },
    /// Not solved, but more attempts remain.
    Retry { remaining: u32 },
    /// Out of attempts; the stage is closed with zero points.
    Locked,
}

/// Scoring rules for the stages of one lesson.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagePolicy {
    base: f64,
    max_attempts: u32,
}

impl StagePolicy {
    #[must_use]
    pub fn new(total_stages: usize, max_attempts: u32) -> Self {
        Self {
            base: per_stage_base(total_stages),
            max_attempts: max_attempts.max(1),
        }
    }

    #[must_use]
    pub fn base(&self) -> f64 {
        self.base
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Apply a judged-correct attempt.
    pub fn apply_success(&self, progress: &mut StageProgress) -> StageTransition {
        let score = success_score(self.base, progress.attempts());
        progress.set_attempts(progress.attempts().saturating_add(1));
        let best = progress.best_score().max(score).clamp(0.0, self.base);
        progress.set_best_score(best);
        progress.mark_completed();
        StageTransition::Solved { score }
    }

    /// Apply a judged-wrong attempt; locks once the limit is reached.
    pub fn apply_failure(&self, progress: &mut StageProgress) -> StageTransition {
        let attempts = progress.attempts().saturating_add(1);
        progress.set_attempts(attempts);
        if attempts >= self.max_attempts {
            progress.mark_locked();
            StageTransition::Locked
        } else {
            StageTransition::Retry {
                remaining: self.max_attempts - attempts,
            }
        }
    }

    /// A manual reset forfeits one attempt. Reaching the limit zeroes the
    /// score and locks the stage, so a later solve cannot score it again.
    pub fn apply_reset(&self, progress: &mut StageProgress) -> StageTransition {
        let attempts = progress.attempts().saturating_add(1);
        progress.set_attempts(attempts);
        if attempts >= self.max_attempts {
            progress.mark_locked();
            StageTransition::Locked
        } else {
            StageTransition::Retry {
                remaining: self.max_attempts - attempts,
            }
        }
    }

    /// Demonstration stages are complete and fully scored as soon as shown.
    pub fn apply_demonstration(&self, progress: &mut StageProgress) {
        progress.set_attempts(0);
        progress.set_best_score(self.base);
        progress.mark_completed();
    }

    /// Ungraded stages count as done once the player moves past them.
    pub fn apply_visit(&self, progress: &mut StageProgress) {
        progress.mark_completed();
    }

    /// Sanitize persisted values against this lesson's base.
    #[must_use]
    pub fn hydrate(
        &self,
        attempts: u32,
        best_score: f64,
        is_completed: bool,
        is_locked: bool,
    ) -> StageProgress {
        StageProgress::from_persisted(attempts, best_score, is_completed, is_locked, self.base)
    }
}

/// Lesson aggregate: sum of best scores capped at 100, minus penalties,
/// floored at zero.
#[must_use]
pub fn lesson_score<'a>(progress: impl IntoIterator<Item = &'a StageProgress>, penalty: f64) -> f64 {
    let sum: f64 = progress.into_iter().map(StageProgress::best_score).sum();
    (sum.min(MAX_LESSON_SCORE) - penalty.max(0.0)).max(0.0)
}
