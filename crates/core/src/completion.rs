//! Lesson Completion Reporter: the final score, time and attempt count.

use crate::model::{CompletionReport, StageProgress};
use crate::scoring::MAX_LESSON_SCORE;

/// What the final score of a lesson is computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreBasis {
    /// Puzzle and interactive lessons: the lesson aggregate, penalties applied.
    Graded { aggregate: f64 },
    /// Theory lessons with a quiz.
    Quiz { correct: usize, total: usize },
    /// Theory lessons without a quiz.
    Timed { expected_secs: Option<u64> },
    /// Practice lessons: whatever the player's session reported.
    Practice { score: f64 },
}

/// Clamp to `[0, 100]` and round to an integer.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn finalize_score(raw: f64) -> u32 {
    if raw.is_nan() {
        return 0;
    }
    raw.clamp(0.0, MAX_LESSON_SCORE).round() as u32
}

/// Percentage of quiz questions answered right on the first try.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn quiz_score(correct: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    MAX_LESSON_SCORE * correct.min(total) as f64 / total as f64
}

/// One point lost per minute over the expected duration, never below `floor`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn time_based_score(elapsed_secs: u64, expected_secs: Option<u64>, floor: u32) -> f64 {
    let overtime = expected_secs.map_or(0, |expected| elapsed_secs.saturating_sub(expected));
    let minutes_over = overtime as f64 / 60.0;
    (MAX_LESSON_SCORE - minutes_over).max(f64::from(floor))
}

/// Attempts across all stages, at least one.
#[must_use]
pub fn submitted_attempts<'a>(progress: impl IntoIterator<Item = &'a StageProgress>) -> u32 {
    progress
        .into_iter()
        .fold(0_u32, |sum, stage| sum.saturating_add(stage.attempts()))
        .max(1)
}

/// Assemble the report handed to the persistence collaborator.
#[must_use]
pub fn build_report(
    basis: ScoreBasis,
    time_spent_seconds: u64,
    attempts: u32,
    time_score_floor: u32,
) -> CompletionReport {
    let raw = match basis {
        ScoreBasis::Graded { aggregate } => aggregate,
        ScoreBasis::Quiz { correct, total } => quiz_score(correct, total),
        ScoreBasis::Timed { expected_secs } => {
            time_based_score(time_spent_seconds, expected_secs, time_score_floor)
        }
        ScoreBasis::Practice { score } => score,
    };
    CompletionReport {
        score: finalize_score(raw),
        time_spent_seconds,
        attempts: attempts.max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_minutes_over_costs_two_points() {
        assert_eq!(time_based_score(420, Some(300), 60), 98.0);
        let report = build_report(ScoreBasis::Timed { expected_secs: Some(300) }, 420, 0, 60);
        assert_eq!(report.score, 98);
        assert_eq!(report.attempts, 1);
    }

    #[test]
    fn time_score_has_a_floor_and_needs_an_expectation() {
        assert_eq!(time_based_score(100_000, Some(60), 60), 60.0);
        assert_eq!(time_based_score(100_000, None, 60), 100.0);
        assert_eq!(time_based_score(10, Some(300), 60), 100.0);
    }

    #[test]
    fn quiz_score_uses_first_try_ratio() {
        let report = build_report(ScoreBasis::Quiz { correct: 3, total: 4 }, 30, 0, 60);
        assert_eq!(report.score, 75);
        assert_eq!(quiz_score(2, 3).round(), 67.0);
        assert_eq!(quiz_score(0, 0), 0.0);
    }

    #[test]
    fn scores_are_clamped_and_rounded() {
        assert_eq!(finalize_score(49.995), 50);
        assert_eq!(finalize_score(-3.0), 0);
        assert_eq!(finalize_score(140.0), 100);
        assert_eq!(finalize_score(f64::NAN), 0);
    }

    #[test]
    fn attempts_are_summed_with_a_minimum_of_one() {
        let stages = [
            StageProgress::from_persisted(1, 0.0, true, false, 50.0),
            StageProgress::from_persisted(3, 0.0, true, true, 50.0),
        ];
        assert_eq!(submitted_attempts(&stages), 4);
        assert_eq!(submitted_attempts(&[] as &[StageProgress]), 1);
    }

    #[test]
    fn practice_score_passes_through() {
        let report = build_report(ScoreBasis::Practice { score: 87.4 }, 12, 0, 60);
        assert_eq!(report.score, 87);
        assert_eq!(report.time_spent_seconds, 12);
    }
}
