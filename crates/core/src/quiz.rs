//! Quiz Scoring Policy: proportional points across every quiz question of a
//! theory lesson.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{EngineSettings, QuestionKey, QuizQuestion};
use crate::scoring::{MAX_LESSON_SCORE, round2};

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizRejection {
    #[error("question already answered correctly")]
    AlreadyResolved,

    #[error("this option was already tried")]
    OptionAlreadyTried,

    #[error("no such option")]
    UnknownOption,
}

/// Points one question is worth; `fallback` when the total is unknown.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn per_question_value(total_questions: usize, fallback: f64) -> f64 {
    if total_questions == 0 {
        fallback
    } else {
        round2(MAX_LESSON_SCORE / total_questions as f64)
    }
}

/// Outcome of one accepted selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuizAnswer {
    pub correct: bool,
    /// Signed change actually applied to the running score (after clamping).
    pub delta: f64,
    pub running: f64,
}

/// Running quiz score plus the per-question records of the current pass.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizScorer {
    per_question: f64,
    wrong_penalty: f64,
    total_questions: usize,
    running: f64,
    selections: HashMap<QuestionKey, usize>,
    tried: HashMap<QuestionKey, HashSet<usize>>,
    resolved: HashSet<QuestionKey>,
    first_try_correct: HashSet<QuestionKey>,
}

impl QuizScorer {
    #[must_use]
    pub fn new(total_questions: usize, settings: &EngineSettings) -> Self {
        let per_question = per_question_value(total_questions, settings.quiz_fallback_value());
        Self {
            per_question,
            wrong_penalty: per_question * settings.quiz_wrong_ratio(),
            total_questions,
            running: 0.0,
            selections: HashMap::new(),
            tried: HashMap::new(),
            resolved: HashSet::new(),
            first_try_correct: HashSet::new(),
        }
    }

    /// Record a selection and apply its score change.
    ///
    /// # Errors
    ///
    /// Returns `QuizRejection` if the question is already resolved, the option
    /// was already tried, or the option does not exist. Rejections change
    /// nothing.
    pub fn answer(
        &mut self,
        key: QuestionKey,
        option: usize,
        question: &QuizQuestion,
    ) -> Result<QuizAnswer, QuizRejection> {
        if option >= question.options.len() {
            return Err(QuizRejection::UnknownOption);
        }
        if self.resolved.contains(&key) {
            return Err(QuizRejection::AlreadyResolved);
        }
        let tried = self.tried.entry(key).or_default();
        let first_try = tried.is_empty();
        if !tried.insert(option) {
            return Err(QuizRejection::OptionAlreadyTried);
        }

        self.selections.insert(key, option);
        let before = self.running;
        let correct = question.is_correct(option);
        if correct {
            self.resolved.insert(key);
            if first_try {
                self.first_try_correct.insert(key);
            }
            self.running = (self.running + self.per_question).min(MAX_LESSON_SCORE);
        } else {
            self.running = (self.running - self.wrong_penalty).max(0.0);
        }

        Ok(QuizAnswer {
            correct,
            delta: self.running - before,
            running: self.running,
        })
    }

    /// Take up to `amount` off the running score; returns what was taken.
    pub fn charge(&mut self, amount: f64) -> f64 {
        let charged = amount.max(0.0).min(self.running);
        self.running -= charged;
        charged
    }

    /// Forget what is selected on screen. Scores and resolved questions stay.
    pub fn clear_selections(&mut self) {
        self.selections.clear();
    }

    #[must_use]
    pub fn selection(&self, key: QuestionKey) -> Option<usize> {
        self.selections.get(&key).copied()
    }

    /// Answered in this visit, or resolved earlier in the lesson.
    #[must_use]
    pub fn is_answered(&self, key: QuestionKey) -> bool {
        self.resolved.contains(&key) || self.selections.contains_key(&key)
    }

    #[must_use]
    pub fn running_score(&self) -> f64 {
        self.running
    }

    #[must_use]
    pub fn per_question(&self) -> f64 {
        self.per_question
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    /// Questions whose first selection was the right one.
    #[must_use]
    pub fn correct_answers(&self) -> usize {
        self.first_try_correct.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuizQuestion {
        QuizQuestion {
            prompt: "Which piece can jump?".into(),
            options: vec!["Bishop".into(), "Knight".into(), "Rook".into()],
            correct: 1,
        }
    }

    fn scorer(total: usize) -> QuizScorer {
        QuizScorer::new(total, &EngineSettings::default())
    }

    #[test]
    fn all_correct_reaches_one_hundred() {
        let mut quiz = scorer(4);
        assert_eq!(quiz.per_question(), 25.0);
        for q in 0..4 {
            quiz.answer(QuestionKey::new(0, q), 1, &question()).unwrap();
        }
        assert_eq!(quiz.running_score(), 100.0);
        assert_eq!(quiz.correct_answers(), 4);
    }

    #[test]
    fn one_wrong_costs_a_fifth_of_a_question() {
        let mut quiz = scorer(4);
        quiz.answer(QuestionKey::new(0, 0), 1, &question()).unwrap();
        let wrong = quiz.answer(QuestionKey::new(0, 1), 0, &question()).unwrap();
        assert!(!wrong.correct);
        assert_eq!(wrong.delta, -5.0);
        for q in 1..4 {
            quiz.answer(QuestionKey::new(0, q), 1, &question()).unwrap();
        }
        assert_eq!(quiz.running_score(), 95.0);
        assert_eq!(quiz.correct_answers(), 3);
    }

    #[test]
    fn penalty_is_floored_at_zero() {
        let mut quiz = scorer(4);
        let answer = quiz.answer(QuestionKey::new(0, 0), 2, &question()).unwrap();
        assert_eq!(answer.running, 0.0);
        assert_eq!(answer.delta, 0.0);
    }

    #[test]
    fn resolved_question_rejects_further_clicks() {
        let mut quiz = scorer(2);
        let key = QuestionKey::new(1, 0);
        quiz.answer(key, 1, &question()).unwrap();
        assert_eq!(
            quiz.answer(key, 1, &question()).unwrap_err(),
            QuizRejection::AlreadyResolved
        );
        assert_eq!(quiz.running_score(), 50.0);
    }

    #[test]
    fn same_wrong_option_cannot_be_retried() {
        let mut quiz = scorer(2);
        let key = QuestionKey::new(0, 0);
        quiz.answer(key, 0, &question()).unwrap();
        assert_eq!(
            quiz.answer(key, 0, &question()).unwrap_err(),
            QuizRejection::OptionAlreadyTried
        );
        assert_eq!(
            quiz.answer(key, 7, &question()).unwrap_err(),
            QuizRejection::UnknownOption
        );
    }

    #[test]
    fn another_option_may_be_tried_until_resolved() {
        let mut quiz = scorer(4);
        let key = QuestionKey::new(0, 0);
        quiz.answer(QuestionKey::new(0, 1), 1, &question()).unwrap();
        quiz.answer(key, 0, &question()).unwrap();
        quiz.answer(key, 2, &question()).unwrap();
        assert_eq!(quiz.running_score(), 15.0);

        let right = quiz.answer(key, 1, &question()).unwrap();
        assert!(right.correct);
        assert_eq!(quiz.running_score(), 40.0);
        assert_eq!(quiz.correct_answers(), 1);
        assert_eq!(
            quiz.answer(key, 0, &question()).unwrap_err(),
            QuizRejection::AlreadyResolved
        );
    }

    #[test]
    fn clearing_selections_keeps_score_and_resolution() {
        let mut quiz = scorer(3);
        let key = QuestionKey::new(0, 0);
        let open = QuestionKey::new(0, 1);
        quiz.answer(key, 1, &question()).unwrap();
        quiz.answer(open, 0, &question()).unwrap();
        let before = quiz.running_score();

        quiz.clear_selections();
        assert_eq!(quiz.selection(key), None);
        assert!(quiz.is_answered(key));
        assert!(!quiz.is_answered(open));
        assert_eq!(quiz.running_score(), before);
    }

    #[test]
    fn charges_never_leave_a_debt() {
        let mut quiz = scorer(4);
        assert_eq!(quiz.charge(5.0), 0.0);
        quiz.answer(QuestionKey::new(0, 0), 1, &question()).unwrap();
        assert_eq!(quiz.running_score(), 25.0);

        assert_eq!(quiz.charge(5.0), 5.0);
        assert_eq!(quiz.running_score(), 20.0);
    }

    #[test]
    fn unknown_total_uses_fallback_value() {
        let quiz = scorer(0);
        assert_eq!(quiz.per_question(), 10.0);
        assert_eq!(per_question_value(3, 10.0), 33.33);
    }
}
