use serde::{Deserialize, Serialize};

/// A multiple-choice question attached to a theory slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options` of the correct answer.
    pub correct: usize,
}

impl QuizQuestion {
    #[must_use]
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct
    }
}

/// Addresses one question of a lesson: slide index within the lesson, then
/// question index within the slide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionKey {
    pub slide: usize,
    pub question: usize,
}

impl QuestionKey {
    #[must_use]
    pub fn new(slide: usize, question: usize) -> Self {
        Self { slide, question }
    }
}
