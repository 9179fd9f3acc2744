use lesson_core::model::{Feedback, LessonKind, StageContent, StageState};

use super::progress::LessonProgress;
use super::service::LessonSession;

/// Presentation-agnostic snapshot of a session.
///
/// No pre-formatted strings beyond what the engine already produced; hosts
/// render it however they like.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub title: String,
    pub kind: LessonKind,
    pub progress: LessonProgress,
    pub stage_state: StageState,
    pub attempts: u32,
    pub best_score: f64,
    pub lesson_score: f64,
    pub running_score: f64,
    pub board: String,
    pub slide_body: Option<String>,
    pub quiz_prompts: Vec<String>,
    pub feedback: Option<Feedback>,
    pub hint: Option<String>,
    pub can_advance: bool,
}

impl LessonSession {
    #[must_use]
    pub fn lesson_progress(&self) -> LessonProgress {
        let completed = self.progress().iter().filter(|p| p.is_completed()).count();
        let locked = self.progress().iter().filter(|p| p.is_locked()).count();
        LessonProgress {
            total: self.lesson().total_stages(),
            completed,
            locked,
            current: self.current_index(),
            is_finished: self.is_finished(),
        }
    }

    #[must_use]
    pub fn view(&self) -> SessionView {
        let stage = self.current_stage();
        let progress = self.current_progress();
        let slide_body = match &stage.content {
            StageContent::Slide { body, .. } => Some(body.clone()),
            StageContent::Board { .. } => None,
        };
        SessionView {
            title: self.lesson().title().to_owned(),
            kind: self.lesson().kind(),
            progress: self.lesson_progress(),
            stage_state: progress.state(),
            attempts: progress.attempts(),
            best_score: progress.best_score(),
            lesson_score: self.lesson_score(),
            running_score: self.running_score(),
            board: self.board().description().to_owned(),
            slide_body,
            quiz_prompts: stage.quiz().iter().map(|q| q.prompt.clone()).collect(),
            feedback: self.feedback().cloned(),
            hint: self.current_hint().map(|h| h.text.clone()),
            can_advance: self.can_advance(),
        }
    }
}
