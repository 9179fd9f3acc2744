use std::sync::Arc;

use async_trait::async_trait;

use lesson_core::model::{Lesson, LessonId, Stage, StageId};
use storage::repository::LessonRepository;

use super::{HintProvider, HintResponse, MoveValidator, ValidationRequest, Verdict};
use crate::error::RemoteError;

/// Judges moves and serves hints straight from lesson content.
///
/// A move is correct when it matches the stage's canonical solution; stages
/// without a solution accept any legal move.
#[derive(Clone)]
pub struct OfflineJudge {
    lessons: Arc<dyn LessonRepository>,
}

impl OfflineJudge {
    #[must_use]
    pub fn new(lessons: Arc<dyn LessonRepository>) -> Self {
        Self { lessons }
    }

    async fn stage(&self, lesson_id: LessonId, stage_id: StageId) -> Result<Stage, RemoteError> {
        let lesson: Lesson = self
            .lessons
            .get_lesson(lesson_id)
            .await
            .map_err(|e| RemoteError::Unavailable(e.to_string()))?
            .ok_or(RemoteError::UnknownStage {
                lesson: lesson_id,
                stage: stage_id,
            })?;
        lesson
            .stage_index(stage_id)
            .and_then(|index| lesson.stage(index))
            .cloned()
            .ok_or(RemoteError::UnknownStage {
                lesson: lesson_id,
                stage: stage_id,
            })
    }
}

fn same_move(played: &str, solution: &str) -> bool {
    let played = played.trim().to_ascii_lowercase();
    let solution = solution.trim().to_ascii_lowercase();
    // A bare promotion in the solution means a queen.
    played == solution || (solution.len() == 4 && played == format!("{solution}q"))
}

#[async_trait]
impl MoveValidator for OfflineJudge {
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, RemoteError> {
        let stage = self.stage(request.lesson_id, request.stage_id).await?;
        Ok(match stage.solution() {
            Some(solution) if same_move(&request.notation, solution) => Verdict::correct("Correct!"),
            Some(_) => Verdict::wrong("Not the best move"),
            None => Verdict::correct("Well played"),
        })
    }
}

#[async_trait]
impl HintProvider for OfflineJudge {
    async fn next_hint(
        &self,
        lesson_id: LessonId,
        stage_id: StageId,
        index: usize,
    ) -> Result<Option<HintResponse>, RemoteError> {
        let stage = self.stage(lesson_id, stage_id).await?;
        Ok(stage.hints().get(index).map(|text| HintResponse {
            text: text.clone(),
            next_index: Some(index + 1),
        }))
    }
}
