use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{
    CompletionReport, Lesson, LessonId, RewardMetadata, SessionId, StageId, StageProgress,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape of one stage's progress.
///
/// Kept flat so adapters can store it without knowing the lesson; the
/// session re-sanitizes it against the lesson's base score on load.
#[derive(Debug, Clone, PartialEq)]
pub struct StageProgressRecord {
    pub lesson_id: LessonId,
    pub stage_id: StageId,
    pub attempts: u32,
    pub best_score: f64,
    pub is_completed: bool,
    pub is_locked: bool,
}

impl StageProgressRecord {
    #[must_use]
    pub fn from_progress(lesson_id: LessonId, stage_id: StageId, progress: &StageProgress) -> Self {
        Self {
            lesson_id,
            stage_id,
            attempts: progress.attempts(),
            best_score: progress.best_score(),
            is_completed: progress.is_completed(),
            is_locked: progress.is_locked(),
        }
    }

    /// Convert back into domain progress, clamping the score to `base`.
    #[must_use]
    pub fn into_progress(self, base: f64) -> StageProgress {
        StageProgress::from_persisted(
            self.attempts,
            self.best_score,
            self.is_completed,
            self.is_locked,
            base,
        )
    }
}

/// Reward granted for a completion given the best score recorded before it.
///
/// Experience is the improvement over the previous best; the module counts as
/// completed the first time only.
#[must_use]
pub fn reward_for(previous_best: Option<u32>, score: u32) -> RewardMetadata {
    RewardMetadata {
        experience_points: score.saturating_sub(previous_best.unwrap_or(0)),
        module_completed: previous_best.is_none(),
    }
}

/// Lesson content provider.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist or replace a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError>;

    /// Fetch a lesson by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the stored lesson cannot be read back.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// All lessons, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError>;
}

/// Persistence collaborator for progress and completions.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Note that a session for `lesson_id` has started.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn record_start(
        &self,
        lesson_id: LessonId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Persist or update the progress of a single stage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn save_stage_progress(&self, record: &StageProgressRecord) -> Result<(), StorageError>;

    /// Progress previously saved for a lesson, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn load_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<StageProgressRecord>, StorageError>;

    /// Store a completion and return the reward it earned.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn record_completion(
        &self,
        lesson_id: LessonId,
        report: &CompletionReport,
        completed_at: DateTime<Utc>,
    ) -> Result<RewardMetadata, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    progress: Arc<Mutex<HashMap<(LessonId, StageId), StageProgressRecord>>>,
    starts: Arc<Mutex<Vec<(LessonId, SessionId, DateTime<Utc>)>>>,
    completions: Arc<Mutex<HashMap<LessonId, Vec<CompletionReport>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Completions recorded for a lesson, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn completions(&self, lesson_id: LessonId) -> Result<Vec<CompletionReport>, StorageError> {
        let guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&lesson_id).cloned().unwrap_or_default())
    }

    /// Number of sessions started for a lesson.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn start_count(&self, lesson_id: LessonId) -> Result<usize, StorageError> {
        let guard = self
            .starts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.iter().filter(|(id, _, _)| *id == lesson_id).count())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let mut guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(lesson.id(), lesson.clone());
        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let guard = self
            .lessons
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut lessons: Vec<Lesson> = guard.values().cloned().collect();
        lessons.sort_by_key(Lesson::id);
        Ok(lessons)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_start(
        &self,
        lesson_id: LessonId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = self
            .starts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push((lesson_id, session_id, started_at));
        Ok(())
    }

    async fn save_stage_progress(&self, record: &StageProgressRecord) -> Result<(), StorageError> {
        let mut guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert((record.lesson_id, record.stage_id), record.clone());
        Ok(())
    }

    async fn load_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<StageProgressRecord>, StorageError> {
        let guard = self
            .progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .filter(|record| record.lesson_id == lesson_id)
            .cloned()
            .collect())
    }

    async fn record_completion(
        &self,
        lesson_id: LessonId,
        report: &CompletionReport,
        _completed_at: DateTime<Utc>,
    ) -> Result<RewardMetadata, StorageError> {
        let mut guard = self
            .completions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let history = guard.entry(lesson_id).or_default();
        let previous_best = history.iter().map(|c| c.score).max();
        history.push(*report);
        Ok(reward_for(previous_best, report.score))
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let lessons: Arc<dyn LessonRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self { lessons, progress }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::model::{LessonDraft, LessonFlags, LessonKind, Stage, StageContent};
    use lesson_core::time::fixed_now;

    fn build_lesson(id: u64) -> Lesson {
        LessonDraft {
            id: LessonId::new(id),
            title: format!("Lesson {id}"),
            kind: LessonKind::Puzzle,
            flags: LessonFlags::default(),
            expected_duration_secs: None,
            stages: vec![Stage {
                id: StageId::new(1),
                content: StageContent::Board {
                    position: String::new(),
                    solution: Some("e2e4".into()),
                    hints: Vec::new(),
                    visual_aids: Vec::new(),
                },
                is_demonstration: false,
                auto_advance: None,
            }],
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn lessons_round_trip_and_list_in_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_lesson(&build_lesson(2)).await.unwrap();
        repo.upsert_lesson(&build_lesson(1)).await.unwrap();

        let fetched = repo.get_lesson(LessonId::new(2)).await.unwrap().unwrap();
        assert_eq!(fetched.title(), "Lesson 2");
        assert!(repo.get_lesson(LessonId::new(9)).await.unwrap().is_none());

        let ids: Vec<_> = repo
            .list_lessons()
            .await
            .unwrap()
            .iter()
            .map(Lesson::id)
            .collect();
        assert_eq!(ids, vec![LessonId::new(1), LessonId::new(2)]);
    }

    #[tokio::test]
    async fn progress_is_upserted_per_stage() {
        let repo = InMemoryRepository::new();
        let lesson = LessonId::new(1);
        let mut record = StageProgressRecord {
            lesson_id: lesson,
            stage_id: StageId::new(1),
            attempts: 1,
            best_score: 0.0,
            is_completed: false,
            is_locked: false,
        };
        repo.save_stage_progress(&record).await.unwrap();
        record.attempts = 2;
        record.best_score = 25.0;
        record.is_completed = true;
        repo.save_stage_progress(&record).await.unwrap();

        let loaded = repo.load_progress(lesson).await.unwrap();
        assert_eq!(loaded, vec![record]);
        assert!(repo.load_progress(LessonId::new(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rewards_track_improvement_over_previous_best() {
        let repo = InMemoryRepository::new();
        let lesson = LessonId::new(3);
        let report = |score| CompletionReport {
            score,
            time_spent_seconds: 60,
            attempts: 2,
        };

        let first = repo
            .record_completion(lesson, &report(70), fixed_now())
            .await
            .unwrap();
        assert_eq!(first.experience_points, 70);
        assert!(first.module_completed);

        let worse = repo
            .record_completion(lesson, &report(50), fixed_now())
            .await
            .unwrap();
        assert_eq!(worse.experience_points, 0);
        assert!(!worse.module_completed);

        let better = repo
            .record_completion(lesson, &report(90), fixed_now())
            .await
            .unwrap();
        assert_eq!(better.experience_points, 20);
        assert_eq!(repo.completions(lesson).unwrap().len(), 3);
    }

    #[test]
    fn record_sanitizes_against_base() {
        let record = StageProgressRecord {
            lesson_id: LessonId::new(1),
            stage_id: StageId::new(1),
            attempts: 3,
            best_score: 80.0,
            is_completed: false,
            is_locked: true,
        };
        let progress = record.into_progress(25.0);
        assert_eq!(progress.best_score(), 0.0);
        assert!(progress.is_completed());
    }
}
