use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{CompletionReport, LessonId, RewardMetadata, SessionId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_progress_row, score_from_i64, ser};
use crate::repository::{ProgressRepository, StageProgressRecord, StorageError, reward_for};

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn record_start(
        &self,
        lesson_id: LessonId,
        session_id: SessionId,
        started_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO lesson_starts (lesson_id, session_id, started_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .bind(session_id.to_string())
        .bind(started_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn save_stage_progress(&self, record: &StageProgressRecord) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO stage_progress
                (lesson_id, stage_id, attempts, best_score, is_completed, is_locked, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(lesson_id, stage_id) DO UPDATE SET
                attempts = excluded.attempts,
                best_score = excluded.best_score,
                is_completed = excluded.is_completed,
                is_locked = excluded.is_locked,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id_to_i64("lesson_id", record.lesson_id.value())?)
        .bind(id_to_i64("stage_id", record.stage_id.value())?)
        .bind(i64::from(record.attempts))
        .bind(record.best_score.max(0.0))
        .bind(i64::from(record.is_completed))
        .bind(i64::from(record.is_locked))
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn load_progress(
        &self,
        lesson_id: LessonId,
    ) -> Result<Vec<StageProgressRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT lesson_id, stage_id, attempts, best_score, is_completed, is_locked
            FROM stage_progress
            WHERE lesson_id = ?1
            ORDER BY stage_id ASC
            ",
        )
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        rows.iter().map(map_progress_row).collect()
    }

    async fn record_completion(
        &self,
        lesson_id: LessonId,
        report: &CompletionReport,
        completed_at: DateTime<Utc>,
    ) -> Result<RewardMetadata, StorageError> {
        let lesson = id_to_i64("lesson_id", lesson_id.value())?;
        let mut tx = self.pool().begin().await.map_err(conn)?;

        let row = sqlx::query(
            "SELECT MAX(score) AS best FROM lesson_completions WHERE lesson_id = ?1",
        )
        .bind(lesson)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;
        let previous_best = score_from_i64(row.try_get::<Option<i64>, _>("best").map_err(ser)?)?;
        let reward = reward_for(previous_best, report.score);

        let time_spent = i64::try_from(report.time_spent_seconds)
            .map_err(|_| StorageError::Serialization("time_spent_seconds overflow".into()))?;
        sqlx::query(
            r"
            INSERT INTO lesson_completions
                (lesson_id, score, time_spent_seconds, attempts, experience_points, completed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(lesson)
        .bind(i64::from(report.score))
        .bind(time_spent)
        .bind(i64::from(report.attempts))
        .bind(i64::from(reward.experience_points))
        .bind(completed_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        Ok(reward)
    }
}
