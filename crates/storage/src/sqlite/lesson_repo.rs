use async_trait::async_trait;
use chrono::Utc;
use lesson_core::model::{Lesson, LessonId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, decode_lesson, encode_lesson, id_to_i64, ser};
use crate::repository::{LessonRepository, StorageError};

#[async_trait]
impl LessonRepository for SqliteRepository {
    async fn upsert_lesson(&self, lesson: &Lesson) -> Result<(), StorageError> {
        let body = encode_lesson(lesson)?;
        sqlx::query(
            r"
            INSERT INTO lessons (id, title, kind, body, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                kind = excluded.kind,
                body = excluded.body,
                updated_at = excluded.updated_at
            ",
        )
        .bind(id_to_i64("lesson_id", lesson.id().value())?)
        .bind(lesson.title())
        .bind(lesson.kind().as_str())
        .bind(body)
        .bind(Utc::now())
        .execute(self.pool())
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query("SELECT body FROM lessons WHERE id = ?1")
            .bind(id_to_i64("lesson_id", id.value())?)
            .fetch_optional(self.pool())
            .await
            .map_err(conn)?;

        match row {
            Some(row) => {
                let body: String = row.try_get("body").map_err(ser)?;
                decode_lesson(&body).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn list_lessons(&self) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query("SELECT body FROM lessons ORDER BY id ASC")
            .fetch_all(self.pool())
            .await
            .map_err(conn)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            let body: String = row.try_get("body").map_err(ser)?;
            lessons.push(decode_lesson(&body)?);
        }
        Ok(lessons)
    }
}
