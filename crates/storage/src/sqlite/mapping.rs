use lesson_core::model::{Lesson, LessonDraft, LessonId, StageId};
use sqlx::Row;

use crate::repository::{StageProgressRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn stage_id_from_i64(v: i64) -> Result<StageId, StorageError> {
    Ok(StageId::new(i64_to_u64("stage_id", v)?))
}

/// Lessons are stored as the JSON of their draft.
pub(crate) fn encode_lesson(lesson: &Lesson) -> Result<String, StorageError> {
    serde_json::to_string(&lesson.to_draft()).map_err(ser)
}

/// Decode and re-validate a stored lesson body.
pub(crate) fn decode_lesson(body: &str) -> Result<Lesson, StorageError> {
    let draft: LessonDraft = serde_json::from_str(body).map_err(ser)?;
    draft.validate().map_err(ser)
}

pub(crate) fn map_progress_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<StageProgressRecord, StorageError> {
    Ok(StageProgressRecord {
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        stage_id: stage_id_from_i64(row.try_get::<i64, _>("stage_id").map_err(ser)?)?,
        attempts: i64_to_u32("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?,
        best_score: row.try_get::<f64, _>("best_score").map_err(ser)?,
        is_completed: row.try_get::<i64, _>("is_completed").map_err(ser)? != 0,
        is_locked: row.try_get::<i64, _>("is_locked").map_err(ser)? != 0,
    })
}

pub(crate) fn score_from_i64(v: Option<i64>) -> Result<Option<u32>, StorageError> {
    v.map(|score| i64_to_u32("score", score)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_ids_are_rejected() {
        assert!(lesson_id_from_i64(-1).is_err());
        assert_eq!(stage_id_from_i64(4).unwrap(), StageId::new(4));
        assert!(id_to_i64("lesson_id", u64::MAX).is_err());
    }

    #[test]
    fn invalid_lesson_body_is_a_serialization_error() {
        let err = decode_lesson("{\"id\": 1}").unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }
}
