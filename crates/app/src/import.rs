//! Loading lesson packs from JSON files into the lesson store.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use lesson_core::model::{Lesson, LessonDraft, LessonError};
use storage::repository::{LessonRepository, StorageError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lesson file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("lesson #{index} is invalid: {source}")]
    Invalid {
        index: usize,
        #[source]
        source: LessonError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A file holds either one lesson or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum LessonFile {
    Many(Vec<LessonDraft>),
    One(Box<LessonDraft>),
}

/// Parse and validate every lesson in a JSON document.
///
/// # Errors
///
/// Returns `ImportError` on malformed JSON or the first invalid lesson.
pub fn parse_lessons(json: &str) -> Result<Vec<Lesson>, ImportError> {
    let drafts = match serde_json::from_str::<LessonFile>(json)? {
        LessonFile::Many(drafts) => drafts,
        LessonFile::One(draft) => vec![*draft],
    };
    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            draft
                .validate()
                .map_err(|source| ImportError::Invalid { index, source })
        })
        .collect()
}

/// Store every lesson of `path`, replacing lessons with the same id.
///
/// # Errors
///
/// Returns `ImportError` if the file cannot be read, parsed, or stored.
pub async fn import_file(lessons: &dyn LessonRepository, path: &str) -> Result<usize, ImportError> {
    let json = std::fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_owned(),
        source,
    })?;
    let parsed = parse_lessons(&json)?;
    for lesson in &parsed {
        lessons.upsert_lesson(lesson).await?;
        info!(lesson = %lesson.id(), title = lesson.title(), stages = lesson.total_stages(), "lesson imported");
    }
    Ok(parsed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lesson_core::board::load_position;
    use lesson_core::model::{LessonId, LessonKind};
    use lesson_core::rules::{MoveRequest, RulesEngine, ShakmatyRules};
    use storage::repository::InMemoryRepository;

    const STARTER: &str = include_str!("../lessons/starter.json");

    #[test]
    fn starter_pack_is_valid() {
        let lessons = parse_lessons(STARTER).unwrap();
        let kinds: Vec<LessonKind> = lessons.iter().map(Lesson::kind).collect();
        assert_eq!(
            kinds,
            vec![LessonKind::Puzzle, LessonKind::Theory, LessonKind::Interactive]
        );
        assert_eq!(lessons[1].total_quiz_questions(), 4);
        assert!(lessons[2].stages()[0].is_demonstration);
    }

    #[test]
    fn starter_solutions_are_legal_from_their_positions() {
        let rules = ShakmatyRules::new();
        for lesson in parse_lessons(STARTER).unwrap() {
            for stage in lesson.stages() {
                let loaded = load_position(&rules, stage.position().unwrap_or_default(), false);
                assert!(loaded.notice.is_none(), "stage {} of {}", stage.id, lesson.id());
                if let Some(solution) = stage.solution() {
                    let request = MoveRequest::parse(solution).unwrap();
                    assert!(rules.play(&loaded.board, &request).is_ok(), "{solution}");
                }
            }
        }
    }

    #[test]
    fn single_lesson_documents_are_accepted() {
        let json = r#"{
            "id": 9,
            "title": "Lone slide",
            "kind": "theory",
            "stages": [{ "id": 1, "content": { "type": "slide", "body": "hello" } }]
        }"#;
        let lessons = parse_lessons(json).unwrap();
        assert_eq!(lessons.len(), 1);
        assert_eq!(lessons[0].id(), LessonId::new(9));
    }

    #[test]
    fn invalid_lessons_are_reported_by_position() {
        let json = r#"[{ "id": 1, "title": "  ", "kind": "puzzle", "stages": [] }]"#;
        assert!(matches!(
            parse_lessons(json),
            Err(ImportError::Invalid {
                index: 0,
                source: LessonError::EmptyTitle
            })
        ));
    }

    #[tokio::test]
    async fn importing_stores_every_lesson() {
        let repo = InMemoryRepository::new();
        let path = std::env::temp_dir().join("lessons-import-test.json");
        std::fs::write(&path, STARTER).unwrap();

        let count = import_file(&repo, path.to_str().unwrap()).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(repo.list_lessons().await.unwrap().len(), 3);
        std::fs::remove_file(path).ok();
    }
}
