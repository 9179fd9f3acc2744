use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{LessonId, StageId};
use crate::model::stage::Stage;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("lesson must contain at least one stage")]
    NoStages,

    #[error("duplicate stage id: {0}")]
    DuplicateStage(StageId),

    #[error("invalid quiz question {question} on stage {stage}")]
    InvalidQuizQuestion { stage: StageId, question: usize },
}

//
// ─── KIND & FLAGS ──────────────────────────────────────────────────────────────
//

/// The four lesson flavours. Drives scoring and advance rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonKind {
    Theory,
    Puzzle,
    Interactive,
    Practice,
}

impl LessonKind {
    /// Whether stage boards are judged and scored per attempt.
    #[must_use]
    pub fn is_graded(self) -> bool {
        matches!(self, Self::Puzzle | Self::Interactive)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Theory => "theory",
            Self::Puzzle => "puzzle",
            Self::Interactive => "interactive",
            Self::Practice => "practice",
        }
    }
}

/// Per-lesson switches set by the lesson author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct LessonFlags {
    #[serde(default = "default_true")]
    pub hints_enabled: bool,
    /// Skip local legality checks and relocate pieces freely.
    #[serde(default)]
    pub allow_all_moves: bool,
    /// Accept position descriptions that are not legal game positions.
    #[serde(default)]
    pub allow_invalid_position: bool,
}

fn default_true() -> bool {
    true
}

impl Default for LessonFlags {
    fn default() -> Self {
        Self {
            hints_enabled: true,
            allow_all_moves: false,
            allow_invalid_position: false,
        }
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated lesson as it arrives from a content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonDraft {
    pub id: LessonId,
    pub title: String,
    pub kind: LessonKind,
    #[serde(default)]
    pub flags: LessonFlags,
    #[serde(default)]
    pub expected_duration_secs: Option<u64>,
    pub stages: Vec<Stage>,
}

impl LessonDraft {
    /// Validate the draft into an immutable `Lesson`.
    ///
    /// # Errors
    ///
    /// Returns `LessonError` if the title is blank, there are no stages, stage ids
    /// repeat, or a quiz question is malformed.
    pub fn validate(self) -> Result<Lesson, LessonError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(LessonError::EmptyTitle);
        }
        if self.stages.is_empty() {
            return Err(LessonError::NoStages);
        }

        let mut seen = HashSet::with_capacity(self.stages.len());
        for stage in &self.stages {
            if !seen.insert(stage.id) {
                return Err(LessonError::DuplicateStage(stage.id));
            }
            for (index, question) in stage.quiz().iter().enumerate() {
                if question.options.len() < 2 || question.correct >= question.options.len() {
                    return Err(LessonError::InvalidQuizQuestion {
                        stage: stage.id,
                        question: index,
                    });
                }
            }
        }

        Ok(Lesson {
            id: self.id,
            title,
            kind: self.kind,
            flags: self.flags,
            expected_duration_secs: self.expected_duration_secs,
            stages: self.stages,
        })
    }
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A validated lesson. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lesson {
    id: LessonId,
    title: String,
    kind: LessonKind,
    flags: LessonFlags,
    expected_duration_secs: Option<u64>,
    stages: Vec<Stage>,
}

impl Lesson {
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> LessonKind {
        self.kind
    }

    #[must_use]
    pub fn flags(&self) -> LessonFlags {
        self.flags
    }

    #[must_use]
    pub fn expected_duration_secs(&self) -> Option<u64> {
        self.expected_duration_secs
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    #[must_use]
    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    #[must_use]
    pub fn stage_index(&self, id: StageId) -> Option<usize> {
        self.stages.iter().position(|s| s.id == id)
    }

    #[must_use]
    pub fn total_stages(&self) -> usize {
        self.stages.len()
    }

    /// Number of quiz questions across every slide of the lesson.
    #[must_use]
    pub fn total_quiz_questions(&self) -> usize {
        self.stages.iter().map(|s| s.quiz().len()).sum()
    }

    /// Back to a draft, e.g. for serialization round trips through storage.
    #[must_use]
    pub fn to_draft(&self) -> LessonDraft {
        LessonDraft {
            id: self.id,
            title: self.title.clone(),
            kind: self.kind,
            flags: self.flags,
            expected_duration_secs: self.expected_duration_secs,
            stages: self.stages.clone(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
