use serde::{Deserialize, Serialize};

use crate::model::ids::StageId;
use crate::model::quiz::QuizQuestion;

//
// ─── VISUAL AIDS ───────────────────────────────────────────────────────────────
//

/// Overlay hint drawn by the host on top of the board.
///
/// The engine carries these through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisualAid {
    Arrow { from: String, to: String },
    Highlight { square: String },
}

//
// ─── STAGE CONTENT ─────────────────────────────────────────────────────────────
//

/// Kind-specific payload of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StageContent {
    /// A board to look at or to solve.
    Board {
        /// Starting position description (FEN).
        #[serde(default)]
        position: String,
        /// Canonical solution move notation, e.g. `e2e4` or `e7e8q`.
        #[serde(default)]
        solution: Option<String>,
        #[serde(default)]
        hints: Vec<String>,
        #[serde(default)]
        visual_aids: Vec<VisualAid>,
    },
    /// A theory slide, optionally with a board and quiz questions.
    Slide {
        #[serde(default)]
        body: String,
        #[serde(default)]
        position: Option<String>,
        #[serde(default)]
        quiz: Vec<QuizQuestion>,
        #[serde(default)]
        hints: Vec<String>,
    },
}

/// Delayed automatic advance after the stage is solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoAdvance {
    /// Delay before advancing; the engine default applies when absent.
    #[serde(default)]
    pub delay_ms: Option<u64>,
}

//
// ─── STAGE ─────────────────────────────────────────────────────────────────────
//

/// One step of a lesson. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,
    pub content: StageContent,
    #[serde(default)]
    pub is_demonstration: bool,
    #[serde(default)]
    pub auto_advance: Option<AutoAdvance>,
}

impl Stage {
    /// Position description the board starts from, if the stage shows a board.
    #[must_use]
    pub fn position(&self) -> Option<&str> {
        match &self.content {
            StageContent::Board { position, .. } => Some(position.as_str()),
            StageContent::Slide { position, .. } => position.as_deref(),
        }
    }

    #[must_use]
    pub fn solution(&self) -> Option<&str> {
        match &self.content {
            StageContent::Board { solution, .. } => solution.as_deref(),
            StageContent::Slide { .. } => None,
        }
    }

    #[must_use]
    pub fn hints(&self) -> &[String] {
        match &self.content {
            StageContent::Board { hints, .. } | StageContent::Slide { hints, .. } => hints,
        }
    }

    #[must_use]
    pub fn quiz(&self) -> &[QuizQuestion] {
        match &self.content {
            StageContent::Slide { quiz, .. } => quiz,
            StageContent::Board { .. } => &[],
        }
    }

    #[must_use]
    pub fn visual_aids(&self) -> &[VisualAid] {
        match &self.content {
            StageContent::Board { visual_aids, .. } => visual_aids,
            StageContent::Slide { .. } => &[],
        }
    }

    #[must_use]
    pub fn is_slide(&self) -> bool {
        matches!(self.content, StageContent::Slide { .. })
    }

    #[must_use]
    pub fn has_quiz(&self) -> bool {
        !self.quiz().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn board_stage_deserializes_with_defaults() {
        let json = r#"{
            "id": 3,
            "content": { "type": "board", "position": "8/8/8/8/8/8/8/8 w - - 0 1", "solution": "e2e4" }
        }"#;
        let stage: Stage = serde_json::from_str(json).unwrap();
        assert_eq!(stage.id, StageId::new(3));
        assert_eq!(stage.solution(), Some("e2e4"));
        assert!(stage.hints().is_empty());
        assert!(!stage.is_demonstration);
        assert!(stage.auto_advance.is_none());
    }

    #[test]
    fn slide_without_board_has_no_position() {
        let stage = Stage {
            id: StageId::new(1),
            content: StageContent::Slide {
                body: "The knight moves in an L".into(),
                position: None,
                quiz: Vec::new(),
                hints: Vec::new(),
            },
            is_demonstration: false,
            auto_advance: None,
        };
        assert!(stage.position().is_none());
        assert!(stage.is_slide());
        assert!(!stage.has_quiz());
    }

    #[test]
    fn visual_aids_use_tagged_representation() {
        let aid: VisualAid =
            serde_json::from_str(r#"{ "type": "arrow", "from": "g1", "to": "f3" }"#).unwrap();
        assert_eq!(
            aid,
            VisualAid::Arrow {
                from: "g1".into(),
                to: "f3".into()
            }
        );
    }
}
