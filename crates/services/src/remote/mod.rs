//! Collaborators that judge moves and hand out hints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use lesson_core::model::{LessonId, StageId};

use crate::error::RemoteError;

mod http;
mod offline;

pub use http::{HttpLessonApi, RemoteConfig};
pub use offline::OfflineJudge;

/// A graded move waiting for a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub lesson_id: LessonId,
    pub stage_id: StageId,
    pub notation: String,
    pub resulting_position: String,
    pub elapsed_seconds: u64,
}

/// How the collaborator judged a move.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub success: bool,
    #[serde(default)]
    pub feedback_type: String,
    #[serde(default)]
    pub feedback_message: String,
}

impl Verdict {
    #[must_use]
    pub fn correct(message: impl Into<String>) -> Self {
        Self {
            success: true,
            feedback_type: "success".into(),
            feedback_message: message.into(),
        }
    }

    #[must_use]
    pub fn wrong(message: impl Into<String>) -> Self {
        Self {
            success: false,
            feedback_type: "failure".into(),
            feedback_message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintResponse {
    #[serde(alias = "hint")]
    pub text: String,
    /// Where the next request should continue, when the provider says so.
    #[serde(default)]
    pub next_index: Option<usize>,
}

#[async_trait]
pub trait MoveValidator: Send + Sync {
    /// Judge a move that already passed the local legality check.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` when no verdict could be obtained.
    async fn validate(&self, request: &ValidationRequest) -> Result<Verdict, RemoteError>;
}

#[async_trait]
pub trait HintProvider: Send + Sync {
    /// The hint at `index` for a stage, or `None` when there are no more.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` when the provider cannot be reached.
    async fn next_hint(
        &self,
        lesson_id: LessonId,
        stage_id: StageId,
        index: usize,
    ) -> Result<Option<HintResponse>, RemoteError>;
}
