use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a message shown to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Success,
    Failure,
    Invalid,
    Warning,
    Info,
    Error,
}

impl FeedbackKind {
    /// Maps a remote `feedbackType` string, defaulting by verdict.
    #[must_use]
    pub fn from_remote(raw: &str, success: bool) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" | "correct" => Self::Success,
            "failure" | "incorrect" | "wrong" => Self::Failure,
            "invalid" => Self::Invalid,
            "warning" => Self::Warning,
            "info" => Self::Info,
            "error" => Self::Error,
            _ if success => Self::Success,
            _ => Self::Failure,
        }
    }
}

/// Transient feedback event produced by an attempt or a policy decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub kind: FeedbackKind,
    pub message: String,
}

impl Feedback {
    #[must_use]
    pub fn new(kind: FeedbackKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn invalid_move() -> Self {
        Self::new(FeedbackKind::Invalid, "invalid move")
    }

    #[must_use]
    pub fn stage_locked() -> Self {
        Self::new(FeedbackKind::Warning, "stage is locked")
    }

    #[must_use]
    pub fn try_again() -> Self {
        Self::new(
            FeedbackKind::Error,
            "could not check your move, please try again",
        )
    }

    #[must_use]
    pub fn locked_out(max_attempts: u32) -> Self {
        Self::new(
            FeedbackKind::Warning,
            format!("{max_attempts} attempts failed, moving on"),
        )
    }

    /// Decorates a failure message with the remaining attempt count.
    #[must_use]
    pub fn with_remaining(mut self, remaining: u32) -> Self {
        let suffix = if remaining == 1 {
            "1 attempt remaining".to_owned()
        } else {
            format!("{remaining} attempts remaining")
        };
        if self.message.trim().is_empty() {
            self.message = suffix;
        } else {
            self.message = format!("{} ({suffix})", self.message.trim_end());
        }
        self
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// How a judged attempt turned out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failure,
    Invalid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_suffix_is_appended() {
        let feedback = Feedback::new(FeedbackKind::Failure, "Not the best move").with_remaining(2);
        assert_eq!(feedback.message, "Not the best move (2 attempts remaining)");

        let bare = Feedback::new(FeedbackKind::Failure, "").with_remaining(1);
        assert_eq!(bare.message, "1 attempt remaining");
    }

    #[test]
    fn remote_kind_falls_back_to_verdict() {
        assert_eq!(FeedbackKind::from_remote("CORRECT", true), FeedbackKind::Success);
        assert_eq!(FeedbackKind::from_remote("???", true), FeedbackKind::Success);
        assert_eq!(FeedbackKind::from_remote("", false), FeedbackKind::Failure);
        assert_eq!(FeedbackKind::from_remote("warning", false), FeedbackKind::Warning);
    }

    #[test]
    fn lockout_message_names_the_limit() {
        assert_eq!(Feedback::locked_out(3).message, "3 attempts failed, moving on");
    }
}
