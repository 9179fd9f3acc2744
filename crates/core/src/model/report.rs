use serde::{Deserialize, Serialize};

/// Final payload handed to the persistence collaborator when a lesson ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Integer score in `[0, 100]`.
    pub score: u32,
    pub time_spent_seconds: u64,
    pub attempts: u32,
}

/// Whatever the persistence side grants for a completion; forwarded untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardMetadata {
    pub experience_points: u32,
    pub module_completed: bool,
}
