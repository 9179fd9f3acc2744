/// Aggregated view of how far through a lesson the player is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LessonProgress {
    pub total: usize,
    pub completed: usize,
    pub locked: usize,
    pub current: usize,
    pub is_finished: bool,
}
