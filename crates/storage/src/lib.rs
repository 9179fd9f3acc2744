#![forbid(unsafe_code)]

//! Persistence for lesson content and per-player progress.

pub mod repository;
pub mod sqlite;

pub use repository::{
    InMemoryRepository, LessonRepository, ProgressRepository, StageProgressRecord, Storage,
    StorageError,
};
