#![forbid(unsafe_code)]

//! Domain model and pure policies for guided chess lessons.
//!
//! Everything in this crate is deterministic: time comes from [`Clock`],
//! board legality comes from a [`rules::RulesEngine`] implementation, and no
//! function performs I/O.

pub mod board;
pub mod completion;
pub mod error;
pub mod guard;
pub mod hints;
pub mod model;
pub mod quiz;
pub mod rules;
pub mod scoring;
pub mod time;
pub mod timers;

pub use error::Error;
pub use time::Clock;
