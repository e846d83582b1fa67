pub mod board;
pub mod job;

pub use board::JobBoard;
pub use job::{ChecklistItem, Job, JobState, Rating};
