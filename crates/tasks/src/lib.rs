//! Task and comment domain module.
//!
//! Business rules for tasks, sharing and comments, implemented as plain
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod comment;
pub mod task;

pub use comment::{Comment, MAX_COMMENT_LEN};
pub use task::{Task, TaskPatch, TaskStatus, MIN_TASK_NAME_LEN};
