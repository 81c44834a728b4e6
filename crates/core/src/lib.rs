//! `todolist-core`: shared domain building blocks.
//!
//! Identifiers and the domain error model. No IO, no transport concerns.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CommentId, TaskId, UserId};
