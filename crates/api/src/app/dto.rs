//! Typed operation inputs, decoupled from the GraphQL input objects.
//!
//! The schema layer parses ids and enums into these; services never see raw
//! strings for identifiers.

use todolist_auth::Role;
use todolist_core::{CommentId, TaskId, UserId};
use todolist_tasks::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: Option<String>,
    pub username: String,
    pub role: Option<Role>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserChanges {
    pub id: UserId,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskChanges {
    pub id: TaskId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareTask {
    pub id: TaskId,
    pub to_users: Vec<UserId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    pub task_id: TaskId,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentChanges {
    pub id: CommentId,
    pub text: String,
}
