//! Persistence seam for users, tasks and comments.
//!
//! Resolvers only ever see `dyn Store`; the concrete backend (in-memory or
//! Postgres) is chosen at startup and injected.

use async_trait::async_trait;
use thiserror::Error;

use todolist_auth::User;
use todolist_core::{CommentId, TaskId, UserId};
use todolist_tasks::{Comment, Task};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A uniqueness constraint was violated (username/email already taken).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend failed (connection, query, corrupt row, poisoned lock).
    #[error("storage failure: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User accounts. Usernames and emails are unique.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert_user(&self, user: User) -> StoreResult<()>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    /// Overwrite an existing user. Returns `false` if it no longer exists.
    async fn update_user(&self, user: User) -> StoreResult<bool>;
    async fn delete_user(&self, id: UserId) -> StoreResult<bool>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert_task(&self, task: Task) -> StoreResult<()>;
    async fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>>;
    /// Tasks owned by or shared with `user`.
    async fn list_tasks_visible_to(&self, user: UserId) -> StoreResult<Vec<Task>>;
    async fn list_tasks_owned_by(&self, user: UserId) -> StoreResult<Vec<Task>>;
    async fn update_task(&self, task: Task) -> StoreResult<bool>;
    async fn delete_task(&self, id: TaskId) -> StoreResult<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()>;
    async fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>>;
    async fn list_comments_for_task(&self, task: TaskId) -> StoreResult<Vec<Comment>>;
    async fn list_comments_by_author(&self, author: UserId) -> StoreResult<Vec<Comment>>;
    async fn update_comment(&self, comment: Comment) -> StoreResult<bool>;
    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool>;
    /// Remove every comment of a task. Returns how many were removed.
    async fn delete_comments_for_task(&self, task: TaskId) -> StoreResult<u64>;
}

/// Everything the API needs from storage, as one injectable handle.
pub trait Store: UserRepository + TaskRepository + CommentRepository {}

impl<T> Store for T where T: UserRepository + TaskRepository + CommentRepository {}
