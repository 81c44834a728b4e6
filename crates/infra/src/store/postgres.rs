//! Postgres-backed store.
//!
//! ## Error Mapping
//!
//! | SQLx error | Postgres code | StoreError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | any | `Backend` |
//! | Pool / IO / decode | n/a | `Backend` |
//!
//! Rows that fail to decode into domain types (unknown role, bad status) are
//! reported as `Backend` errors rather than silently skipped.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use todolist_auth::{Role, User};
use todolist_core::{CommentId, TaskId, UserId};
use todolist_tasks::{Comment, Task, TaskStatus};

use super::{CommentRepository, StoreError, StoreResult, TaskRepository, UserRepository};

const SCHEMA: &str = include_str!("../../migrations/0001_init.sql");

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, retrying up to `retries` times with `delay` between attempts.
    pub async fn connect_with_retry(url: &str, retries: u32, delay: Duration) -> StoreResult<Self> {
        let attempts = retries.max(1);
        let mut last_err = None;

        for attempt in 1..=attempts {
            match PgPoolOptions::new().max_connections(10).connect(url).await {
                Ok(pool) => {
                    info!(attempt, "connected to postgres");
                    return Ok(Self::new(pool));
                }
                Err(e) => {
                    warn!(attempt, attempts, error = %e, "failed to connect to postgres");
                    last_err = Some(e);
                    if attempt < attempts {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(StoreError::Backend(format!(
            "could not connect to postgres after {attempts} attempts: {}",
            last_err.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Backend(msg),
            }
        }
        other => StoreError::Backend(format!("{operation}: {other}")),
    }
}

fn corrupt(what: &str, detail: impl core::fmt::Display) -> StoreError {
    StoreError::Backend(format!("corrupt {what} row: {detail}"))
}

// ─────────────────────────────────────────────────────────────────────────────
// Row mapping
// ─────────────────────────────────────────────────────────────────────────────

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    let decode = |e: sqlx::Error| corrupt("user", e);
    let role: String = row.try_get("role").map_err(decode)?;
    let token_version: i64 = row.try_get("token_version").map_err(decode)?;

    Ok(User {
        id: UserId::from_uuid(row.try_get("id").map_err(decode)?),
        email: row.try_get("email").map_err(decode)?,
        username: row.try_get("username").map_err(decode)?,
        role: role.parse::<Role>().map_err(|e| corrupt("user", e))?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        token_version: u64::try_from(token_version).map_err(|e| corrupt("user", e))?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(decode)?,
    })
}

fn task_from_row(row: &PgRow) -> StoreResult<Task> {
    let decode = |e: sqlx::Error| corrupt("task", e);
    let status: String = row.try_get("status").map_err(decode)?;
    let access: Vec<Uuid> = row.try_get("access").map_err(decode)?;

    Ok(Task::from_parts(
        TaskId::from_uuid(row.try_get("id").map_err(decode)?),
        row.try_get("name").map_err(decode)?,
        row.try_get("description").map_err(decode)?,
        status.parse::<TaskStatus>().map_err(|e| corrupt("task", e))?,
        UserId::from_uuid(row.try_get("owner_id").map_err(decode)?),
        access.into_iter().map(UserId::from_uuid).collect(),
    ))
}

fn comment_from_row(row: &PgRow) -> StoreResult<Comment> {
    let decode = |e: sqlx::Error| corrupt("comment", e);
    Ok(Comment::from_parts(
        CommentId::from_uuid(row.try_get("id").map_err(decode)?),
        UserId::from_uuid(row.try_get("author_id").map_err(decode)?),
        TaskId::from_uuid(row.try_get("task_id").map_err(decode)?),
        row.try_get("text").map_err(decode)?,
        row.try_get("created_at").map_err(decode)?,
    ))
}

fn access_uuids(task: &Task) -> Vec<Uuid> {
    task.access().iter().map(|id| *id.as_uuid()).collect()
}

const USER_COLUMNS: &str = "id, email, username, role, password_hash, token_version, created_at";
const TASK_COLUMNS: &str = "id, name, description, status, owner_id, access";
const COMMENT_COLUMNS: &str = "id, author_id, task_id, text, created_at";

// ─────────────────────────────────────────────────────────────────────────────
// Repositories
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip_all, fields(user_id = %user.id), err)]
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO users (id, email, username, role, password_hash, token_version, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.token_version as i64)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_username", e))?
            .as_ref()
            .map(user_from_row)
            .transpose()
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at, username"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?
            .iter()
            .map(user_from_row)
            .collect()
    }

    #[instrument(skip_all, fields(user_id = %user.id), err)]
    async fn update_user(&self, user: User) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE users
             SET email = $2, username = $3, role = $4, password_hash = $5, token_version = $6
             WHERE id = $1",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role.as_str())
        .bind(&user.password_hash)
        .bind(user.token_version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TaskRepository for PgStore {
    async fn insert_task(&self, task: Task) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO tasks (id, name, description, status, owner_id, access)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(todolist_core::Entity::id(&task).as_uuid())
        .bind(task.name())
        .bind(task.description())
        .bind(task.status().as_str())
        .bind(task.owner_id().as_uuid())
        .bind(access_uuids(&task))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_task", e))?;
        Ok(())
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        sqlx::query(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_task", e))?
            .as_ref()
            .map(task_from_row)
            .transpose()
    }

    async fn list_tasks_visible_to(&self, user: UserId) -> StoreResult<Vec<Task>> {
        sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE owner_id = $1 OR $1 = ANY(access)
             ORDER BY created_at"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks_visible_to", e))?
        .iter()
        .map(task_from_row)
        .collect()
    }

    async fn list_tasks_owned_by(&self, user: UserId) -> StoreResult<Vec<Task>> {
        sqlx::query(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(user.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_tasks_owned_by", e))?
        .iter()
        .map(task_from_row)
        .collect()
    }

    async fn update_task(&self, task: Task) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE tasks
             SET name = $2, description = $3, status = $4, access = $5
             WHERE id = $1",
        )
        .bind(todolist_core::Entity::id(&task).as_uuid())
        .bind(task.name())
        .bind(task.description())
        .bind(task.status().as_str())
        .bind(access_uuids(&task))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_task", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_task", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CommentRepository for PgStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO comments (id, author_id, task_id, text, created_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(todolist_core::Entity::id(&comment).as_uuid())
        .bind(comment.author_id().as_uuid())
        .bind(comment.task_id().as_uuid())
        .bind(comment.text())
        .bind(comment.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_comment", e))?;
        Ok(())
    }

    async fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        sqlx::query(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_comment", e))?
            .as_ref()
            .map(comment_from_row)
            .transpose()
    }

    async fn list_comments_for_task(&self, task: TaskId) -> StoreResult<Vec<Comment>> {
        sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE task_id = $1 ORDER BY created_at"
        ))
        .bind(task.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_comments_for_task", e))?
        .iter()
        .map(comment_from_row)
        .collect()
    }

    async fn list_comments_by_author(&self, author: UserId) -> StoreResult<Vec<Comment>> {
        sqlx::query(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE author_id = $1 ORDER BY created_at"
        ))
        .bind(author.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_comments_by_author", e))?
        .iter()
        .map(comment_from_row)
        .collect()
    }

    async fn update_comment(&self, comment: Comment) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE comments SET text = $2 WHERE id = $1")
            .bind(todolist_core::Entity::id(&comment).as_uuid())
            .bind(comment.text())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_comment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_comment", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_comments_for_task(&self, task: TaskId) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM comments WHERE task_id = $1")
            .bind(task.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_comments_for_task", e))?;
        Ok(result.rows_affected())
    }
}
