//! In-memory store for tests and single-process dev runs.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use todolist_auth::User;
use todolist_core::{CommentId, Entity, TaskId, UserId};
use todolist_tasks::{Comment, Task};

use super::{CommentRepository, StoreError, StoreResult, TaskRepository, UserRepository};

/// Insertion-ordered collection of entities keyed by id.
#[derive(Debug)]
pub struct InMemoryCollection<V: Entity> {
    inner: RwLock<Rows<V>>,
}

#[derive(Debug)]
struct Rows<V: Entity> {
    by_id: HashMap<V::Id, V>,
    order: Vec<V::Id>,
}

impl<V: Entity> Default for InMemoryCollection<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Entity> InMemoryCollection<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Rows {
                by_id: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }
}

impl<V> InMemoryCollection<V>
where
    V: Entity + Clone,
{
    pub fn get(&self, id: &V::Id) -> StoreResult<Option<V>> {
        let rows = self.inner.read().map_err(|_| poisoned())?;
        Ok(rows.by_id.get(id).cloned())
    }

    /// Matching rows in insertion order.
    pub fn find_all(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Vec<V>> {
        let rows = self.inner.read().map_err(|_| poisoned())?;
        Ok(rows
            .order
            .iter()
            .filter_map(|id| rows.by_id.get(id))
            .filter(|v| pred(*v))
            .cloned()
            .collect())
    }

    pub fn find_first(&self, pred: impl Fn(&V) -> bool) -> StoreResult<Option<V>> {
        let rows = self.inner.read().map_err(|_| poisoned())?;
        Ok(rows
            .order
            .iter()
            .filter_map(|id| rows.by_id.get(id))
            .find(|v| pred(*v))
            .cloned())
    }

    /// Insert a new row. `conflict` is asked about every other row under the
    /// same write lock; returning a message aborts the insert.
    pub fn insert(
        &self,
        value: V,
        conflict: impl Fn(&V, &V) -> Option<String>,
    ) -> StoreResult<()> {
        let mut rows = self.inner.write().map_err(|_| poisoned())?;
        let id = *value.id();
        if rows.by_id.contains_key(&id) {
            return Err(StoreError::Conflict(format!("duplicate id {id:?}")));
        }
        if let Some(msg) = rows.by_id.values().find_map(|other| conflict(&value, other)) {
            return Err(StoreError::Conflict(msg));
        }
        rows.by_id.insert(id, value);
        rows.order.push(id);
        Ok(())
    }

    /// Replace an existing row. Returns `false` if it is gone.
    pub fn replace(
        &self,
        value: V,
        conflict: impl Fn(&V, &V) -> Option<String>,
    ) -> StoreResult<bool> {
        let mut rows = self.inner.write().map_err(|_| poisoned())?;
        let id = *value.id();
        if !rows.by_id.contains_key(&id) {
            return Ok(false);
        }
        if let Some(msg) = rows
            .by_id
            .values()
            .filter(|other| *other.id() != id)
            .find_map(|other| conflict(&value, other))
        {
            return Err(StoreError::Conflict(msg));
        }
        rows.by_id.insert(id, value);
        Ok(true)
    }

    pub fn remove(&self, id: &V::Id) -> StoreResult<bool> {
        self.remove_where(|v| v.id() == id).map(|n| n > 0)
    }

    pub fn remove_where(&self, pred: impl Fn(&V) -> bool) -> StoreResult<u64> {
        let mut rows = self.inner.write().map_err(|_| poisoned())?;
        let before = rows.by_id.len();
        rows.by_id.retain(|_, v| !pred(v));
        let Rows { by_id, order } = &mut *rows;
        order.retain(|id| by_id.contains_key(id));
        Ok((before - rows.by_id.len()) as u64)
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".into())
}

fn no_conflict<V>(_: &V, _: &V) -> Option<String> {
    None
}

fn user_conflict(new: &User, other: &User) -> Option<String> {
    if new.username == other.username {
        return Some(format!("username '{}' is already taken", new.username));
    }
    match (&new.email, &other.email) {
        (Some(a), Some(b)) if a == b => Some(format!("email '{a}' is already registered")),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct InMemoryStore {
    users: InMemoryCollection<User>,
    tasks: InMemoryCollection<Task>,
    comments: InMemoryCollection<Comment>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<()> {
        self.users.insert(user, user_conflict)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        self.users.get(&id)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find_first(|u| u.email.as_deref() == Some(email))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.users.find_first(|u| u.username == username)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        self.users.find_all(|_| true)
    }

    async fn update_user(&self, user: User) -> StoreResult<bool> {
        self.users.replace(user, user_conflict)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        self.users.remove(&id)
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert_task(&self, task: Task) -> StoreResult<()> {
        self.tasks.insert(task, no_conflict)
    }

    async fn get_task(&self, id: TaskId) -> StoreResult<Option<Task>> {
        self.tasks.get(&id)
    }

    async fn list_tasks_visible_to(&self, user: UserId) -> StoreResult<Vec<Task>> {
        self.tasks.find_all(|t| t.is_visible_to(user))
    }

    async fn list_tasks_owned_by(&self, user: UserId) -> StoreResult<Vec<Task>> {
        self.tasks.find_all(|t| t.owner_id() == user)
    }

    async fn update_task(&self, task: Task) -> StoreResult<bool> {
        self.tasks.replace(task, no_conflict)
    }

    async fn delete_task(&self, id: TaskId) -> StoreResult<bool> {
        self.tasks.remove(&id)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn insert_comment(&self, comment: Comment) -> StoreResult<()> {
        self.comments.insert(comment, no_conflict)
    }

    async fn get_comment(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        self.comments.get(&id)
    }

    async fn list_comments_for_task(&self, task: TaskId) -> StoreResult<Vec<Comment>> {
        self.comments.find_all(|c| c.task_id() == task)
    }

    async fn list_comments_by_author(&self, author: UserId) -> StoreResult<Vec<Comment>> {
        self.comments.find_all(|c| c.author_id() == author)
    }

    async fn update_comment(&self, comment: Comment) -> StoreResult<bool> {
        self.comments.replace(comment, no_conflict)
    }

    async fn delete_comment(&self, id: CommentId) -> StoreResult<bool> {
        self.comments.remove(&id)
    }

    async fn delete_comments_for_task(&self, task: TaskId) -> StoreResult<u64> {
        self.comments.remove_where(|c| c.task_id() == task)
    }
}
