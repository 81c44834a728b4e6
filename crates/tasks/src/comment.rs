use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use todolist_auth::Protected;
use todolist_core::{CommentId, DomainError, DomainResult, Entity, TaskId, UserId};

/// Upper bound on comment length, in characters.
pub const MAX_COMMENT_LEN: usize = 4000;

/// A comment left by a user on a task. Only its author may edit or delete it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    id: CommentId,
    author_id: UserId,
    task_id: TaskId,
    text: String,
    created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        id: CommentId,
        author_id: UserId,
        task_id: TaskId,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            author_id,
            task_id,
            text: normalize_text(text)?,
            created_at,
        })
    }

    /// Rebuild a comment from stored fields.
    pub fn from_parts(
        id: CommentId,
        author_id: UserId,
        task_id: TaskId,
        text: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            task_id,
            text,
            created_at,
        }
    }

    pub fn author_id(&self) -> UserId {
        self.author_id
    }

    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn edit(&mut self, text: &str) -> DomainResult<()> {
        self.text = normalize_text(text)?;
        Ok(())
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Protected for Comment {
    const KIND: &'static str = "comment";

    fn owner(&self) -> UserId {
        self.author_id
    }
}

fn normalize_text(text: &str) -> DomainResult<String> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::validation("comment text must not be empty"));
    }
    if text.chars().count() > MAX_COMMENT_LEN {
        return Err(DomainError::validation(format!(
            "comment text must be at most {MAX_COMMENT_LEN} characters"
        )));
    }
    Ok(text.to_string())
}
