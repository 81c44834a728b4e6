use chrono::Utc;
use tracing::{info, instrument};

use todolist_auth::{authorize, check_capability, Capability, Principal};
use todolist_core::{CommentId, Entity, TaskId};
use todolist_infra::CommentRepository;
use todolist_tasks::Comment;

use crate::app::dto::{CommentChanges, NewComment};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

impl AppServices {
    /// Comment on a task the caller can see.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), task_id = %input.task_id))]
    pub async fn add_comment(
        &self,
        caller: Option<&Principal>,
        input: NewComment,
    ) -> Result<Comment, ApiError> {
        let author = authorize(caller, &[])?;
        let task = self.load_task(input.task_id).await?;
        check_capability(caller, &[], &task, Capability::Read)?;

        let comment = Comment::new(CommentId::new(), author.id, input.task_id, &input.text, Utc::now())?;
        self.store.insert_comment(comment.clone()).await?;
        info!(comment_id = %comment.id(), "comment added");
        Ok(comment)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), id = %input.id))]
    pub async fn update_comment(
        &self,
        caller: Option<&Principal>,
        input: CommentChanges,
    ) -> Result<Comment, ApiError> {
        let mut comment = self.authored_comment(caller, input.id).await?;
        comment.edit(&input.text)?;

        if !self.store.update_comment(comment).await? {
            return Err(ApiError::not_found(format!("comment {}", input.id)));
        }
        self.load_comment(input.id).await
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn delete_comment(&self, caller: Option<&Principal>, id: CommentId) -> Result<bool, ApiError> {
        self.authored_comment(caller, id).await?;
        if !self.store.delete_comment(id).await? {
            return Err(ApiError::not_found(format!("comment {id}")));
        }
        Ok(true)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn get_my_comments(&self, caller: Option<&Principal>) -> Result<Vec<Comment>, ApiError> {
        let caller = authorize(caller, &[])?;
        Ok(self.store.list_comments_by_author(caller.id).await?)
    }

    /// Comments of a task, for callers who can see the task.
    pub async fn task_comments(
        &self,
        caller: Option<&Principal>,
        task_id: TaskId,
    ) -> Result<Vec<Comment>, ApiError> {
        self.get_task(caller, task_id).await?;
        Ok(self.store.list_comments_for_task(task_id).await?)
    }

    async fn authored_comment(
        &self,
        caller: Option<&Principal>,
        id: CommentId,
    ) -> Result<Comment, ApiError> {
        authorize(caller, &[])?;
        let comment = self.load_comment(id).await?;
        check_capability(caller, &[], &comment, Capability::Mutate)?;
        Ok(comment)
    }
}
