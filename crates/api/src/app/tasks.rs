//! Task operations. Reads follow the access list; every mutation is
//! owner-only, with no ADMIN bypass.

use tracing::{info, instrument};

use todolist_auth::{authorize, check_capability, Capability, Principal};
use todolist_core::{Entity, TaskId};
use todolist_infra::{CommentRepository, TaskRepository, UserRepository};
use todolist_tasks::{Task, TaskPatch, TaskStatus};

use crate::app::dto::{NewTask, ShareTask, TaskChanges};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

impl AppServices {
    /// Tasks owned by or shared with the caller.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn get_all_tasks(&self, caller: Option<&Principal>) -> Result<Vec<Task>, ApiError> {
        let caller = authorize(caller, &[])?;
        Ok(self.store.list_tasks_visible_to(caller.id).await?)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn get_own_tasks(&self, caller: Option<&Principal>) -> Result<Vec<Task>, ApiError> {
        let caller = authorize(caller, &[])?;
        Ok(self.store.list_tasks_owned_by(caller.id).await?)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn get_task(&self, caller: Option<&Principal>, id: TaskId) -> Result<Task, ApiError> {
        authorize(caller, &[])?;
        let task = self.load_task(id).await?;
        check_capability(caller, &[], &task, Capability::Read)?;
        Ok(task)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn add_task(&self, caller: Option<&Principal>, input: NewTask) -> Result<Task, ApiError> {
        let caller = authorize(caller, &[])?;
        let task = Task::new(
            TaskId::new(),
            caller.id,
            &input.name,
            input.description.as_deref(),
            input.status.unwrap_or_default(),
        )?;

        self.store.insert_task(task.clone()).await?;
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), id = %input.id))]
    pub async fn update_task(
        &self,
        caller: Option<&Principal>,
        input: TaskChanges,
    ) -> Result<Task, ApiError> {
        let mut task = self.owned_task(caller, input.id).await?;
        task.apply(TaskPatch {
            name: input.name,
            description: input.description,
            status: input.status,
        })?;
        self.save_task(task).await
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn complete_task(
        &self,
        caller: Option<&Principal>,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<Task, ApiError> {
        let mut task = self.owned_task(caller, id).await?;
        task.set_status(status);
        self.save_task(task).await
    }

    /// Grant read access. Every target must be an existing user.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), id = %input.id))]
    pub async fn share_task(&self, caller: Option<&Principal>, input: ShareTask) -> Result<Task, ApiError> {
        let mut task = self.owned_task(caller, input.id).await?;

        for user in &input.to_users {
            if self.store.get_user(*user).await?.is_none() {
                return Err(ApiError::not_found(format!("user {user}")));
            }
        }

        if !task.share_with(input.to_users) {
            return Ok(task);
        }
        info!(task_id = %input.id, readers = task.access().len(), "task shared");
        self.save_task(task).await
    }

    /// Delete a task together with its comments.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn delete_task(&self, caller: Option<&Principal>, id: TaskId) -> Result<bool, ApiError> {
        self.owned_task(caller, id).await?;

        let removed = self.store.delete_comments_for_task(id).await?;
        if !self.store.delete_task(id).await? {
            return Err(ApiError::not_found(format!("task {id}")));
        }
        info!(task_id = %id, comments_removed = removed, "task deleted");
        Ok(true)
    }

    async fn owned_task(&self, caller: Option<&Principal>, id: TaskId) -> Result<Task, ApiError> {
        authorize(caller, &[])?;
        let task = self.load_task(id).await?;
        check_capability(caller, &[], &task, Capability::Mutate)?;
        Ok(task)
    }

    /// Persist and read back.
    async fn save_task(&self, task: Task) -> Result<Task, ApiError> {
        let id = *task.id();
        if !self.store.update_task(task).await? {
            return Err(ApiError::not_found(format!("task {id}")));
        }
        self.load_task(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::dto::NewComment;
    use crate::app::services::test_support::{services, user};
    use todolist_auth::Role;
    use todolist_core::UserId;

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: name.into(),
            description: Some("details".into()),
            status: None,
        }
    }

    #[tokio::test]
    async fn new_task_is_owned_and_visible_to_creator_only() {
        let svc = services();
        let alice = user(&svc, "alice", Role::Basic).await;

        let task = svc.add_task(Some(&alice), new_task("Buy milk")).await.unwrap();
        assert_eq!(task.owner_id(), alice.id);
        assert_eq!(task.access(), &[alice.id]);
        assert_eq!(task.status(), TaskStatus::NotCompleted);

        assert_eq!(svc.add_task(None, new_task("Buy milk")).await.unwrap_err().code(), "FORBIDDEN");
        assert_eq!(
            svc.add_task(Some(&alice), new_task("no")).await.unwrap_err().code(),
            "VALIDATION_ERROR"
        );
    }

    #[tokio::test]
    async fn non_owner_cannot_update_and_task_is_unchanged() {
        let svc = services();
        let alice = user(&svc, "alice", Role::Basic).await;
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Bob's task")).await.unwrap();

        let err = svc
            .update_task(
                Some(&alice),
                TaskChanges {
                    id: *task.id(),
                    name: Some("Hijacked".into()),
                    description: None,
                    status: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
        assert_eq!(svc.get_task(Some(&bob), *task.id()).await.unwrap(), task);
    }

    #[tokio::test]
    async fn admin_gets_no_ownership_bypass() {
        let svc = services();
        let admin = user(&svc, "root", Role::Admin).await;
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Bob's task")).await.unwrap();

        assert_eq!(svc.get_task(Some(&admin), *task.id()).await.unwrap_err().code(), "FORBIDDEN");
        assert_eq!(svc.delete_task(Some(&admin), *task.id()).await.unwrap_err().code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn owner_updates_and_reads_back_merged_state() {
        let svc = services();
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Original")).await.unwrap();

        let updated = svc
            .update_task(
                Some(&bob),
                TaskChanges {
                    id: *task.id(),
                    name: None,
                    description: None,
                    status: Some(TaskStatus::Completed),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name(), "Original");
        assert_eq!(updated.description(), Some("details"));
        assert_eq!(updated.status(), TaskStatus::Completed);

        let reopened = svc
            .complete_task(Some(&bob), *task.id(), TaskStatus::NotCompleted)
            .await
            .unwrap();
        assert_eq!(reopened.status(), TaskStatus::NotCompleted);
    }

    #[tokio::test]
    async fn sharing_grants_read_but_not_mutate() {
        let svc = services();
        let alice = user(&svc, "alice", Role::Basic).await;
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Shared")).await.unwrap();
        let id = *task.id();

        assert_eq!(svc.get_task(Some(&alice), id).await.unwrap_err().code(), "FORBIDDEN");
        assert!(svc.get_all_tasks(Some(&alice)).await.unwrap().is_empty());

        let shared = svc
            .share_task(Some(&bob), ShareTask { id, to_users: vec![alice.id] })
            .await
            .unwrap();
        assert_eq!(shared.access(), &[bob.id, alice.id]);

        // Idempotent.
        let again = svc
            .share_task(Some(&bob), ShareTask { id, to_users: vec![alice.id, bob.id] })
            .await
            .unwrap();
        assert_eq!(again.access(), shared.access());

        assert!(svc.get_task(Some(&alice), id).await.is_ok());
        assert_eq!(svc.get_all_tasks(Some(&alice)).await.unwrap().len(), 1);
        assert!(svc.get_own_tasks(Some(&alice)).await.unwrap().is_empty());
        assert_eq!(
            svc.complete_task(Some(&alice), id, TaskStatus::Completed).await.unwrap_err().code(),
            "FORBIDDEN"
        );
        assert_eq!(
            svc.share_task(Some(&alice), ShareTask { id, to_users: vec![] })
                .await
                .unwrap_err()
                .code(),
            "FORBIDDEN"
        );
    }

    #[tokio::test]
    async fn sharing_with_unknown_user_fails_without_change() {
        let svc = services();
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Shared")).await.unwrap();

        let err = svc
            .share_task(
                Some(&bob),
                ShareTask {
                    id: *task.id(),
                    to_users: vec![UserId::new()],
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(svc.get_task(Some(&bob), *task.id()).await.unwrap().access(), &[bob.id]);
    }

    #[tokio::test]
    async fn missing_task_is_not_found() {
        let svc = services();
        let bob = user(&svc, "bob", Role::Basic).await;
        assert_eq!(svc.get_task(Some(&bob), TaskId::new()).await.unwrap_err().code(), "NOT_FOUND");
        assert_eq!(svc.delete_task(Some(&bob), TaskId::new()).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_task_removes_its_comments() {
        let svc = services();
        let bob = user(&svc, "bob", Role::Basic).await;
        let task = svc.add_task(Some(&bob), new_task("Doomed")).await.unwrap();
        svc.add_comment(
            Some(&bob),
            NewComment {
                task_id: *task.id(),
                text: "first".into(),
            },
        )
        .await
        .unwrap();

        assert!(svc.delete_task(Some(&bob), *task.id()).await.unwrap());
        assert!(svc.get_my_comments(Some(&bob)).await.unwrap().is_empty());
        assert_eq!(svc.get_task(Some(&bob), *task.id()).await.unwrap_err().code(), "NOT_FOUND");
    }
}
