//! GraphQL output types, enums and input objects.
//!
//! Output types wrap the domain records; the password hash and token version
//! of a user are never exposed.

use async_graphql::{Context, Enum, InputObject, Object, ID};
use chrono::{DateTime, Utc};

use todolist_auth::{Role, User};
use todolist_core::Entity;
use todolist_tasks::{Comment, Task, TaskStatus};

use crate::app::dto::{
    CommentChanges, NewComment, NewTask, NewUser, ShareTask, TaskChanges, UserChanges,
};
use crate::app::errors::{ApiError, GqlResultExt};
use crate::app::services::parse_id;

use super::{caller, services};

fn id_of(value: impl ToString) -> ID {
    ID(value.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Enums
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Enum, Debug, Copy, Clone, PartialEq, Eq)]
#[graphql(name = "Role")]
pub enum RoleValue {
    Admin,
    Basic,
}

impl From<Role> for RoleValue {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => RoleValue::Admin,
            Role::Basic => RoleValue::Basic,
        }
    }
}

impl From<RoleValue> for Role {
    fn from(role: RoleValue) -> Self {
        match role {
            RoleValue::Admin => Role::Admin,
            RoleValue::Basic => Role::Basic,
        }
    }
}

#[derive(Enum, Debug, Copy, Clone, PartialEq, Eq)]
#[graphql(name = "TaskStatus")]
pub enum TaskStatusValue {
    Completed,
    NotCompleted,
}

impl From<TaskStatus> for TaskStatusValue {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Completed => TaskStatusValue::Completed,
            TaskStatus::NotCompleted => TaskStatusValue::NotCompleted,
        }
    }
}

impl From<TaskStatusValue> for TaskStatus {
    fn from(status: TaskStatusValue) -> Self {
        match status {
            TaskStatusValue::Completed => TaskStatus::Completed,
            TaskStatusValue::NotCompleted => TaskStatus::NotCompleted,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output types
// ─────────────────────────────────────────────────────────────────────────────

pub struct UserObject(pub User);

#[Object(name = "User")]
impl UserObject {
    async fn id(&self) -> ID {
        id_of(self.0.id)
    }

    async fn email(&self) -> Option<&str> {
        self.0.email.as_deref()
    }

    async fn username(&self) -> &str {
        &self.0.username
    }

    async fn role(&self) -> RoleValue {
        self.0.role.into()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at
    }
}

pub struct TaskObject(pub Task);

#[Object(name = "Task")]
impl TaskObject {
    async fn id(&self) -> ID {
        id_of(self.0.id())
    }

    async fn name(&self) -> &str {
        self.0.name()
    }

    async fn description(&self) -> Option<&str> {
        self.0.description()
    }

    async fn status(&self) -> TaskStatusValue {
        self.0.status().into()
    }

    async fn owner_id(&self) -> ID {
        id_of(self.0.owner_id())
    }

    /// Users who can see this task, owner included.
    async fn access(&self) -> Vec<ID> {
        self.0.access().iter().map(id_of).collect()
    }

    /// `null` if the owner account has been deleted.
    async fn owner(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserObject>> {
        let user = services(ctx)?.related_user(self.0.owner_id()).await.gql()?;
        Ok(user.map(UserObject))
    }

    async fn comments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CommentObject>> {
        let comments = services(ctx)?
            .task_comments(caller(ctx), *self.0.id())
            .await
            .gql()?;
        Ok(comments.into_iter().map(CommentObject).collect())
    }
}

pub struct CommentObject(pub Comment);

#[Object(name = "Comment")]
impl CommentObject {
    async fn id(&self) -> ID {
        id_of(self.0.id())
    }

    async fn text(&self) -> &str {
        self.0.text()
    }

    async fn created_at(&self) -> DateTime<Utc> {
        self.0.created_at()
    }

    async fn author_id(&self) -> ID {
        id_of(self.0.author_id())
    }

    async fn task_id(&self) -> ID {
        id_of(self.0.task_id())
    }

    async fn author(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserObject>> {
        let user = services(ctx)?.related_user(self.0.author_id()).await.gql()?;
        Ok(user.map(UserObject))
    }

    async fn task(&self, ctx: &Context<'_>) -> async_graphql::Result<TaskObject> {
        let task = services(ctx)?
            .get_task(caller(ctx), self.0.task_id())
            .await
            .gql()?;
        Ok(TaskObject(task))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inputs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(InputObject)]
pub struct AddUserInput {
    pub email: String,
    pub username: String,
    pub role: Option<RoleValue>,
    pub password: Option<String>,
}

impl From<AddUserInput> for NewUser {
    fn from(input: AddUserInput) -> Self {
        NewUser {
            email: Some(input.email),
            username: input.username,
            role: input.role.map(Role::from),
            password: input.password,
        }
    }
}

#[derive(InputObject)]
pub struct UpdateUserInput {
    pub id: ID,
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<RoleValue>,
    pub password: Option<String>,
}

impl TryFrom<UpdateUserInput> for UserChanges {
    type Error = ApiError;

    fn try_from(input: UpdateUserInput) -> Result<Self, Self::Error> {
        Ok(UserChanges {
            id: parse_id(&input.id)?,
            email: input.email,
            username: input.username,
            role: input.role.map(Role::from),
            password: input.password,
        })
    }
}

#[derive(InputObject)]
pub struct AddTaskInput {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<TaskStatusValue>,
}

impl From<AddTaskInput> for NewTask {
    fn from(input: AddTaskInput) -> Self {
        NewTask {
            name: input.name,
            description: input.description,
            status: input.status.map(TaskStatus::from),
        }
    }
}

#[derive(InputObject)]
pub struct UpdateTaskInput {
    pub id: ID,
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatusValue>,
}

impl TryFrom<UpdateTaskInput> for TaskChanges {
    type Error = ApiError;

    fn try_from(input: UpdateTaskInput) -> Result<Self, Self::Error> {
        Ok(TaskChanges {
            id: parse_id(&input.id)?,
            name: input.name,
            description: input.description,
            status: input.status.map(TaskStatus::from),
        })
    }
}

#[derive(InputObject)]
pub struct CompleteTaskInput {
    pub id: ID,
    pub status: TaskStatusValue,
}

#[derive(InputObject)]
pub struct ShareTaskInput {
    pub id: ID,
    pub to_users_ids: Vec<ID>,
}

impl TryFrom<ShareTaskInput> for ShareTask {
    type Error = ApiError;

    fn try_from(input: ShareTaskInput) -> Result<Self, Self::Error> {
        Ok(ShareTask {
            id: parse_id(&input.id)?,
            to_users: input
                .to_users_ids
                .iter()
                .map(|id| parse_id(id))
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(InputObject)]
pub struct AddCommentInput {
    pub text: String,
    pub task_id: ID,
}

impl TryFrom<AddCommentInput> for NewComment {
    type Error = ApiError;

    fn try_from(input: AddCommentInput) -> Result<Self, Self::Error> {
        Ok(NewComment {
            task_id: parse_id(&input.task_id)?,
            text: input.text,
        })
    }
}

#[derive(InputObject)]
pub struct UpdateCommentInput {
    pub id: ID,
    pub text: String,
}

impl TryFrom<UpdateCommentInput> for CommentChanges {
    type Error = ApiError;

    fn try_from(input: UpdateCommentInput) -> Result<Self, Self::Error> {
        Ok(CommentChanges {
            id: parse_id(&input.id)?,
            text: input.text,
        })
    }
}
