use async_graphql::{Context, Object, ID};

use todolist_core::{CommentId, TaskId, UserId};

use crate::app::dto::{CommentChanges, NewComment, ShareTask, TaskChanges, UserChanges};
use crate::app::errors::GqlResultExt;
use crate::app::services::parse_id;

use super::types::{
    AddCommentInput, AddTaskInput, AddUserInput, CommentObject, CompleteTaskInput, ShareTaskInput,
    TaskObject, UpdateCommentInput, UpdateTaskInput, UpdateUserInput, UserObject,
};
use super::{caller, services};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// ADMIN only. Role defaults to BASIC.
    async fn add_user(&self, ctx: &Context<'_>, data: AddUserInput) -> async_graphql::Result<UserObject> {
        let user = services(ctx)?.add_user(caller(ctx), data.into()).await.gql()?;
        Ok(UserObject(user))
    }

    async fn update_user(
        &self,
        ctx: &Context<'_>,
        data: UpdateUserInput,
    ) -> async_graphql::Result<UserObject> {
        let changes = UserChanges::try_from(data).gql()?;
        let user = services(ctx)?.update_user(caller(ctx), changes).await.gql()?;
        Ok(UserObject(user))
    }

    async fn delete_user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let id = parse_id::<UserId>(&id).gql()?;
        services(ctx)?.delete_user(caller(ctx), id).await.gql()
    }

    async fn add_task(&self, ctx: &Context<'_>, data: AddTaskInput) -> async_graphql::Result<TaskObject> {
        let task = services(ctx)?.add_task(caller(ctx), data.into()).await.gql()?;
        Ok(TaskObject(task))
    }

    async fn update_task(
        &self,
        ctx: &Context<'_>,
        data: UpdateTaskInput,
    ) -> async_graphql::Result<TaskObject> {
        let changes = TaskChanges::try_from(data).gql()?;
        let task = services(ctx)?.update_task(caller(ctx), changes).await.gql()?;
        Ok(TaskObject(task))
    }

    async fn complete_task(
        &self,
        ctx: &Context<'_>,
        data: CompleteTaskInput,
    ) -> async_graphql::Result<TaskObject> {
        let id = parse_id::<TaskId>(&data.id).gql()?;
        let task = services(ctx)?
            .complete_task(caller(ctx), id, data.status.into())
            .await
            .gql()?;
        Ok(TaskObject(task))
    }

    async fn share_task(&self, ctx: &Context<'_>, data: ShareTaskInput) -> async_graphql::Result<TaskObject> {
        let share = ShareTask::try_from(data).gql()?;
        let task = services(ctx)?.share_task(caller(ctx), share).await.gql()?;
        Ok(TaskObject(task))
    }

    /// Also deletes the task's comments.
    async fn delete_task(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let id = parse_id::<TaskId>(&id).gql()?;
        services(ctx)?.delete_task(caller(ctx), id).await.gql()
    }

    async fn add_comment(
        &self,
        ctx: &Context<'_>,
        data: AddCommentInput,
    ) -> async_graphql::Result<CommentObject> {
        let input = NewComment::try_from(data).gql()?;
        let comment = services(ctx)?.add_comment(caller(ctx), input).await.gql()?;
        Ok(CommentObject(comment))
    }

    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        data: UpdateCommentInput,
    ) -> async_graphql::Result<CommentObject> {
        let changes = CommentChanges::try_from(data).gql()?;
        let comment = services(ctx)?.update_comment(caller(ctx), changes).await.gql()?;
        Ok(CommentObject(comment))
    }

    async fn delete_comment(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<bool> {
        let id = parse_id::<CommentId>(&id).gql()?;
        services(ctx)?.delete_comment(caller(ctx), id).await.gql()
    }
}
