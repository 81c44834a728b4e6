use async_graphql::{Context, Object, ID};

use todolist_core::{TaskId, UserId};

use crate::app::errors::GqlResultExt;
use crate::app::services::parse_id;

use super::types::{CommentObject, TaskObject, UserObject};
use super::{caller, services};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Exchange credentials for a `Bearer` token. Public.
    async fn get_token(
        &self,
        ctx: &Context<'_>,
        email: String,
        password: String,
    ) -> async_graphql::Result<String> {
        services(ctx)?.get_token(&email, &password).await.gql()
    }

    /// The calling user, or `null` when anonymous.
    async fn me(&self, ctx: &Context<'_>) -> async_graphql::Result<Option<UserObject>> {
        let user = services(ctx)?.me(caller(ctx)).await.gql()?;
        Ok(user.map(UserObject))
    }

    async fn get_all_users(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<UserObject>> {
        let users = services(ctx)?.get_all_users(caller(ctx)).await.gql()?;
        Ok(users.into_iter().map(UserObject).collect())
    }

    async fn get_user(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<UserObject> {
        let id = parse_id::<UserId>(&id).gql()?;
        let user = services(ctx)?.get_user(caller(ctx), id).await.gql()?;
        Ok(UserObject(user))
    }

    /// Tasks owned by or shared with the caller.
    async fn get_all_tasks(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<TaskObject>> {
        let tasks = services(ctx)?.get_all_tasks(caller(ctx)).await.gql()?;
        Ok(tasks.into_iter().map(TaskObject).collect())
    }

    async fn get_own_tasks(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<TaskObject>> {
        let tasks = services(ctx)?.get_own_tasks(caller(ctx)).await.gql()?;
        Ok(tasks.into_iter().map(TaskObject).collect())
    }

    async fn get_task(&self, ctx: &Context<'_>, id: ID) -> async_graphql::Result<TaskObject> {
        let id = parse_id::<TaskId>(&id).gql()?;
        let task = services(ctx)?.get_task(caller(ctx), id).await.gql()?;
        Ok(TaskObject(task))
    }

    async fn get_my_comments(&self, ctx: &Context<'_>) -> async_graphql::Result<Vec<CommentObject>> {
        let comments = services(ctx)?.get_my_comments(caller(ctx)).await.gql()?;
        Ok(comments.into_iter().map(CommentObject).collect())
    }
}
