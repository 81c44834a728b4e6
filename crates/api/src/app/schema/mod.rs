//! GraphQL schema: one query root, one mutation root.
//!
//! Resolvers are thin: they pull the caller and [`AppServices`] out of the
//! context, convert inputs, and delegate. Every rule lives in the services.

use async_graphql::{Context, EmptySubscription, Schema};

use todolist_auth::Principal;

use crate::app::services::AppServices;
use crate::context::RequestContext;

pub mod mutation;
pub mod query;
pub mod types;

pub use mutation::MutationRoot;
pub use query::QueryRoot;

pub type AppSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

pub fn build_schema(services: AppServices) -> AppSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .finish()
}

pub(crate) fn services<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a AppServices> {
    ctx.data::<AppServices>()
}

/// The authenticated caller, or `None` for anonymous requests.
pub(crate) fn caller<'a>(ctx: &Context<'a>) -> Option<&'a Principal> {
    ctx.data_opt::<RequestContext>()
        .and_then(RequestContext::principal)
}
