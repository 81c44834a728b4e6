use axum::{routing::get, Router};

pub mod graphql;
pub mod system;

/// Router for the GraphQL endpoint. Callers identify through the auth
/// middleware layered on top.
pub fn router() -> Router {
    Router::new().route("/graphql", get(graphql::graphiql).post(graphql::execute))
}
