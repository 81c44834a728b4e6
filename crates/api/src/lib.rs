//! GraphQL-over-HTTP API: server wiring, auth middleware, schema and resolvers.

pub mod app;
pub mod context;
pub mod middleware;
