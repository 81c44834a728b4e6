//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the injected store and token service
//! - `users.rs`, `tasks.rs`, `comments.rs`: operations and their access rules
//! - `schema/`: GraphQL types and resolvers delegating to the operations
//! - `routes/`: HTTP routes (`/graphql`, `/health`)
//! - `dto.rs`: typed operation inputs
//! - `errors.rs`: error taxonomy and its GraphQL/HTTP rendering

use std::sync::Arc;

use anyhow::Context;
use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;
use tracing::info;

use todolist_auth::TokenService;
use todolist_infra::{seed_admin, AppConfig, InMemoryStore, Store};

use crate::middleware;

pub mod comments;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod schema;
pub mod services;
pub mod tasks;
pub mod users;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Uses Postgres when `DATABASE_URL` is set and the `postgres` feature is
/// enabled, the in-memory store otherwise.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let store = connect_store(config).await?;
    build_app_with_store(config, store).await
}

/// Build the router around an explicit store, seeding the admin account.
pub async fn build_app_with_store(config: &AppConfig, store: Arc<dyn Store>) -> anyhow::Result<Router> {
    seed_admin(store.as_ref(), &config.admin).await?;

    let ttl = chrono::Duration::from_std(config.token_ttl).context("TOKEN_TTL_SECS out of range")?;
    let tokens = Arc::new(TokenService::new(config.jwt_secret.as_bytes(), ttl));

    let services = services::AppServices::new(store.clone(), tokens.clone());
    let schema = schema::build_schema(services);
    let auth_state = middleware::AuthState { tokens, store };

    let graphql = routes::router()
        .layer(Extension(schema))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(graphql)
        .layer(ServiceBuilder::new()))
}

#[cfg(feature = "postgres")]
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    let Some(db) = &config.database else {
        info!("DATABASE_URL not set; using in-memory store");
        return Ok(Arc::new(InMemoryStore::new()));
    };

    let store = todolist_infra::PgStore::connect_with_retry(&db.url, db.connect_retries, db.retry_delay)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("applying schema")?;
    info!("using postgres store");
    Ok(Arc::new(store))
}

#[cfg(not(feature = "postgres"))]
async fn connect_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Store>> {
    if config.database.is_some() {
        tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory store");
    }
    info!("using in-memory store");
    Ok(Arc::new(InMemoryStore::new()))
}
