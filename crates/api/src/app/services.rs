//! Service wiring shared by every resolver.
//!
//! `AppServices` is the only long-lived state: the injected store and the
//! token service. The operations themselves live in `users`, `tasks` and
//! `comments`, each as an `impl AppServices` block.

use std::sync::Arc;

use todolist_auth::{explain, Principal, Role, TokenService, User};
use todolist_core::{CommentId, DomainError, TaskId, UserId};
use todolist_infra::{CommentRepository, Store, TaskRepository, UserRepository};
use todolist_tasks::{Comment, Task};
use tracing::debug;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AppServices {
    pub store: Arc<dyn Store>,
    pub tokens: Arc<TokenService>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Store>, tokens: Arc<TokenService>) -> Self {
        Self { store, tokens }
    }

    pub(crate) async fn load_user(&self, id: UserId) -> Result<User, ApiError> {
        self.store
            .get_user(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("user {id}")))
    }

    pub(crate) async fn load_task(&self, id: TaskId) -> Result<Task, ApiError> {
        self.store
            .get_task(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("task {id}")))
    }

    pub(crate) async fn load_comment(&self, id: CommentId) -> Result<Comment, ApiError> {
        self.store
            .get_comment(id)
            .await?
            .ok_or_else(|| ApiError::not_found(format!("comment {id}")))
    }
}

/// Log the role-gate decision for an operation at debug level.
pub(crate) fn trace_decision(operation: &str, caller: Option<&Principal>, required: &[Role]) {
    let decision = explain(caller, required);
    debug!(
        operation,
        granted = decision.granted,
        reason = %decision.reason,
        "authorization decision"
    );
}

/// Parse a client-supplied identifier.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{Duration, Utc};
    use todolist_auth::hash_password;
    use todolist_infra::InMemoryStore;

    pub fn services() -> AppServices {
        AppServices::new(
            Arc::new(InMemoryStore::new()),
            Arc::new(TokenService::new(b"test-secret", Duration::hours(1))),
        )
    }

    /// Insert a user with password "secret" and return its principal.
    pub async fn user(services: &AppServices, username: &str, role: Role) -> Principal {
        let email = format!("{username}@example.com");
        let user = User::new(
            UserId::new(),
            Some(&email),
            username,
            role,
            hash_password("secret").unwrap(),
            Utc::now(),
        )
        .unwrap();
        services.store.insert_user(user.clone()).await.unwrap();
        Principal::from(&user)
    }
}
