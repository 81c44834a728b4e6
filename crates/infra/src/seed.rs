//! Startup seeding of the initial ADMIN account.

use anyhow::Context;
use chrono::Utc;
use tracing::info;

use todolist_auth::{hash_password, normalize_email, Role, User};
use todolist_core::UserId;

use crate::config::AdminSeed;
use crate::store::{Store, UserRepository};

/// Ensure an ADMIN account with `admin.email` exists.
///
/// Returns the existing account untouched if one is found, so restarts never
/// reset a changed admin password.
pub async fn seed_admin(store: &dyn Store, admin: &AdminSeed) -> anyhow::Result<User> {
    let email = normalize_email(&admin.email).context("invalid ADMIN_EMAIL")?;

    if let Some(existing) = store.find_user_by_email(&email).await? {
        info!(user_id = %existing.id, "admin account already present");
        return Ok(existing);
    }

    let hash = hash_password(&admin.password).context("hashing admin password")?;
    let user = User::new(
        UserId::new(),
        Some(&email),
        &admin.username,
        Role::Admin,
        hash,
        Utc::now(),
    )
    .context("invalid admin seed")?;

    store
        .insert_user(user.clone())
        .await
        .context("inserting admin account")?;
    info!(user_id = %user.id, username = %user.username, "seeded admin account");
    Ok(user)
}
