//! User accounts (the credential store's record type).
//!
//! # Invariants
//! - Exactly one role per user.
//! - The username is always present and non-blank.
//! - The id never changes after creation.
//! - `token_version` only grows; it is bumped whenever the role or the
//!   password changes so that previously issued tokens stop verifying.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use todolist_core::{DomainError, DomainResult, Entity, UserId};

use crate::Role;

/// Minimum accepted length of a plaintext password.
pub const MIN_PASSWORD_LEN: usize = 5;

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub username: String,
    pub role: Role,
    /// PHC-formatted argon2 hash. Never leaves the server.
    pub password_hash: String,
    pub token_version: u64,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a validated user record. The password must already be hashed.
    pub fn new(
        id: UserId,
        email: Option<&str>,
        username: &str,
        role: Role,
        password_hash: String,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        Ok(Self {
            id,
            email: email.map(normalize_email).transpose()?,
            username: normalize_username(username)?,
            role,
            password_hash,
            token_version: 0,
            created_at,
        })
    }

    /// Merge the provided fields into this record.
    ///
    /// Returns `true` when credentials changed (and `token_version` was bumped).
    /// Nothing is modified if any field fails validation.
    pub fn apply(&mut self, patch: UserPatch) -> DomainResult<bool> {
        let email = patch.email.as_deref().map(normalize_email).transpose()?;
        let username = patch.username.as_deref().map(normalize_username).transpose()?;

        if let Some(email) = email {
            self.email = Some(email);
        }
        if let Some(username) = username {
            self.username = username;
        }

        let mut credentials_changed = false;
        if let Some(role) = patch.role {
            if role != self.role {
                self.role = role;
                credentials_changed = true;
            }
        }
        if let Some(hash) = patch.password_hash {
            self.password_hash = hash;
            credentials_changed = true;
        }

        if credentials_changed {
            self.token_version += 1;
        }
        Ok(credentials_changed)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Partial update of a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub username: Option<String>,
    pub role: Option<Role>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.username.is_none()
            && self.role.is_none()
            && self.password_hash.is_none()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Trim and lowercase an email, rejecting anything not shaped `local@domain.tld`.
pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_ascii_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation(format!("'{email}' is not a valid email")));
    }
    Ok(email)
}

pub fn normalize_username(username: &str) -> DomainResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(DomainError::validation("username must not be empty"));
    }
    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User::new(
            UserId::new(),
            Some("Alice@Example.com"),
            " alice ",
            Role::Basic,
            "hash".to_string(),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn new_normalizes_email_and_username() {
        let user = sample();
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.username, "alice");
        assert_eq!(user.token_version, 0);
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "alice", "@b.com", "a@", "a@b", "a@.com", "a@b.", "a b@c.com", "a@b@c.com"] {
            assert!(normalize_email(bad).is_err(), "accepted {bad:?}");
        }
        assert!(normalize_email("a@b.com").is_ok());
    }

    #[test]
    fn rejects_blank_username() {
        let err = User::new(UserId::new(), None, "   ", Role::Basic, String::new(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn password_length_is_enforced() {
        assert!(validate_password("abcd").is_err());
        assert!(validate_password("admin").is_ok());
    }

    #[test]
    fn role_change_bumps_token_version() {
        let mut user = sample();
        let changed = user
            .apply(UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            })
            .unwrap();
        assert!(changed);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.token_version, 1);
    }

    #[test]
    fn same_role_does_not_bump_token_version() {
        let mut user = sample();
        let changed = user
            .apply(UserPatch {
                role: Some(Role::Basic),
                username: Some("alicia".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(!changed);
        assert_eq!(user.username, "alicia");
        assert_eq!(user.token_version, 0);
    }

    #[test]
    fn password_change_bumps_token_version() {
        let mut user = sample();
        user.apply(UserPatch {
            password_hash: Some("new-hash".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(user.token_version, 1);
        assert_eq!(user.password_hash, "new-hash");
    }

    #[test]
    fn invalid_patch_is_rejected() {
        let mut user = sample();
        assert!(user
            .apply(UserPatch {
                email: Some("nope".into()),
                ..Default::default()
            })
            .is_err());
    }
}
