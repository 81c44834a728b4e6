//! Account operations: login, lookup and ADMIN-managed user CRUD.

use chrono::Utc;
use tracing::{info, instrument, warn};

use todolist_auth::{
    authorize, generate_password, hash_password, normalize_email, validate_password,
    verify_dummy_password, verify_password, Principal, Role, User, UserPatch,
};
use todolist_core::UserId;
use todolist_infra::UserRepository;

use crate::app::dto::{NewUser, UserChanges};
use crate::app::errors::ApiError;
use crate::app::services::{trace_decision, AppServices};

const BAD_CREDENTIALS: &str = "invalid email or password";

impl AppServices {
    /// Exchange credentials for a bearer token.
    ///
    /// Unknown email and wrong password fail identically, and both pay for an
    /// argon2 verification.
    #[instrument(skip_all)]
    pub async fn get_token(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let Ok(email) = normalize_email(email) else {
            verify_dummy_password(password);
            return Err(ApiError::forbidden(BAD_CREDENTIALS));
        };

        let Some(user) = self.store.find_user_by_email(&email).await? else {
            verify_dummy_password(password);
            warn!("login attempt for unknown email");
            return Err(ApiError::forbidden(BAD_CREDENTIALS));
        };

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "login attempt with wrong password");
            return Err(ApiError::forbidden(BAD_CREDENTIALS));
        }

        let token = self.tokens.issue(&user, Utc::now())?;
        info!(user_id = %user.id, "issued token");
        Ok(token)
    }

    /// The caller's own record; `None` when anonymous.
    pub async fn me(&self, caller: Option<&Principal>) -> Result<Option<User>, ApiError> {
        match caller {
            Some(p) => Ok(self.store.get_user(p.id).await?),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn get_all_users(&self, caller: Option<&Principal>) -> Result<Vec<User>, ApiError> {
        trace_decision("getAllUsers", caller, &[Role::Admin]);
        authorize(caller, &[Role::Admin])?;
        Ok(self.store.list_users().await?)
    }

    /// ADMIN may read anyone; everyone else only themself.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn get_user(&self, caller: Option<&Principal>, id: UserId) -> Result<User, ApiError> {
        let caller = authorize(caller, &[])?;
        if !caller.is_admin() && caller.id != id {
            return Err(ApiError::forbidden("you can only view your own account"));
        }
        self.load_user(id).await
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id)))]
    pub async fn add_user(&self, caller: Option<&Principal>, input: NewUser) -> Result<User, ApiError> {
        trace_decision("addUser", caller, &[Role::Admin]);
        authorize(caller, &[Role::Admin])?;

        // Without a password the account exists but cannot log in until one is set.
        let password = match input.password {
            Some(password) => {
                validate_password(&password)?;
                password
            }
            None => generate_password(),
        };

        let user = User::new(
            UserId::new(),
            input.email.as_deref(),
            &input.username,
            input.role.unwrap_or_default(),
            hash_password(&password)?,
            Utc::now(),
        )?;

        self.store.insert_user(user.clone()).await?;
        info!(user_id = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    /// ADMIN may update anyone. A BASIC caller may update only themself and
    /// may not change their own role.
    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), id = %input.id))]
    pub async fn update_user(
        &self,
        caller: Option<&Principal>,
        input: UserChanges,
    ) -> Result<User, ApiError> {
        let caller = authorize(caller, &[])?;
        if !caller.is_admin() && caller.id != input.id {
            return Err(ApiError::forbidden("you can only update your own account"));
        }

        let mut user = self.load_user(input.id).await?;

        if !caller.is_admin() && input.role.is_some_and(|role| role != user.role) {
            return Err(ApiError::forbidden("you can't change your own role"));
        }

        let password_hash = match input.password.as_deref() {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password)?)
            }
            None => None,
        };

        let revoked = user.apply(UserPatch {
            email: input.email,
            username: input.username,
            role: input.role,
            password_hash,
        })?;

        if !self.store.update_user(user).await? {
            return Err(ApiError::not_found(format!("user {}", input.id)));
        }
        if revoked {
            info!(user_id = %input.id, "credentials changed; earlier tokens revoked");
        }
        self.load_user(input.id).await
    }

    #[instrument(skip_all, fields(caller = ?caller.map(|p| p.id), %id))]
    pub async fn delete_user(&self, caller: Option<&Principal>, id: UserId) -> Result<bool, ApiError> {
        trace_decision("deleteUser", caller, &[Role::Admin]);
        let caller = authorize(caller, &[Role::Admin])?;
        if caller.id == id {
            return Err(ApiError::validation("you can't delete your own account"));
        }

        if !self.store.delete_user(id).await? {
            return Err(ApiError::not_found(format!("user {id}")));
        }
        info!(user_id = %id, "user deleted");
        Ok(true)
    }

    /// Lookup used by field resolvers on already-authorized parents.
    pub async fn related_user(&self, id: UserId) -> Result<Option<User>, ApiError> {
        Ok(self.store.get_user(id).await?)
    }
}
