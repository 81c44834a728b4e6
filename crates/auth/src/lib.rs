//! `todolist-auth`: credentials, bearer tokens and access control.
//!
//! This crate is decoupled from HTTP and storage: it decides, it does not fetch.

pub mod authorize;
pub mod claims;
pub mod password;
pub mod principal;
pub mod roles;
pub mod token;
pub mod user;

pub use authorize::{
    authorize, check_capability, explain, AuthorizationExplanation, AuthzError, Capability,
    Protected,
};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use password::{
    generate_password, hash_password, verify_dummy_password, verify_password, PasswordError,
};
pub use principal::Principal;
pub use roles::{Role, UnknownRole};
pub use token::{TokenError, TokenService, BEARER_PREFIX};
pub use user::{
    normalize_email, normalize_username, validate_password, User, UserPatch, MIN_PASSWORD_LEN,
};
