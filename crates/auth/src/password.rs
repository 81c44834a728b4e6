//! Password hashing and verification (argon2, PHC string format).

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::{SaltString, rand_core::OsRng};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("stored password hash is unreadable: {0}")]
    CorruptHash(String),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Returns `Ok(false)` on a mismatch; errors are reserved for unusable hashes.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::CorruptHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::CorruptHash(e.to_string())),
    }
}

/// Well-formed argon2id hash with `Argon2::default()` parameters that matches
/// no password.
const DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$dG9kb2xpc3QtZHVtbXktcw$sEijGtHnVVvlkifDFYxMS4yKqIWYJd9lXcB6F4eASWU";

/// Run a full verification that always fails, so a login for an unknown
/// account costs the same as one with a wrong password.
pub fn verify_dummy_password(password: &str) {
    let _ = verify_password(password, DUMMY_HASH);
}

/// A random throwaway password for accounts created without one.
pub fn generate_password() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dummy_hash_parses_with_default_cost_and_matches_nothing() {
        let dummy = PasswordHash::new(DUMMY_HASH).unwrap();
        let real_hash = hash_password("hunter2").unwrap();
        let real = PasswordHash::new(&real_hash).unwrap();

        assert_eq!(dummy.algorithm.to_string(), real.algorithm.to_string());
        assert_eq!(dummy.params.to_string(), real.params.to_string());
        assert_eq!(verify_password("hunter2", DUMMY_HASH), Ok(false));
        assert_eq!(verify_password("", DUMMY_HASH), Ok(false));
    }

    #[test]
    fn hash_is_phc_and_not_the_plaintext() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("s3cret-pass"));
    }

    #[test]
    fn same_password_hashes_differently() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn verify_accepts_right_and_rejects_wrong() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn verify_reports_garbage_hash() {
        assert!(matches!(
            verify_password("x", "plaintext-not-a-hash"),
            Err(PasswordError::CorruptHash(_))
        ));
    }

    #[test]
    fn generated_passwords_are_long_and_unique() {
        let a = generate_password();
        assert_eq!(a.len(), 32);
        assert_ne!(a, generate_password());
    }
}
