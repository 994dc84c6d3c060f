//! Password hashing and policy
//!
//! Hashes are Argon2id PHC strings, so parameters and salt travel with the
//! hash and verification needs nothing else.

use crate::{Error, Result};
use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use once_cell::sync::Lazy;

/// Minimum accepted password length (in characters)
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password with a fresh random salt
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored PHC string
///
/// Malformed or empty stored hashes never verify.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Checked when no account matches, so unknown usernames cost a full verification
static DUMMY_HASH: Lazy<String> =
    Lazy::new(|| hash_password("no-such-account").unwrap_or_default());

/// Login check that takes the same time whether or not the account exists
///
/// Without a stored hash the password is verified against a dummy hash and
/// the result is always `false`.
pub fn verify_login(plain: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(hash) => verify_password(plain, hash),
        None => {
            let _ = verify_password(plain, &DUMMY_HASH);
            false
        }
    }
}

/// Registration password policy
///
/// - at least [`MIN_PASSWORD_LEN`] characters
/// - not entirely numeric
/// - not the username
pub fn validate_password(password: &str, username: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::InvalidInput(format!(
            "password: This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::InvalidInput(
            "password: This password is entirely numeric.".to_string(),
        ));
    }
    if password.eq_ignore_ascii_case(username) {
        return Err(Error::InvalidInput(
            "password: The password is too similar to the username.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("green-leaves-42").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("green-leaves-42", &hash));
        assert!(!verify_password("green-leaves-43", &hash));
    }

    #[test]
    fn test_login_without_account_still_runs_argon2() {
        assert!(DUMMY_HASH.starts_with("$argon2id$"));
        assert!(!verify_login("no-such-account", None));
        assert!(!verify_login("anything", None));

        let hash = hash_password("green-leaves-42").unwrap();
        assert!(verify_login("green-leaves-42", Some(&hash)));
        assert!(!verify_login("green-leaves-43", Some(&hash)));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("green-leaves-42").unwrap();
        let b = hash_password("green-leaves-42").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", ""));
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("banana-field", "grower").is_ok());
        assert!(validate_password("short", "grower").is_err());
        assert!(validate_password("1234567890", "grower").is_err());
        assert!(validate_password("GrowerName", "growername").is_err());
    }
}
