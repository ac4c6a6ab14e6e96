//! Password hashing and verification (Argon2id)

use crate::error::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a plaintext password with a freshly generated salt.
pub fn hash_password(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

/// Verify a plaintext password against a stored hash.
///
/// A malformed stored hash verifies as `false`; it never surfaces as an
/// error to the caller. Timing-safe comparison is delegated to `argon2`.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    let parsed = match PasswordHash::new(stored_hash) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("pw1-correct").unwrap();
        assert!(verify_password("pw1-correct", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
        assert!(verify_password("same-password", &first));
        assert!(verify_password("same-password", &second));
    }

    #[test]
    fn test_hash_does_not_contain_plaintext() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(!hash.contains("hunter2hunter2"));
    }

    #[rstest]
    #[case("pw1-wrong")]
    #[case("")]
    #[case("PW1-CORRECT")]
    fn test_wrong_password_rejected(#[case] guess: &str) {
        let hash = hash_password("pw1-correct").unwrap();
        assert!(!verify_password(guess, &hash));
    }

    #[rstest]
    #[case("")]
    #[case("not-a-phc-string")]
    #[case("$argon2id$truncated")]
    fn test_malformed_stored_hash_is_false_not_panic(#[case] stored: &str) {
        assert!(!verify_password("anything", stored));
    }
}
