use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, phc::PasswordHash},
};

use crate::error::{AppError, AppResult};

/// Hash a password with Argon2id and a random salt.
///
/// # Example
/// ```ignore
/// let hashed = hash_password("Pa$$w0rd")?;
/// ```
pub fn hash_password(password: &str) -> AppResult<String> {
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes())
        .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC string.
///
/// A malformed hash is an internal error; a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::internal(format!("Stored password hash is malformed: {e}")))?;
    let argon2 = Argon2::default();

    Ok(argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password() {
        let hash = hash_password("Pa$$w0rd").expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id"));
    }

    #[test]
    fn test_verify_password_success() {
        let hash = hash_password("Pa$$w0rd").expect("Failed to hash password");

        assert!(verify_password("Pa$$w0rd", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_failure() {
        let hash = hash_password("Pa$$w0rd").expect("Failed to hash password");

        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_short_passwords_are_accepted() {
        let hash = hash_password("abc").unwrap();
        assert!(verify_password("abc", &hash).unwrap());
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let hash1 = hash_password("Pa$$w0rd").unwrap();
        let hash2 = hash_password("Pa$$w0rd").unwrap();

        // Different salts
        assert_ne!(hash1, hash2);
        assert!(verify_password("Pa$$w0rd", &hash1).unwrap());
        assert!(verify_password("Pa$$w0rd", &hash2).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        let result = verify_password("Pa$$w0rd", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal { .. })));
    }
}
