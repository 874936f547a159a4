use crate::error::AppError;
use bcrypt::{hash, verify};
use log::warn;
use validator::ValidationError;

/// bcrypt reads at most this many bytes of a password and silently drops the rest.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validator for password fields: rejects input bcrypt would truncate.
///
/// The limit is in bytes, so a password of 72 multi-byte characters is too long.
pub fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        let mut error = ValidationError::new("password_too_long");
        error.message = Some("Password must be at most 72 bytes".into());
        return Err(error);
    }
    Ok(())
}

/// Hashes a plaintext password with bcrypt at the given cost.
///
/// Every call draws a fresh random salt, so hashing the same password twice yields two
/// different strings that both verify. Passwords over 72 bytes are rejected rather than
/// truncated.
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(AppError::ValidationError(
            "Password must be at most 72 bytes".into(),
        ));
    }
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks a plaintext password against a stored bcrypt hash.
///
/// Returns `false` on mismatch and also when the stored hash cannot be parsed; the latter is
/// logged because it points at corrupted user data rather than a wrong password. A password
/// over 72 bytes never matches, since no stored hash can have been made from one.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    if password.len() > MAX_PASSWORD_BYTES {
        return false;
    }
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            warn!("Password verification against malformed hash: {}", e);
            false
        }
    }
}
