//! Argon2id password verification.

use argon2::password_hash::{Error as HashError, PasswordHash};
use argon2::{Argon2, PasswordVerifier};

use crate::error::AuthError;

/// Check `password` against a stored PHC string.
///
/// The optional `pepper` is prefixed to the password, matching how the
/// user repository hashes. A mismatch is `Ok(false)`; a stored value that
/// is not a valid PHC hash is a [`AuthError::Crypto`].
pub fn verify_password(
    password: &str,
    stored_hash: &str,
    pepper: Option<&str>,
) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::Crypto(format!("stored password hash unreadable: {e}")))?;

    let candidate = format!("{}{password}", pepper.unwrap_or_default());
    // Parameters come from the PHC string, so the default instance is enough.
    match Argon2::default().verify_password(candidate.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(HashError::Password) => Ok(false),
        Err(e) => Err(AuthError::Crypto(format!("password verification: {e}"))),
    }
}
