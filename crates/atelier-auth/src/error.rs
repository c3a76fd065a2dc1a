//! Authentication error types.

use atelier_core::error::AtelierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("account is suspended")]
    AccountSuspended,

    #[error("tenant is not accepting sign-ins")]
    TenantInactive,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("CSRF token missing or mismatched")]
    CsrfMismatch,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for AtelierError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::CsrfMismatch => AtelierError::AuthorizationDenied {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => AtelierError::Crypto(msg),
            AuthError::InvalidCredentials
            | AuthError::AccountInactive
            | AuthError::AccountSuspended
            | AuthError::TenantInactive
            | AuthError::TokenExpired
            | AuthError::TokenInvalid(_) => AtelierError::AuthenticationFailed {
                reason: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csrf_failure_is_a_denial_not_an_authentication_failure() {
        let err: AtelierError = AuthError::CsrfMismatch.into();
        assert!(err.is_denial());

        let err: AtelierError = AuthError::TenantInactive.into();
        assert!(matches!(err, AtelierError::AuthenticationFailed { .. }));
    }
}
