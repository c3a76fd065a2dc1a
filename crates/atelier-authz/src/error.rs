//! Authorization error types.

use atelier_core::error::AtelierError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("malformed permission token: {0}")]
    MalformedToken(String),

    #[error("unknown permissions: {0:?}")]
    UnknownPermissions(Vec<String>),
}

impl AuthzError {
    pub(crate) fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }
}

pub type AuthzResult<T> = Result<T, AuthzError>;

impl From<AuthzError> for AtelierError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden { reason } => AtelierError::AuthorizationDenied { reason },
            AuthzError::MalformedToken(_) | AuthzError::UnknownPermissions(_) => {
                AtelierError::Validation {
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_maps_to_authorization_denied() {
        let err: AtelierError = AuthzError::forbidden("missing users:read:own").into();
        assert!(err.is_denial());
    }

    #[test]
    fn catalog_errors_map_to_validation() {
        let err: AtelierError = AuthzError::UnknownPermissions(vec!["x:y".into()]).into();
        assert!(matches!(err, AtelierError::Validation { .. }));
    }
}
