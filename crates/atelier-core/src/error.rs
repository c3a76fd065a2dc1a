//! Error types for the Atelier system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AtelierError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Authorization denied: {reason}")]
    AuthorizationDenied { reason: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Tenant context missing or invalid")]
    TenantContext,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    /// Shorthand for a [`AtelierError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error is a caller-visible "forbidden" outcome rather
    /// than a system failure.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::AuthorizationDenied { .. } | Self::TenantContext | Self::RateLimited
        )
    }
}

pub type AtelierResult<T> = Result<T, AtelierError>;
