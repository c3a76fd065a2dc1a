//! Database-specific error types and conversions.

use atelier_core::error::AtelierError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Duplicate {entity}: {detail}")]
    Duplicate { entity: String, detail: String },

    #[error("Invalid stored row: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl DbError {
    /// Classify a statement error from `Response::check`. Unique index
    /// violations become [`DbError::Duplicate`].
    pub(crate) fn from_check(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        if detail.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }
}

impl From<DbError> for AtelierError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => AtelierError::NotFound { entity, id },
            DbError::Duplicate { entity, .. } => AtelierError::AlreadyExists { entity },
            other => AtelierError::Database(other.to_string()),
        }
    }
}

/// Parse a UUID stored as a string column.
pub(crate) fn parse_uuid(raw: &str, what: &str) -> Result<uuid::Uuid, DbError> {
    uuid::Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

/// Parse an optional UUID column.
pub(crate) fn parse_opt_uuid(raw: Option<&str>, what: &str) -> Result<Option<uuid::Uuid>, DbError> {
    raw.map(|r| parse_uuid(r, what)).transpose()
}
