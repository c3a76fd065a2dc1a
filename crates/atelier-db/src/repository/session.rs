//! SurrealDB implementation of [`SessionRepository`].
//!
//! Session rows carry no tenant of their own; every query filters them
//! through the owning user's `tenant_id`.

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::session::{CreateSession, Session};
use atelier_core::repository::SessionRepository;
use atelier_core::tenant_context::TenantContext;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};
use crate::repository::CountRow;
use crate::tenant_scope::TenantScope;

#[derive(Debug, SurrealValue)]
struct SessionRow {
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self, id: Uuid) -> Result<Session, DbError> {
        Ok(Session {
            id,
            user_id: parse_uuid(&self.user_id, "user")?,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct SessionRowWithId {
    record_id: String,
    user_id: String,
    token_hash: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl SessionRowWithId {
    fn try_into_session(self) -> Result<Session, DbError> {
        let id = parse_uuid(&self.record_id, "session")?;
        SessionRow {
            user_id: self.user_id,
            token_hash: self.token_hash,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            expires_at: self.expires_at,
            created_at: self.created_at,
        }
        .into_session(id)
    }
}

/// SurrealDB implementation of the Session repository.
#[derive(Clone)]
pub struct SurrealSessionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSessionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SessionRepository for SurrealSessionRepository<C> {
    async fn create(&self, ctx: &TenantContext, input: CreateSession) -> AtelierResult<Session> {
        let scope = TenantScope::new(ctx);
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        // The owning user must be writable under the context.
        let owner_query = format!(
            "SELECT count() AS total FROM user \
             WHERE id = type::record('user', $user_id) AND {} GROUP ALL",
            scope.writable()
        );
        let mut owner = self
            .db
            .query(owner_query)
            .bind(scope.binding())
            .bind(("user_id", input.user_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let owners: Vec<CountRow> = owner.take(0).map_err(DbError::from)?;
        if owners.first().map_or(0, |r| r.total) == 0 {
            return Err(AtelierError::AuthorizationDenied {
                reason: "session owner is outside the current tenant context".into(),
            });
        }

        let result = self
            .db
            .query(
                "CREATE type::record('session', $id) SET \
                 user_id = $user_id, \
                 token_hash = $token_hash, \
                 ip_address = $ip_address, \
                 user_agent = $user_agent, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("token_hash", input.token_hash))
            .bind(("ip_address", input.ip_address))
            .bind(("user_agent", input.user_agent))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("session", e))?;

        let rows: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: id_str,
        })?;

        Ok(row.into_session(id)?)
    }

    async fn get_by_token_hash(
        &self,
        ctx: &TenantContext,
        token_hash: &str,
    ) -> AtelierResult<Session> {
        let scope = TenantScope::new(ctx);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM session \
             WHERE token_hash = $token_hash AND {}",
            scope.user_visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("token_hash", token_hash.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SessionRowWithId> = result.take(0).map_err(DbError::from)?;
        // The hash is not echoed into the error.
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "session".into(),
            id: "token_hash".into(),
        })?;

        Ok(row.try_into_session()?)
    }

    async fn invalidate(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<()> {
        let scope = TenantScope::new(ctx);
        let query = format!(
            "DELETE type::record('session', $id) WHERE {}",
            scope.user_writable()
        );
        self.db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn invalidate_user_sessions(&self, ctx: &TenantContext, user_id: Uuid) -> AtelierResult<()> {
        let scope = TenantScope::new(ctx);
        let query = format!(
            "DELETE session WHERE user_id = $user_id AND {}",
            scope.user_writable()
        );
        self.db
            .query(query)
            .bind(scope.binding())
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        debug!(%user_id, "user sessions invalidated");
        Ok(())
    }

    async fn cleanup_expired(&self, ctx: &TenantContext) -> AtelierResult<u64> {
        let scope = TenantScope::new(ctx);
        let query = format!(
            "DELETE session WHERE expires_at < time::now() AND {} RETURN BEFORE",
            scope.user_writable()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .await
            .map_err(DbError::from)?;

        let removed: Vec<SessionRow> = result.take(0).map_err(DbError::from)?;
        let removed = removed.len() as u64;
        if removed > 0 {
            debug!(removed, "expired sessions removed");
        }
        Ok(removed)
    }
}
