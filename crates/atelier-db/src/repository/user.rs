//! SurrealDB implementation of [`UserRepository`].
//!
//! Password hashing uses Argon2id with OWASP-recommended parameters
//! (memory: 19 MiB, iterations: 2, parallelism: 1) and a random salt per
//! hash. An optional pepper (server-side secret) is prepended to the
//! password when configured.
//!
//! Creating a user enforces the owning tenant's `max_users` seat limit
//! (counted over active users) and requires the role to be visible to
//! the user's tenant. Salon users never hold `:all` permissions, through
//! their role or through per-user grants, and every override token must
//! come from the catalog.

use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use atelier_authz::catalog;
use atelier_authz::error::AuthzError;
use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::user::{CreateUser, UpdateUser, User, UserStatus};
use atelier_core::repository::{PaginatedResult, Pagination, UserRepository};
use atelier_core::tenant_context::TenantContext;
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, parse_opt_uuid, parse_uuid};
use crate::repository::CountRow;
use crate::tenant_scope::TenantScope;

#[derive(Debug, SurrealValue)]
struct UserRow {
    tenant_id: Option<String>,
    role_id: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    status: String,
    granted_permissions: Vec<String>,
    revoked_permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, id: Uuid) -> Result<User, DbError> {
        Ok(User {
            id,
            tenant_id: parse_opt_uuid(self.tenant_id.as_deref(), "tenant")?,
            role_id: parse_uuid(&self.role_id, "role")?,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            status: parse_status(&self.status)?,
            granted_permissions: self.granted_permissions,
            revoked_permissions: self.revoked_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct UserRowWithId {
    record_id: String,
    tenant_id: Option<String>,
    role_id: String,
    email: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    status: String,
    granted_permissions: Vec<String>,
    revoked_permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRowWithId {
    fn try_into_user(self) -> Result<User, DbError> {
        let id = parse_uuid(&self.record_id, "user")?;
        UserRow {
            tenant_id: self.tenant_id,
            role_id: self.role_id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            password_hash: self.password_hash,
            status: self.status,
            granted_permissions: self.granted_permissions,
            revoked_permissions: self.revoked_permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_user(id)
    }
}

#[derive(Debug, SurrealValue)]
struct SeatLimitRow {
    max_users: u32,
}

#[derive(Debug, SurrealValue)]
struct RolePermissionsRow {
    permissions: Vec<String>,
}

fn parse_status(s: &str) -> Result<UserStatus, DbError> {
    match s {
        "Active" => Ok(UserStatus::Active),
        "Inactive" => Ok(UserStatus::Inactive),
        "Suspended" => Ok(UserStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown user status: {other}"))),
    }
}

fn status_to_string(s: UserStatus) -> &'static str {
    match s {
        UserStatus::Active => "Active",
        UserStatus::Inactive => "Inactive",
        UserStatus::Suspended => "Suspended",
    }
}

fn normalize_email(email: &str) -> AtelierResult<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AtelierError::validation(format!(
            "invalid email address: {email:?}"
        ))),
    }
}

/// Hash a password with Argon2id using OWASP-recommended parameters.
///
/// If a pepper is provided, it is prepended to the password before
/// hashing. The salt is randomly generated for each call.
pub fn hash_password(password: &str, pepper: Option<&str>) -> Result<String, DbError> {
    // OWASP ASVS: m=19456 (19 MiB), t=2, p=1
    let params = argon2::Params::new(19456, 2, 1, None)
        .map_err(|e| DbError::Query(format!("argon2 params error: {e}")))?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let input = match pepper {
        Some(p) => format!("{p}{password}"),
        None => password.to_owned(),
    };

    let salt = SaltString::generate(&mut argon2::password_hash::rand_core::OsRng);
    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| DbError::Query(format!("password hash error: {e}")))?;

    Ok(hash.to_string())
}

/// SurrealDB implementation of the User repository.
#[derive(Clone)]
pub struct SurrealUserRepository<C: Connection> {
    db: Surreal<C>,
    /// Optional server-side pepper for password hashing.
    pepper: Option<String>,
}

impl<C: Connection> SurrealUserRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db, pepper: None }
    }

    pub fn with_pepper(db: Surreal<C>, pepper: String) -> Self {
        Self {
            db,
            pepper: Some(pepper),
        }
    }

    /// Reject the insert when the tenant is already at its seat limit.
    async fn check_seat_limit(&self, tenant_id: Uuid) -> AtelierResult<()> {
        let tenant_id_str = tenant_id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT max_users FROM type::record('tenant', $tenant_id); \
                 SELECT count() AS total FROM user \
                 WHERE tenant_id = $tenant_id AND status = 'Active' GROUP ALL;",
            )
            .bind(("tenant_id", tenant_id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let limits: Vec<SeatLimitRow> = result.take(0).map_err(DbError::from)?;
        let limit = limits.first().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: tenant_id_str,
        })?;
        let counts: Vec<CountRow> = result.take(1).map_err(DbError::from)?;
        let active = counts.first().map_or(0, |r| r.total);

        if active >= u64::from(limit.max_users) {
            debug!(%tenant_id, active, max_users = limit.max_users, "seat limit reached");
            return Err(AtelierError::Conflict {
                reason: format!("tenant has reached its limit of {} users", limit.max_users),
            });
        }
        Ok(())
    }

    /// The role must be a system role or belong to `tenant_id`, and a
    /// salon user's role may not carry `:all` permissions.
    async fn check_role_assignable(
        &self,
        tenant_id: Option<Uuid>,
        role_id: Uuid,
    ) -> AtelierResult<()> {
        let scope = TenantScope::new(&TenantContext::for_tenant(tenant_id));
        let query = format!(
            "SELECT permissions FROM role \
             WHERE id = type::record('role', $role_id) AND {}",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<RolePermissionsRow> = result.take(0).map_err(DbError::from)?;

        let Some(role) = rows.into_iter().next() else {
            return Err(AtelierError::validation(format!(
                "role {role_id} is not available to this tenant"
            )));
        };
        if tenant_id.is_some() {
            reject_cross_tenant(&role.permissions, "role")?;
        }
        Ok(())
    }
}

/// Per-user overrides must come from the catalog, and salon users may
/// not be granted `:all` tokens. Revoking one is harmless.
fn check_overrides(
    tenant_id: Option<Uuid>,
    granted: Option<&[String]>,
    revoked: Option<&[String]>,
) -> AtelierResult<()> {
    for tokens in [granted, revoked].into_iter().flatten() {
        let unknown = catalog::unknown(tokens);
        if !unknown.is_empty() {
            return Err(
                AuthzError::UnknownPermissions(unknown.into_iter().map(String::from).collect())
                    .into(),
            );
        }
    }
    if tenant_id.is_some()
        && let Some(granted) = granted
    {
        reject_cross_tenant(granted, "grant")?;
    }
    Ok(())
}

fn reject_cross_tenant(permissions: &[String], what: &str) -> AtelierResult<()> {
    let cross = catalog::cross_tenant(permissions);
    if cross.is_empty() {
        return Ok(());
    }
    Err(AtelierError::validation(format!(
        "{what} carries platform-wide permissions not allowed for salon users: {}",
        cross.join(", ")
    )))
}

impl<C: Connection> UserRepository for SurrealUserRepository<C> {
    async fn create(&self, ctx: &TenantContext, input: CreateUser) -> AtelierResult<User> {
        ctx.check_write(input.tenant_id)?;
        let email = normalize_email(&input.email)?;

        if let Some(tenant_id) = input.tenant_id {
            self.check_seat_limit(tenant_id).await?;
        }
        self.check_role_assignable(input.tenant_id, input.role_id).await?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let password_hash = hash_password(&input.password, self.pepper.as_deref())?;

        let result = self
            .db
            .query(
                "CREATE type::record('user', $id) SET \
                 tenant_id = $tenant_id, role_id = $role_id, \
                 email = $email, \
                 first_name = $first_name, last_name = $last_name, \
                 password_hash = $password_hash, \
                 status = 'Active', \
                 granted_permissions = [], revoked_permissions = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("role_id", input.role_id.to_string()))
            .bind(("email", email))
            .bind(("first_name", input.first_name))
            .bind(("last_name", input.last_name))
            .bind(("password_hash", password_hash))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        info!(user_id = %id, tenant_id = ?input.tenant_id, "user created");
        Ok(row.into_user(id)?)
    }

    async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<User> {
        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let query = format!(
            "SELECT * FROM type::record('user', $id) WHERE {}",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn get_by_email(&self, ctx: &TenantContext, email: &str) -> AtelierResult<User> {
        let scope = TenantScope::new(ctx);
        let email = email.trim().to_lowercase();

        // Under a tenant context, the tenant's own account wins over a
        // platform account with the same address.
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user \
             WHERE email = $email AND {} \
             ORDER BY tenant_id DESC LIMIT 1",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_user()?)
    }

    async fn update(&self, ctx: &TenantContext, id: Uuid, input: UpdateUser) -> AtelierResult<User> {
        let existing = self.get_by_id(ctx, id).await?;
        ctx.check_write(existing.tenant_id)?;

        let email = input.email.as_deref().map(normalize_email).transpose()?;
        if let Some(role_id) = input.role_id {
            self.check_role_assignable(existing.tenant_id, role_id).await?;
        }
        check_overrides(
            existing.tenant_id,
            input.granted_permissions.as_deref(),
            input.revoked_permissions.as_deref(),
        )?;
        // Reactivating counts against the seat limit again.
        if input.status == Some(UserStatus::Active)
            && existing.status != UserStatus::Active
            && let Some(tenant_id) = existing.tenant_id
        {
            self.check_seat_limit(tenant_id).await?;
        }

        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if email.is_some() {
            sets.push("email = $email");
        }
        if input.first_name.is_some() {
            sets.push("first_name = $first_name");
        }
        if input.last_name.is_some() {
            sets.push("last_name = $last_name");
        }
        if input.role_id.is_some() {
            sets.push("role_id = $role_id");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.granted_permissions.is_some() {
            sets.push("granted_permissions = $granted");
        }
        if input.revoked_permissions.is_some() {
            sets.push("revoked_permissions = $revoked");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('user', $id) SET {} WHERE {}",
            sets.join(", "),
            scope.writable()
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()));
        if let Some(email) = email {
            builder = builder.bind(("email", email));
        }
        if let Some(first_name) = input.first_name {
            builder = builder.bind(("first_name", first_name));
        }
        if let Some(last_name) = input.last_name {
            builder = builder.bind(("last_name", last_name));
        }
        if let Some(role_id) = input.role_id {
            builder = builder.bind(("role_id", role_id.to_string()));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }
        if let Some(granted) = input.granted_permissions {
            builder = builder.bind(("granted", granted));
        }
        if let Some(revoked) = input.revoked_permissions {
            builder = builder.bind(("revoked", revoked));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::from_check("user", e))?;

        let rows: Vec<UserRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "user".into(),
            id: id_str,
        })?;

        Ok(row.into_user(id)?)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<()> {
        let existing = self.get_by_id(ctx, id).await?;
        ctx.check_write(existing.tenant_id)?;

        let scope = TenantScope::new(ctx);
        let query = format!(
            "UPDATE type::record('user', $id) SET \
             status = 'Inactive', updated_at = time::now() WHERE {}",
            scope.writable()
        );
        self.db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        info!(user_id = %id, "user deactivated");
        Ok(())
    }

    async fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> AtelierResult<PaginatedResult<User>> {
        let scope = TenantScope::new(ctx);

        let count_query = format!(
            "SELECT count() AS total FROM user WHERE {} GROUP ALL",
            scope.visible()
        );
        let mut count_result = self
            .db
            .query(count_query)
            .bind(scope.binding())
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map_or(0, |r| r.total);

        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM user WHERE {} \
             ORDER BY created_at ASC LIMIT $limit START $offset",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<UserRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(UserRowWithId::try_into_user)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(
            normalize_email("  Mia@Studio-Rosa.example ").unwrap(),
            "mia@studio-rosa.example"
        );
        assert!(normalize_email("mia").is_err());
        assert!(normalize_email("@studio.example").is_err());
        assert!(normalize_email("mia@localhost").is_err());
    }

    #[test]
    fn hashes_are_salted_phc_strings() {
        let a = hash_password("correct horse", None).unwrap();
        let b = hash_password("correct horse", None).unwrap();
        assert!(a.starts_with("$argon2id$"));
        assert_ne!(a, b);
    }
}
