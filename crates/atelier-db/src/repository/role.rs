//! SurrealDB implementation of [`RoleRepository`].
//!
//! System roles (`tenant_id = NONE`) are visible to every tenant but can
//! only be written from the system context; tenant roles are visible and
//! writable only inside their own tenant.

use atelier_authz::catalog;
use atelier_authz::error::AuthzError;
use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::role::{CreateRole, Role, RoleType, UpdateRole};
use atelier_core::repository::{PaginatedResult, Pagination, RoleRepository};
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
struct RoleRow {
    tenant_id: Option<String>,
    name: String,
    description: String,
    role_type: String,
    level: u32,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        let level = u8::try_from(self.level)
            .map_err(|_| DbError::Decode(format!("role level out of range: {}", self.level)))?;
        Ok(Role {
            id,
            name: self.name,
            description: self.description,
            role_type: parse_role_type(&self.role_type)?,
            tenant_id: parse_opt_uuid(self.tenant_id.as_deref(), "tenant")?,
            level,
            permissions: self.permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    tenant_id: Option<String>,
    name: String,
    description: String,
    role_type: String,
    level: u32,
    permissions: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = parse_uuid(&self.record_id, "role")?;
        RoleRow {
            tenant_id: self.tenant_id,
            name: self.name,
            description: self.description,
            role_type: self.role_type,
            level: self.level,
            permissions: self.permissions,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_role(id)
    }
}

fn parse_role_type(s: &str) -> Result<RoleType, DbError> {
    match s {
        "System" => Ok(RoleType::System),
        "Tenant" => Ok(RoleType::Tenant),
        other => Err(DbError::Decode(format!("unknown role type: {other}"))),
    }
}

fn role_type_to_string(t: RoleType) -> &'static str {
    match t {
        RoleType::System => "System",
        RoleType::Tenant => "Tenant",
    }
}

/// Every permission a role carries must come from the catalog.
fn check_catalog(permissions: &[String]) -> AtelierResult<()> {
    let unknown = catalog::unknown(permissions);
    if unknown.is_empty() {
        return Ok(());
    }
    Err(AuthzError::UnknownPermissions(unknown.into_iter().map(String::from).collect()).into())
}

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Active holders across every tenant. Used to block deletes, where a
    /// system role's tenant holders must count even under the system
    /// context.
    async fn active_holders(&self, id: Uuid) -> Result<u64, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM user \
                 WHERE role_id = $role_id AND status = 'Active' GROUP ALL",
            )
            .bind(("role_id", id.to_string()))
            .await?;
        let rows: Vec<CountRow> = result.take(0)?;
        Ok(rows.first().map_or(0, |r| r.total))
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, ctx: &TenantContext, input: CreateRole) -> AtelierResult<Role> {
        input.validate()?;
        check_catalog(&input.permissions)?;
        ctx.check_write(input.tenant_id)?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 tenant_id = $tenant_id, \
                 name = $name, description = $description, \
                 role_type = $role_type, level = $level, \
                 permissions = $permissions",
            )
            .bind(("id", id_str.clone()))
            .bind(("tenant_id", input.tenant_id.map(|t| t.to_string())))
            .bind(("name", input.name.clone()))
            .bind(("description", input.description))
            .bind(("role_type", role_type_to_string(input.role_type)))
            .bind(("level", u32::from(input.level)))
            .bind(("permissions", input.permissions))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::from_check("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        info!(role_id = %id, name = %input.name, tenant_id = ?input.tenant_id, "role created");
        Ok(row.into_role(id)?)
    }

    async fn get_by_id(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<Role> {
        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let query = format!(
            "SELECT * FROM type::record('role', $id) WHERE {}",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_name(&self, ctx: &TenantContext, name: &str) -> AtelierResult<Role> {
        let scope = TenantScope::new(ctx);

        // A tenant role shadows a system role of the same name.
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM role \
             WHERE name = $name AND {} \
             ORDER BY role_type DESC LIMIT 1",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("name", name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: format!("name={name}"),
        })?;

        Ok(row.try_into_role()?)
    }

    async fn update(&self, ctx: &TenantContext, id: Uuid, input: UpdateRole) -> AtelierResult<Role> {
        input.validate()?;
        if let Some(permissions) = &input.permissions {
            check_catalog(permissions)?;
        }

        let existing = self.get_by_id(ctx, id).await?;
        ctx.check_write(existing.tenant_id)?;

        let scope = TenantScope::new(ctx);
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.level.is_some() {
            sets.push("level = $level");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} WHERE {}",
            sets.join(", "),
            scope.writable()
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(scope.binding())
            .bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(level) = input.level {
            builder = builder.bind(("level", u32::from(level)));
        }
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", permissions));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result.check().map_err(|e| DbError::from_check("role", e))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<()> {
        let existing = self.get_by_id(ctx, id).await?;
        ctx.check_write(existing.tenant_id)?;

        let holders = self.active_holders(id).await?;
        if holders > 0 {
            debug!(role_id = %id, holders, "role delete blocked");
            return Err(AtelierError::Conflict {
                reason: format!("role is held by {holders} active user(s)"),
            });
        }

        let scope = TenantScope::new(ctx);
        let query = format!(
            "DELETE type::record('role', $id) WHERE {}",
            scope.writable()
        );
        self.db
            .query(query)
            .bind(scope.binding())
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        info!(role_id = %id, name = %existing.name, "role deleted");
        Ok(())
    }

    async fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> AtelierResult<PaginatedResult<Role>> {
        let scope = TenantScope::new(ctx);

        let count_query = format!(
            "SELECT count() AS total FROM role WHERE {} GROUP ALL",
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
            "SELECT meta::id(id) AS record_id, * FROM role WHERE {} \
             ORDER BY level DESC, name ASC LIMIT $limit START $offset",
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

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(RoleRowWithId::try_into_role)
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_active_users(&self, ctx: &TenantContext, id: Uuid) -> AtelierResult<u64> {
        let scope = TenantScope::new(ctx);
        self.get_by_id(ctx, id).await?;

        let query = format!(
            "SELECT count() AS total FROM user \
             WHERE role_id = $role_id AND status = 'Active' AND {} GROUP ALL",
            scope.visible()
        );
        let mut result = self
            .db
            .query(query)
            .bind(scope.binding())
            .bind(("role_id", id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map_or(0, |r| r.total))
    }
}
