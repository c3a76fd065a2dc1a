//! SurrealDB implementation of [`TenantRepository`].
//!
//! Tenants are platform-scoped: the table has no `tenant_id` column and
//! no tenant row filter applies. Callers gate access with the
//! `tenants:*` permissions instead.

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::tenant::{
    CreateTenant, SubscriptionPlan, Tenant, TenantStatus, UpdateTenant,
};
use atelier_core::repository::{PaginatedResult, Pagination, TenantRepository};
use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, parse_uuid};
use crate::repository::CountRow;

#[derive(Debug, SurrealValue)]
struct TenantRow {
    name: String,
    slug: String,
    subscription_plan: String,
    max_users: u32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRow {
    fn into_tenant(self, id: Uuid) -> Result<Tenant, DbError> {
        Ok(Tenant {
            id,
            name: self.name,
            slug: self.slug,
            subscription_plan: parse_plan(&self.subscription_plan)?,
            max_users: self.max_users,
            status: parse_status(&self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct TenantRowWithId {
    record_id: String,
    name: String,
    slug: String,
    subscription_plan: String,
    max_users: u32,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TenantRowWithId {
    fn try_into_tenant(self) -> Result<Tenant, DbError> {
        let id = parse_uuid(&self.record_id, "tenant")?;
        TenantRow {
            name: self.name,
            slug: self.slug,
            subscription_plan: self.subscription_plan,
            max_users: self.max_users,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_tenant(id)
    }
}

fn parse_plan(s: &str) -> Result<SubscriptionPlan, DbError> {
    match s {
        "Free" => Ok(SubscriptionPlan::Free),
        "Basic" => Ok(SubscriptionPlan::Basic),
        "Professional" => Ok(SubscriptionPlan::Professional),
        "Enterprise" => Ok(SubscriptionPlan::Enterprise),
        other => Err(DbError::Decode(format!("unknown subscription plan: {other}"))),
    }
}

fn plan_to_string(p: SubscriptionPlan) -> &'static str {
    match p {
        SubscriptionPlan::Free => "Free",
        SubscriptionPlan::Basic => "Basic",
        SubscriptionPlan::Professional => "Professional",
        SubscriptionPlan::Enterprise => "Enterprise",
    }
}

fn parse_status(s: &str) -> Result<TenantStatus, DbError> {
    match s {
        "Active" => Ok(TenantStatus::Active),
        "Trial" => Ok(TenantStatus::Trial),
        "Suspended" => Ok(TenantStatus::Suspended),
        "Cancelled" => Ok(TenantStatus::Cancelled),
        other => Err(DbError::Decode(format!("unknown tenant status: {other}"))),
    }
}

fn status_to_string(s: TenantStatus) -> &'static str {
    match s {
        TenantStatus::Active => "Active",
        TenantStatus::Trial => "Trial",
        TenantStatus::Suspended => "Suspended",
        TenantStatus::Cancelled => "Cancelled",
    }
}

fn check_slug(slug: &str) -> AtelierResult<()> {
    let valid = !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
    if valid {
        Ok(())
    } else {
        Err(AtelierError::validation(format!(
            "tenant slug {slug:?} must be lowercase letters, digits and dashes"
        )))
    }
}

/// SurrealDB implementation of the Tenant repository.
#[derive(Clone)]
pub struct SurrealTenantRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTenantRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TenantRepository for SurrealTenantRepository<C> {
    async fn create(&self, input: CreateTenant) -> AtelierResult<Tenant> {
        check_slug(&input.slug)?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let max_users = input
            .max_users
            .unwrap_or_else(|| input.subscription_plan.default_max_users());

        // New tenants start on a trial.
        let result = self
            .db
            .query(
                "CREATE type::record('tenant', $id) SET \
                 name = $name, slug = $slug, \
                 subscription_plan = $plan, \
                 max_users = $max_users, \
                 status = 'Trial'",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug.clone()))
            .bind(("plan", plan_to_string(input.subscription_plan)))
            .bind(("max_users", max_users))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        info!(tenant_id = %id, slug = %input.slug, "tenant created");
        Ok(row.into_tenant(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> AtelierResult<Tenant> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('tenant', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> AtelierResult<Tenant> {
        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM tenant WHERE slug = $slug")
            .bind(("slug", slug.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_tenant()?)
    }

    async fn update(&self, id: Uuid, input: UpdateTenant) -> AtelierResult<Tenant> {
        if let Some(slug) = &input.slug {
            check_slug(slug)?;
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.slug.is_some() {
            sets.push("slug = $slug");
        }
        if input.subscription_plan.is_some() {
            sets.push("subscription_plan = $plan");
        }
        if input.max_users.is_some() {
            sets.push("max_users = $max_users");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('tenant', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(slug) = input.slug {
            builder = builder.bind(("slug", slug));
        }
        if let Some(plan) = input.subscription_plan {
            builder = builder.bind(("plan", plan_to_string(plan)));
        }
        if let Some(max_users) = input.max_users {
            builder = builder.bind(("max_users", max_users));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check("tenant", e))?;

        let rows: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "tenant".into(),
            id: id_str,
        })?;

        Ok(row.into_tenant(id)?)
    }

    async fn delete(&self, id: Uuid) -> AtelierResult<()> {
        let id_str = id.to_string();

        let mut count = self
            .db
            .query("SELECT count() AS total FROM user WHERE tenant_id = $id GROUP ALL")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = count.take(0).map_err(DbError::from)?;
        let users = rows.first().map_or(0, |r| r.total);
        if users > 0 {
            return Err(AtelierError::Conflict {
                reason: format!("tenant still has {users} user(s)"),
            });
        }

        let mut result = self
            .db
            .query(
                "DELETE type::record('tenant', $id) RETURN BEFORE; \
                 DELETE role WHERE tenant_id = $id; \
                 DELETE customer WHERE tenant_id = $id;",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let deleted: Vec<TenantRow> = result.take(0).map_err(DbError::from)?;
        if deleted.is_empty() {
            return Err(DbError::NotFound {
                entity: "tenant".into(),
                id: id_str,
            }
            .into());
        }

        info!(tenant_id = %id, "tenant deleted");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> AtelierResult<PaginatedResult<Tenant>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM tenant GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map_or(0, |r| r.total);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM tenant \
                 ORDER BY created_at ASC LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TenantRowWithId> = result.take(0).map_err(DbError::from)?;
        let items = rows
            .into_iter()
            .map(TenantRowWithId::try_into_tenant)
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
    fn slug_rules() {
        assert!(check_slug("studio-rosa").is_ok());
        assert!(check_slug("salon42").is_ok());
        assert!(check_slug("").is_err());
        assert!(check_slug("Studio Rosa").is_err());
    }

    #[test]
    fn enum_strings_round_trip() {
        for plan in [
            SubscriptionPlan::Free,
            SubscriptionPlan::Basic,
            SubscriptionPlan::Professional,
            SubscriptionPlan::Enterprise,
        ] {
            assert_eq!(parse_plan(plan_to_string(plan)).unwrap(), plan);
        }
        assert!(parse_status("Archived").is_err());
    }
}
