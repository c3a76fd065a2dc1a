//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories take a
//! [`TenantContext`] on every call; implementations must apply the
//! tenant row filter to every query they issue.

use uuid::Uuid;

use crate::error::AtelierResult;
use crate::models::{
    customer::{CreateCustomer, Customer, UpdateCustomer},
    role::{CreateRole, Role, UpdateRole},
    session::{CreateSession, Session},
    tenant::{CreateTenant, Tenant, UpdateTenant},
    user::{CreateUser, UpdateUser, User},
};
use crate::tenant_context::TenantContext;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Tenants (platform scope)
// ---------------------------------------------------------------------------

pub trait TenantRepository: Send + Sync {
    fn create(&self, input: CreateTenant) -> impl Future<Output = AtelierResult<Tenant>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = AtelierResult<Tenant>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = AtelierResult<Tenant>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTenant,
    ) -> impl Future<Output = AtelierResult<Tenant>> + Send;
    /// Fails with `Conflict` while the tenant still owns users.
    fn delete(&self, id: Uuid) -> impl Future<Output = AtelierResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<Tenant>>> + Send;
}

// ---------------------------------------------------------------------------
// Tenant-scoped repositories
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateRole,
    ) -> impl Future<Output = AtelierResult<Role>> + Send;
    fn get_by_id(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = AtelierResult<Role>> + Send;
    fn get_by_name(
        &self,
        ctx: &TenantContext,
        name: &str,
    ) -> impl Future<Output = AtelierResult<Role>> + Send;
    fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = AtelierResult<Role>> + Send;
    /// Fails with `Conflict` while any active user holds the role.
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = AtelierResult<()>> + Send;
    /// Lists system roles plus the context tenant's own roles.
    fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<Role>>> + Send;
    /// Number of active users holding the role.
    fn count_active_users(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = AtelierResult<u64>> + Send;
}

pub trait UserRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateUser,
    ) -> impl Future<Output = AtelierResult<User>> + Send;
    fn get_by_id(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = AtelierResult<User>> + Send;
    fn get_by_email(
        &self,
        ctx: &TenantContext,
        email: &str,
    ) -> impl Future<Output = AtelierResult<User>> + Send;
    fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = AtelierResult<User>> + Send;
    /// Soft-delete: sets status to Inactive.
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = AtelierResult<()>> + Send;
    fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<User>>> + Send;
}

pub trait CustomerRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateCustomer,
    ) -> impl Future<Output = AtelierResult<Customer>> + Send;
    fn get_by_id(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = AtelierResult<Customer>> + Send;
    fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: UpdateCustomer,
    ) -> impl Future<Output = AtelierResult<Customer>> + Send;
    fn delete(&self, ctx: &TenantContext, id: Uuid)
    -> impl Future<Output = AtelierResult<()>> + Send;
    fn list(
        &self,
        ctx: &TenantContext,
        pagination: Pagination,
    ) -> impl Future<Output = AtelierResult<PaginatedResult<Customer>>> + Send;
}

/// Sessions are scoped indirectly: a session is visible only when its
/// user is visible under the context.
pub trait SessionRepository: Send + Sync {
    fn create(
        &self,
        ctx: &TenantContext,
        input: CreateSession,
    ) -> impl Future<Output = AtelierResult<Session>> + Send;
    fn get_by_token_hash(
        &self,
        ctx: &TenantContext,
        token_hash: &str,
    ) -> impl Future<Output = AtelierResult<Session>> + Send;
    /// Invalidate a single session.
    fn invalidate(
        &self,
        ctx: &TenantContext,
        id: Uuid,
    ) -> impl Future<Output = AtelierResult<()>> + Send;
    /// Invalidate all sessions for a user (e.g., on password change).
    fn invalidate_user_sessions(
        &self,
        ctx: &TenantContext,
        user_id: Uuid,
    ) -> impl Future<Output = AtelierResult<()>> + Send;
    /// Remove all expired sessions visible under the context.
    fn cleanup_expired(&self, ctx: &TenantContext)
    -> impl Future<Output = AtelierResult<u64>> + Send;
}
