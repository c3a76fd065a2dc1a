//! Tenant row filter applied by every tenant-scoped repository.
//!
//! Each scoped query binds the request's tenant as `$current_tenant` and
//! splices one of the predicates below into its `WHERE` clause:
//!
//! - reads see rows of the current tenant plus rows with no tenant;
//! - writes only touch rows of exactly the current tenant;
//! - a [`TenantContext::System`] context matches `tenant_id = NONE` only,
//!   so a cleared context narrows visibility instead of widening it.
//!
//! Session rows carry no tenant and are filtered through their user.

use atelier_core::tenant_context::TenantContext;

/// Name of the bound query parameter carrying the tenant id.
pub const TENANT_PARAM: &str = "current_tenant";

/// Filter predicates for one request's tenant context.
#[derive(Debug, Clone, Copy)]
pub struct TenantScope {
    ctx: TenantContext,
}

impl TenantScope {
    pub fn new(ctx: &TenantContext) -> Self {
        Self { ctx: *ctx }
    }

    pub fn context(&self) -> TenantContext {
        self.ctx
    }

    /// The `$current_tenant` binding for the query.
    pub fn binding(&self) -> (&'static str, Option<String>) {
        (TENANT_PARAM, self.ctx.tenant_id().map(|t| t.to_string()))
    }

    /// Read predicate over a row's `tenant_id`.
    pub fn visible(&self) -> &'static str {
        match self.ctx {
            TenantContext::Tenant(_) => "(tenant_id = $current_tenant OR tenant_id = NONE)",
            TenantContext::System => "tenant_id = NONE",
        }
    }

    /// Write predicate over a row's `tenant_id`.
    pub fn writable(&self) -> &'static str {
        match self.ctx {
            TenantContext::Tenant(_) => "tenant_id = $current_tenant",
            TenantContext::System => "tenant_id = NONE",
        }
    }

    /// Read predicate for rows keyed by `user_id` (sessions).
    pub fn user_visible(&self) -> &'static str {
        match self.ctx {
            TenantContext::Tenant(_) => {
                "user_id IN (SELECT VALUE meta::id(id) FROM user \
                 WHERE tenant_id = $current_tenant OR tenant_id = NONE)"
            }
            TenantContext::System => {
                "user_id IN (SELECT VALUE meta::id(id) FROM user \
                 WHERE tenant_id = NONE)"
            }
        }
    }

    /// Write predicate for rows keyed by `user_id` (sessions).
    pub fn user_writable(&self) -> &'static str {
        match self.ctx {
            TenantContext::Tenant(_) => {
                "user_id IN (SELECT VALUE meta::id(id) FROM user \
                 WHERE tenant_id = $current_tenant)"
            }
            TenantContext::System => {
                "user_id IN (SELECT VALUE meta::id(id) FROM user \
                 WHERE tenant_id = NONE)"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn tenant_scope_binds_tenant_id() {
        let t = Uuid::new_v4();
        let scope = TenantScope::new(&TenantContext::Tenant(t));
        assert_eq!(scope.binding(), (TENANT_PARAM, Some(t.to_string())));
        assert!(scope.visible().contains("$current_tenant"));
        assert!(scope.visible().contains("NONE"));
        assert!(!scope.writable().contains("NONE"));
    }

    #[test]
    fn system_scope_never_references_the_parameter() {
        let scope = TenantScope::new(&TenantContext::System);
        assert_eq!(scope.binding(), (TENANT_PARAM, None));
        for predicate in [
            scope.visible(),
            scope.writable(),
            scope.user_visible(),
            scope.user_writable(),
        ] {
            assert!(!predicate.contains("$current_tenant"), "{predicate}");
        }
    }
}
