//! Per-request tenant context.
//!
//! Every tenant-scoped repository call takes a [`TenantContext`]. The
//! type deliberately has no `Default`: a request that reaches the data
//! layer without a context is rejected through
//! [`TenantContext::require`] instead of silently seeing every row.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AtelierError, AtelierResult};

/// The tenant on whose behalf the current request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenantContext {
    /// Requests made by a member of a tenant.
    Tenant(Uuid),
    /// Platform-level requests (context explicitly cleared). Only rows
    /// with no tenant are visible.
    System,
}

impl TenantContext {
    /// Build a context from an optional tenant id (`None` ⇒ `System`).
    pub fn for_tenant(tenant_id: Option<Uuid>) -> Self {
        match tenant_id {
            Some(id) => Self::Tenant(id),
            None => Self::System,
        }
    }

    /// Reject a request whose context was never established.
    pub fn require(ctx: Option<Self>) -> AtelierResult<Self> {
        ctx.ok_or(AtelierError::TenantContext)
    }

    /// The tenant id bound into scoped queries (`None` for `System`).
    pub fn tenant_id(&self) -> Option<Uuid> {
        match self {
            Self::Tenant(id) => Some(*id),
            Self::System => None,
        }
    }

    /// Row visibility: a row is visible when it belongs to the context's
    /// tenant or to no tenant at all.
    pub fn can_see(&self, row_tenant: Option<Uuid>) -> bool {
        row_tenant.is_none() || row_tenant == self.tenant_id()
    }

    /// Write check: rows may only be written inside the exact context.
    pub fn can_write(&self, row_tenant: Option<Uuid>) -> bool {
        row_tenant == self.tenant_id()
    }

    /// Return [`AtelierError::AuthorizationDenied`] when a write targets a
    /// row outside this context.
    pub fn check_write(&self, row_tenant: Option<Uuid>) -> AtelierResult<()> {
        if self.can_write(row_tenant) {
            Ok(())
        } else {
            Err(AtelierError::AuthorizationDenied {
                reason: "row is outside the current tenant context".into(),
            })
        }
    }
}

/// Any row that carries a (possibly absent) owning tenant.
pub trait TenantOwned {
    fn tenant_id(&self) -> Option<Uuid>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_is_rejected() {
        assert!(matches!(
            TenantContext::require(None),
            Err(AtelierError::TenantContext)
        ));
        let t = Uuid::new_v4();
        assert_eq!(
            TenantContext::require(Some(TenantContext::Tenant(t))).unwrap(),
            TenantContext::Tenant(t)
        );
    }

    #[test]
    fn tenant_context_sees_own_and_global_rows() {
        let t1 = Uuid::new_v4();
        let t2 = Uuid::new_v4();
        let ctx = TenantContext::Tenant(t1);

        assert!(ctx.can_see(Some(t1)));
        assert!(ctx.can_see(None));
        assert!(!ctx.can_see(Some(t2)));
    }

    #[test]
    fn system_context_sees_only_global_rows() {
        let ctx = TenantContext::System;
        assert!(ctx.can_see(None));
        assert!(!ctx.can_see(Some(Uuid::new_v4())));
    }

    #[test]
    fn writes_require_exact_match() {
        let t1 = Uuid::new_v4();
        let ctx = TenantContext::Tenant(t1);
        assert!(ctx.check_write(Some(t1)).is_ok());
        assert!(ctx.check_write(None).is_err());
        assert!(TenantContext::System.check_write(None).is_ok());
        assert!(TenantContext::System.check_write(Some(t1)).is_err());
    }
}
