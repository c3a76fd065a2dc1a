//! The authenticated caller as seen by the evaluator.

use std::collections::HashSet;

use atelier_core::models::role::Role;
use atelier_core::models::user::User;
use atelier_core::tenant_context::TenantContext;
use uuid::Uuid;

/// A user with its permission set resolved for the current request.
#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role_id: Uuid,
    pub role_level: u8,
    permissions: HashSet<String>,
}

impl Principal {
    pub fn new<I, S>(
        user_id: Uuid,
        tenant_id: Option<Uuid>,
        role_id: Uuid,
        role_level: u8,
        permissions: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id,
            tenant_id,
            role_id,
            role_level,
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve the effective permission set:
    /// `(role.permissions ∪ user.granted) ∖ user.revoked`.
    pub fn from_user_and_role(user: &User, role: &Role) -> Self {
        let revoked: HashSet<&str> = user.revoked_permissions.iter().map(String::as_str).collect();
        let permissions = role
            .permissions
            .iter()
            .chain(&user.granted_permissions)
            .filter(|p| !revoked.contains(p.as_str()))
            .cloned();

        Self::new(user.id, user.tenant_id, role.id, role.level, permissions)
    }

    pub fn permissions(&self) -> &HashSet<String> {
        &self.permissions
    }

    /// The tenant context requests made by this principal run under.
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext::for_tenant(self.tenant_id)
    }
}
