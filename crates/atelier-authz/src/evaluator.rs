//! Data scoping evaluator.
//!
//! Answers "may this principal perform this operation on this entity?".
//! The coarse predicates ([`has_permission`], [`has_any_permission`],
//! [`has_all_permissions`]) are plain set membership and ignore tenants;
//! [`can_access_entity`] additionally enforces the token's scope against
//! the entity's owning tenant.

use atelier_core::models::role::Role;
use atelier_core::tenant_context::TenantOwned;
use tracing::debug;

use crate::catalog;
use crate::error::{AuthzError, AuthzResult};
use crate::principal::Principal;
use crate::token::{PermissionToken, Scope};

pub fn has_permission(principal: &Principal, token: &str) -> bool {
    principal.permissions().contains(token)
}

/// OR across `tokens`. False for an empty list.
pub fn has_any_permission(principal: &Principal, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| has_permission(principal, t))
}

/// AND across `tokens`. Vacuously true for an empty list.
pub fn has_all_permissions(principal: &Principal, tokens: &[&str]) -> bool {
    tokens.iter().all(|t| has_permission(principal, t))
}

/// Decide whether `principal` may use `token` against `entity`.
///
/// - `:all` — the exact token is enough, whatever tenant owns the entity.
/// - `:own` — the exact token plus an exact tenant match; two absent
///   tenants match (system-to-system access).
/// - unscoped — plain membership.
///
/// A malformed token never grants access.
pub fn can_access_entity<E>(principal: &Principal, entity: &E, token: &str) -> bool
where
    E: TenantOwned + ?Sized,
{
    let parsed = match PermissionToken::parse(token) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(%err, "rejecting malformed permission token");
            return false;
        }
    };

    if !has_permission(principal, token) {
        return false;
    }

    match parsed.scope {
        Some(Scope::All) | None => true,
        Some(Scope::Own) => entity.tenant_id() == principal.tenant_id,
    }
}

/// Try `resource:action:all`, then `resource:action:own`; deny if
/// neither grants access to `entity`.
pub fn require_permission<E>(
    principal: &Principal,
    entity: &E,
    action: &str,
    resource: &str,
) -> AuthzResult<()>
where
    E: TenantOwned + ?Sized,
{
    for scope in [Scope::All, Scope::Own] {
        let token = PermissionToken::compose(resource, action, scope);
        if can_access_entity(principal, entity, &token) {
            return Ok(());
        }
    }

    debug!(
        user_id = %principal.user_id,
        resource,
        action,
        "entity access denied"
    );
    Err(AuthzError::forbidden(format!(
        "{resource}:{action} not permitted on this entity"
    )))
}

/// Whether the principal sits strictly above `role` in the hierarchy.
pub fn outranks(principal: &Principal, role: &Role) -> bool {
    principal.role_level > role.level
}

/// Whether the principal may hand `role` to a user.
///
/// Requires outranking the role, and either `roles:assign:all`, or
/// `roles:assign:own` with the role being a shared system role or one of
/// the principal's own tenant roles.
pub fn can_assign_role(principal: &Principal, role: &Role) -> bool {
    if !outranks(principal, role) {
        return false;
    }
    if has_permission(principal, catalog::ROLES_ASSIGN_ALL) {
        return true;
    }
    has_permission(principal, catalog::ROLES_ASSIGN_OWN)
        && (role.tenant_id.is_none() || role.tenant_id == principal.tenant_id)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use atelier_core::models::role::RoleType;

    struct Row(Option<Uuid>);

    impl TenantOwned for Row {
        fn tenant_id(&self) -> Option<Uuid> {
            self.0
        }
    }

    fn principal(tenant_id: Option<Uuid>, permissions: &[&str]) -> Principal {
        Principal::new(
            Uuid::new_v4(),
            tenant_id,
            Uuid::new_v4(),
            50,
            permissions.iter().copied(),
        )
    }

    fn role(tenant_id: Option<Uuid>, level: u8) -> Role {
        Role {
            id: Uuid::new_v4(),
            name: "r".into(),
            description: String::new(),
            role_type: if tenant_id.is_some() {
                RoleType::Tenant
            } else {
                RoleType::System
            },
            tenant_id,
            level,
            permissions: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn has_permission_is_set_membership() {
        let p = principal(None, &["users:read:own", "profile:read"]);
        assert!(has_permission(&p, "users:read:own"));
        assert!(has_permission(&p, "profile:read"));
        assert!(!has_permission(&p, "users:read:all"));
        assert!(!has_permission(&p, "users:read"));
    }

    #[test]
    fn any_and_all() {
        let p = principal(None, &["b"]);
        assert!(has_any_permission(&p, &["a", "b"]));
        assert!(!has_all_permissions(&p, &["a", "b"]));
        assert!(!has_any_permission(&p, &[]));
        assert!(has_all_permissions(&p, &[]));
    }

    #[test]
    fn all_scope_ignores_entity_tenant() {
        let p = principal(Some(Uuid::new_v4()), &["customers:read:all"]);
        for entity_tenant in [None, p.tenant_id, Some(Uuid::new_v4())] {
            assert!(can_access_entity(&p, &Row(entity_tenant), "customers:read:all"));
        }
    }

    #[test]
    fn own_scope_requires_matching_tenant() {
        let t1 = Uuid::new_v4();
        let p = principal(Some(t1), &["customers:read:own"]);

        assert!(can_access_entity(&p, &Row(Some(t1)), "customers:read:own"));
        assert!(!can_access_entity(&p, &Row(Some(Uuid::new_v4())), "customers:read:own"));
        assert!(!can_access_entity(&p, &Row(None), "customers:read:own"));
    }

    #[test]
    fn own_scope_matches_when_both_tenants_absent() {
        let p = principal(None, &["roles:update:own"]);
        assert!(can_access_entity(&p, &Row(None), "roles:update:own"));
        assert!(!can_access_entity(&p, &Row(Some(Uuid::new_v4())), "roles:update:own"));
    }

    #[test]
    fn no_implicit_escalation() {
        let t1 = Uuid::new_v4();
        let p = principal(Some(t1), &["customers:update:all"]);
        assert!(!can_access_entity(&p, &Row(Some(t1)), "customers:update:own"));
        assert!(!can_access_entity(&p, &Row(Some(t1)), "customers:read:all"));
    }

    #[test]
    fn malformed_tokens_never_grant() {
        let p = principal(None, &["users:read:mine"]);
        assert!(!can_access_entity(&p, &Row(None), "users:read:mine"));
    }

    #[test]
    fn require_permission_own_scenarios() {
        let t1 = Uuid::new_v4();
        let p = principal(Some(t1), &["users:read:own"]);

        assert!(require_permission(&p, &Row(Some(t1)), "read", "users").is_ok());
        assert!(matches!(
            require_permission(&p, &Row(Some(Uuid::new_v4())), "read", "users"),
            Err(AuthzError::Forbidden { .. })
        ));
    }

    #[test]
    fn require_permission_all_scenario() {
        let p = principal(Some(Uuid::new_v4()), &["users:read:all"]);
        for entity_tenant in [None, Some(Uuid::new_v4())] {
            assert!(require_permission(&p, &Row(entity_tenant), "read", "users").is_ok());
        }
    }

    #[test]
    fn empty_permission_set_denies() {
        let p = principal(None, &[]);
        assert!(require_permission(&p, &Row(None), "read", "users").is_err());
    }

    #[test]
    fn role_assignment_respects_hierarchy_and_scope() {
        let t1 = Uuid::new_v4();
        let owner = principal(Some(t1), &[catalog::ROLES_ASSIGN_OWN]);

        assert!(can_assign_role(&owner, &role(None, 40)));
        assert!(can_assign_role(&owner, &role(Some(t1), 40)));
        assert!(!can_assign_role(&owner, &role(Some(Uuid::new_v4()), 40)));
        // Equal level is not outranked.
        assert!(!can_assign_role(&owner, &role(Some(t1), 50)));

        let admin = principal(None, &[catalog::ROLES_ASSIGN_ALL]);
        assert!(can_assign_role(&admin, &role(Some(t1), 10)));
    }
}
