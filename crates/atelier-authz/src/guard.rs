//! Route-level authorization guard.
//!
//! Each operation the API exposes is identified by a stable string id
//! (`customers.list`, `roles.update`, ...). A [`RouteTable`] maps those
//! ids to the [`PermissionRequirement`] they need; the guard consults it
//! before any business logic runs.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::error::{AuthzError, AuthzResult};
use crate::evaluator::{has_all_permissions, has_any_permission};
use crate::principal::Principal;

/// Permissions an operation requires, combined with OR (default) or AND.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionRequirement {
    pub permissions: &'static [&'static str],
    pub require_all: bool,
}

impl PermissionRequirement {
    /// Satisfied by any one of `permissions`.
    pub const fn any_of(permissions: &'static [&'static str]) -> Self {
        Self {
            permissions,
            require_all: false,
        }
    }

    /// Satisfied only by all of `permissions`.
    pub const fn all_of(permissions: &'static [&'static str]) -> Self {
        Self {
            permissions,
            require_all: true,
        }
    }

    /// Whether the requirement lists no permissions, which makes it no
    /// requirement at all.
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Evaluate against a principal's permission set.
    pub fn is_satisfied_by(&self, principal: &Principal) -> bool {
        if self.is_empty() {
            return true;
        }
        if principal.permissions().is_empty() {
            return false;
        }
        if self.require_all {
            has_all_permissions(principal, self.permissions)
        } else {
            has_any_permission(principal, self.permissions)
        }
    }
}

/// Static mapping from operation id to its requirement.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: HashMap<&'static str, PermissionRequirement>,
}

impl RouteTable {
    pub fn new(entries: &[(&'static str, PermissionRequirement)]) -> Self {
        Self {
            routes: entries.iter().copied().collect(),
        }
    }

    pub fn requirement(&self, operation: &str) -> Option<&PermissionRequirement> {
        self.routes.get(operation)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PermissionRequirement)> {
        self.routes.iter().map(|(op, req)| (*op, req))
    }
}

/// Guard behaviour switches.
#[derive(Debug, Clone, Default)]
pub struct GuardConfig {
    /// Deny operations that have no entry in the route table. Off by
    /// default: unannotated operations are allowed.
    pub deny_unannotated: bool,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// The requirement was satisfied.
    Allowed,
    /// The operation is listed with an empty requirement, or is absent
    /// and the guard is fail-open.
    Unrestricted,
    Denied,
}

impl GuardDecision {
    pub fn is_allowed(self) -> bool {
        !matches!(self, Self::Denied)
    }
}

pub struct AuthorizationGuard {
    routes: RouteTable,
    config: GuardConfig,
}

impl AuthorizationGuard {
    pub fn new(routes: RouteTable, config: GuardConfig) -> Self {
        Self { routes, config }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether `principal` may invoke `operation`.
    ///
    /// `principal` is `None` for unauthenticated callers; they are only
    /// let through operations without a requirement.
    pub fn check(&self, operation: &str, principal: Option<&Principal>) -> GuardDecision {
        let Some(requirement) = self.routes.requirement(operation) else {
            if self.config.deny_unannotated {
                debug!(operation, "denying unannotated operation");
                return GuardDecision::Denied;
            }
            info!(operation, "operation has no permission requirement");
            return GuardDecision::Unrestricted;
        };
        if requirement.is_empty() {
            info!(operation, "operation is listed without permissions");
            return GuardDecision::Unrestricted;
        }

        let allowed = principal.is_some_and(|p| requirement.is_satisfied_by(p));
        if allowed {
            GuardDecision::Allowed
        } else {
            debug!(
                operation,
                user_id = ?principal.map(|p| p.user_id),
                require_all = requirement.require_all,
                "operation denied"
            );
            GuardDecision::Denied
        }
    }

    /// [`check`](Self::check), with denial as an error.
    pub fn authorize(&self, operation: &str, principal: Option<&Principal>) -> AuthzResult<()> {
        match self.check(operation, principal) {
            GuardDecision::Denied => Err(AuthzError::forbidden(format!(
                "missing permission for {operation}"
            ))),
            GuardDecision::Allowed | GuardDecision::Unrestricted => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    const AB_ANY: PermissionRequirement = PermissionRequirement::any_of(&["a", "b"]);
    const AB_ALL: PermissionRequirement = PermissionRequirement::all_of(&["a", "b"]);

    fn guard(config: GuardConfig) -> AuthorizationGuard {
        AuthorizationGuard::new(
            RouteTable::new(&[("things.any", AB_ANY), ("things.all", AB_ALL)]),
            config,
        )
    }

    fn principal(permissions: &[&str]) -> Principal {
        Principal::new(
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            10,
            permissions.iter().copied(),
        )
    }

    #[test]
    fn or_mode_needs_one() {
        let g = guard(GuardConfig::default());
        assert_eq!(
            g.check("things.any", Some(&principal(&["b"]))),
            GuardDecision::Allowed
        );
        assert_eq!(
            g.check("things.any", Some(&principal(&["c"]))),
            GuardDecision::Denied
        );
    }

    #[test]
    fn and_mode_needs_every() {
        let g = guard(GuardConfig::default());
        assert_eq!(
            g.check("things.all", Some(&principal(&["b"]))),
            GuardDecision::Denied
        );
        assert_eq!(
            g.check("things.all", Some(&principal(&["a", "b", "c"]))),
            GuardDecision::Allowed
        );
    }

    #[test]
    fn unannotated_operations_are_open_by_default() {
        let g = guard(GuardConfig::default());
        assert_eq!(g.check("health", None), GuardDecision::Unrestricted);
        assert!(g.authorize("health", Some(&principal(&[]))).is_ok());
    }

    #[test]
    fn unannotated_operations_can_be_closed() {
        let g = guard(GuardConfig {
            deny_unannotated: true,
        });
        assert_eq!(g.check("health", None), GuardDecision::Denied);
    }

    #[test]
    fn missing_or_empty_permissions_deny() {
        let g = guard(GuardConfig::default());
        assert_eq!(g.check("things.any", None), GuardDecision::Denied);
        assert!(matches!(
            g.authorize("things.any", Some(&principal(&[]))),
            Err(AuthzError::Forbidden { .. })
        ));
    }

    #[test]
    fn empty_requirement_is_no_requirement() {
        let g = AuthorizationGuard::new(
            RouteTable::new(&[
                ("noop.all", PermissionRequirement::all_of(&[])),
                ("noop.any", PermissionRequirement::any_of(&[])),
            ]),
            GuardConfig {
                deny_unannotated: true,
            },
        );
        for operation in ["noop.all", "noop.any"] {
            assert_eq!(g.check(operation, None), GuardDecision::Unrestricted);
            assert_eq!(
                g.check(operation, Some(&principal(&[]))),
                GuardDecision::Unrestricted
            );
        }
        assert!(PermissionRequirement::any_of(&[]).is_satisfied_by(&principal(&[])));
    }
}
