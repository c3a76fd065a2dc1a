//! Permission requirements of every API operation.
//!
//! Operations absent from the table are public (`auth.login`,
//! `auth.refresh`, `health`) unless the guard is configured to deny
//! unannotated operations.

use atelier_authz::PermissionRequirement;
use atelier_authz::RouteTable;
use atelier_authz::catalog::*;

const fn any(permissions: &'static [&'static str]) -> PermissionRequirement {
    PermissionRequirement::any_of(permissions)
}

pub const ROUTES: &[(&str, PermissionRequirement)] = &[
    ("auth.logout", any(&[PROFILE_READ])),
    ("auth.revoke_sessions", any(&[USERS_UPDATE_ALL, USERS_UPDATE_OWN])),
    ("profile.read", any(&[PROFILE_READ])),
    ("profile.update", any(&[PROFILE_UPDATE])),
    // Tenants
    ("tenants.create", any(&[TENANTS_CREATE_ALL])),
    ("tenants.list", any(&[TENANTS_READ_ALL])),
    ("tenants.read", any(&[TENANTS_READ_ALL, TENANTS_READ_OWN])),
    ("tenants.update", any(&[TENANTS_UPDATE_ALL, TENANTS_UPDATE_OWN])),
    ("tenants.delete", any(&[TENANTS_DELETE_ALL])),
    // Users
    ("users.create", any(&[USERS_CREATE_ALL, USERS_CREATE_OWN])),
    ("users.list", any(&[USERS_READ_ALL, USERS_READ_OWN])),
    ("users.read", any(&[USERS_READ_ALL, USERS_READ_OWN])),
    ("users.update", any(&[USERS_UPDATE_ALL, USERS_UPDATE_OWN])),
    ("users.delete", any(&[USERS_DELETE_ALL, USERS_DELETE_OWN])),
    // Which roles a caller may hand out is decided per role by
    // `AppState::assign_role`.
    ("users.assign_role", any(&[ROLES_ASSIGN_ALL, ROLES_ASSIGN_OWN])),
    // Roles
    ("roles.create", any(&[ROLES_CREATE_ALL, ROLES_CREATE_OWN])),
    ("roles.list", any(&[ROLES_READ_ALL, ROLES_READ_OWN])),
    ("roles.read", any(&[ROLES_READ_ALL, ROLES_READ_OWN])),
    ("roles.update", any(&[ROLES_UPDATE_ALL, ROLES_UPDATE_OWN])),
    ("roles.delete", any(&[ROLES_DELETE_ALL, ROLES_DELETE_OWN])),
    // Customers
    ("customers.create", any(&[CUSTOMERS_CREATE_ALL, CUSTOMERS_CREATE_OWN])),
    ("customers.list", any(&[CUSTOMERS_READ_ALL, CUSTOMERS_READ_OWN])),
    ("customers.read", any(&[CUSTOMERS_READ_ALL, CUSTOMERS_READ_OWN])),
    ("customers.update", any(&[CUSTOMERS_UPDATE_ALL, CUSTOMERS_UPDATE_OWN])),
    ("customers.delete", any(&[CUSTOMERS_DELETE_ALL, CUSTOMERS_DELETE_OWN])),
    // Appointments
    (
        "appointments.create",
        any(&[APPOINTMENTS_CREATE_ALL, APPOINTMENTS_CREATE_OWN]),
    ),
    (
        "appointments.list",
        any(&[APPOINTMENTS_READ_ALL, APPOINTMENTS_READ_OWN]),
    ),
    (
        "appointments.update",
        any(&[APPOINTMENTS_UPDATE_ALL, APPOINTMENTS_UPDATE_OWN]),
    ),
    (
        "appointments.delete",
        any(&[APPOINTMENTS_DELETE_ALL, APPOINTMENTS_DELETE_OWN]),
    ),
    // Services, invoices, reports, settings
    ("services.list", any(&[SERVICES_READ_ALL, SERVICES_READ_OWN])),
    ("services.update", any(&[SERVICES_UPDATE_ALL, SERVICES_UPDATE_OWN])),
    ("invoices.list", any(&[INVOICES_READ_ALL, INVOICES_READ_OWN])),
    ("invoices.create", any(&[INVOICES_CREATE_ALL, INVOICES_CREATE_OWN])),
    ("reports.read", any(&[REPORTS_READ_ALL, REPORTS_READ_OWN])),
    ("reports.export", any(&[REPORTS_EXPORT_ALL, REPORTS_EXPORT_OWN])),
    ("settings.read", any(&[SETTINGS_READ_ALL, SETTINGS_READ_OWN])),
    ("settings.update", any(&[SETTINGS_UPDATE_ALL, SETTINGS_UPDATE_OWN])),
];

pub fn route_table() -> RouteTable {
    RouteTable::new(ROUTES)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use atelier_authz::builtin::{
        MANAGER, PLATFORM_ADMIN, RECEPTIONIST, SALON_OWNER, STYLIST, builtin_roles,
    };
    use atelier_authz::{AuthorizationGuard, GuardConfig, Principal};
    use uuid::Uuid;

    use super::*;

    fn principal_for(role_name: &str) -> Principal {
        let role = builtin_roles()
            .into_iter()
            .find(|r| r.name == role_name)
            .unwrap();
        Principal::new(
            Uuid::new_v4(),
            Some(Uuid::new_v4()),
            Uuid::new_v4(),
            role.level,
            role.permissions,
        )
    }

    #[test]
    fn every_required_token_is_in_the_catalog() {
        for (operation, requirement) in ROUTES {
            assert!(!requirement.permissions.is_empty(), "{operation} requires nothing");
            for token in requirement.permissions {
                assert!(contains(token), "{operation} requires unknown {token}");
            }
        }
    }

    #[test]
    fn operation_ids_are_unique() {
        let ids: HashSet<_> = ROUTES.iter().map(|(op, _)| op).collect();
        assert_eq!(ids.len(), ROUTES.len());
        assert_eq!(route_table().len(), ROUTES.len());
    }

    #[test]
    fn builtin_roles_get_the_expected_access() {
        let guard = AuthorizationGuard::new(route_table(), GuardConfig::default());

        let stylist = principal_for(STYLIST);
        assert!(guard.authorize("appointments.list", Some(&stylist)).is_ok());
        assert!(guard.authorize("customers.delete", Some(&stylist)).is_err());

        let receptionist = principal_for(RECEPTIONIST);
        assert!(guard.authorize("customers.create", Some(&receptionist)).is_ok());
        assert!(guard.authorize("roles.delete", Some(&receptionist)).is_err());

        let admin = principal_for(PLATFORM_ADMIN);
        assert!(guard.authorize("tenants.create", Some(&admin)).is_ok());
    }

    #[test]
    fn platform_admin_passes_every_operation() {
        let guard = AuthorizationGuard::new(route_table(), GuardConfig::default());
        let admin = principal_for(PLATFORM_ADMIN);

        let denied: Vec<_> = ROUTES
            .iter()
            .map(|(operation, _)| *operation)
            .filter(|operation| guard.authorize(operation, Some(&admin)).is_err())
            .collect();
        assert!(denied.is_empty(), "admin denied: {denied:?}");
    }

    #[test]
    fn salon_staff_export_and_assign_with_own_tokens() {
        let guard = AuthorizationGuard::new(route_table(), GuardConfig::default());

        let owner = principal_for(SALON_OWNER);
        assert!(guard.authorize("reports.export", Some(&owner)).is_ok());
        assert!(guard.authorize("users.assign_role", Some(&owner)).is_ok());

        let manager = principal_for(MANAGER);
        assert!(guard.authorize("users.assign_role", Some(&manager)).is_ok());
        assert!(guard.authorize("reports.export", Some(&manager)).is_err());

        let stylist = principal_for(STYLIST);
        assert!(guard.authorize("users.assign_role", Some(&stylist)).is_err());
    }

    #[test]
    fn login_is_public_unless_the_guard_is_strict() {
        let open = AuthorizationGuard::new(route_table(), GuardConfig::default());
        assert!(open.authorize("auth.login", None).is_ok());
        assert!(open.authorize("customers.list", None).is_err());

        let strict = AuthorizationGuard::new(
            route_table(),
            GuardConfig {
                deny_unannotated: true,
            },
        );
        assert!(strict.authorize("auth.login", None).is_err());
    }
}
