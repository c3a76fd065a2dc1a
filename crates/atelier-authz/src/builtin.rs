//! Built-in system roles seeded at startup.

use atelier_core::models::role::{CreateRole, RoleType};

use crate::catalog::*;

pub const PLATFORM_ADMIN: &str = "platform_admin";
pub const SALON_OWNER: &str = "salon_owner";
pub const MANAGER: &str = "manager";
pub const RECEPTIONIST: &str = "receptionist";
pub const STYLIST: &str = "stylist";

const SALON_OWNER_PERMISSIONS: &[&str] = &[
    TENANTS_READ_OWN,
    TENANTS_UPDATE_OWN,
    USERS_CREATE_OWN,
    USERS_READ_OWN,
    USERS_UPDATE_OWN,
    USERS_DELETE_OWN,
    ROLES_CREATE_OWN,
    ROLES_READ_OWN,
    ROLES_UPDATE_OWN,
    ROLES_DELETE_OWN,
    ROLES_ASSIGN_OWN,
    CUSTOMERS_CREATE_OWN,
    CUSTOMERS_READ_OWN,
    CUSTOMERS_UPDATE_OWN,
    CUSTOMERS_DELETE_OWN,
    APPOINTMENTS_CREATE_OWN,
    APPOINTMENTS_READ_OWN,
    APPOINTMENTS_UPDATE_OWN,
    APPOINTMENTS_DELETE_OWN,
    SERVICES_CREATE_OWN,
    SERVICES_READ_OWN,
    SERVICES_UPDATE_OWN,
    SERVICES_DELETE_OWN,
    INVOICES_CREATE_OWN,
    INVOICES_READ_OWN,
    INVOICES_UPDATE_OWN,
    REPORTS_READ_OWN,
    REPORTS_EXPORT_OWN,
    SETTINGS_READ_OWN,
    SETTINGS_UPDATE_OWN,
    PROFILE_READ,
    PROFILE_UPDATE,
];

const MANAGER_PERMISSIONS: &[&str] = &[
    TENANTS_READ_OWN,
    USERS_READ_OWN,
    USERS_UPDATE_OWN,
    ROLES_READ_OWN,
    ROLES_ASSIGN_OWN,
    CUSTOMERS_CREATE_OWN,
    CUSTOMERS_READ_OWN,
    CUSTOMERS_UPDATE_OWN,
    APPOINTMENTS_CREATE_OWN,
    APPOINTMENTS_READ_OWN,
    APPOINTMENTS_UPDATE_OWN,
    APPOINTMENTS_DELETE_OWN,
    SERVICES_CREATE_OWN,
    SERVICES_READ_OWN,
    SERVICES_UPDATE_OWN,
    INVOICES_CREATE_OWN,
    INVOICES_READ_OWN,
    INVOICES_UPDATE_OWN,
    REPORTS_READ_OWN,
    SETTINGS_READ_OWN,
    PROFILE_READ,
    PROFILE_UPDATE,
];

const RECEPTIONIST_PERMISSIONS: &[&str] = &[
    CUSTOMERS_CREATE_OWN,
    CUSTOMERS_READ_OWN,
    CUSTOMERS_UPDATE_OWN,
    APPOINTMENTS_CREATE_OWN,
    APPOINTMENTS_READ_OWN,
    APPOINTMENTS_UPDATE_OWN,
    APPOINTMENTS_DELETE_OWN,
    SERVICES_READ_OWN,
    INVOICES_CREATE_OWN,
    INVOICES_READ_OWN,
    PROFILE_READ,
    PROFILE_UPDATE,
];

const STYLIST_PERMISSIONS: &[&str] = &[
    CUSTOMERS_READ_OWN,
    APPOINTMENTS_READ_OWN,
    APPOINTMENTS_UPDATE_OWN,
    SERVICES_READ_OWN,
    PROFILE_READ,
    PROFILE_UPDATE,
];

/// The system roles every deployment starts with.
///
/// The platform administrator holds every `:all` token plus the unscoped
/// profile tokens; salon roles hold `:own` tokens only.
pub fn builtin_roles() -> Vec<CreateRole> {
    let admin_permissions = all_scoped()
        .chain([PROFILE_READ, PROFILE_UPDATE])
        .collect::<Vec<_>>();

    [
        (
            PLATFORM_ADMIN,
            "Operates the platform across all tenants",
            100,
            admin_permissions.as_slice(),
        ),
        (
            SALON_OWNER,
            "Full control of a single salon",
            80,
            SALON_OWNER_PERMISSIONS,
        ),
        (
            MANAGER,
            "Runs day-to-day salon operations",
            60,
            MANAGER_PERMISSIONS,
        ),
        (
            RECEPTIONIST,
            "Front desk: bookings, customers and checkout",
            40,
            RECEPTIONIST_PERMISSIONS,
        ),
        (
            STYLIST,
            "Works their own appointments",
            30,
            STYLIST_PERMISSIONS,
        ),
    ]
    .into_iter()
    .map(|(name, description, level, permissions)| CreateRole {
        name: name.into(),
        description: description.into(),
        role_type: RoleType::System,
        tenant_id: None,
        level,
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
    })
    .collect()
}
