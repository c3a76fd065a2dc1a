//! Closed catalog of permission tokens.
//!
//! Every token a role can hold or a route can require is declared here.
//! Scoped tokens come in pairs: `:all` for platform administrators acting
//! across tenants, `:own` for members acting inside their own tenant.
//! Nothing is implied: holding `users:update:all` does not grant
//! `users:read:all`, so every needed combination is listed explicitly.

macro_rules! permission_catalog {
    ($($(#[$meta:meta])* $name:ident => $token:literal,)*) => {
        $(
            $(#[$meta])*
            pub const $name: &str = $token;
        )*

        /// Every token in the catalog, in declaration order.
        pub const ALL: &[&str] = &[$($name),*];
    };
}

permission_catalog! {
    // Tenants
    TENANTS_CREATE_ALL => "tenants:create:all",
    TENANTS_READ_ALL => "tenants:read:all",
    TENANTS_READ_OWN => "tenants:read:own",
    TENANTS_UPDATE_ALL => "tenants:update:all",
    TENANTS_UPDATE_OWN => "tenants:update:own",
    TENANTS_DELETE_ALL => "tenants:delete:all",

    // Users (staff accounts)
    USERS_CREATE_ALL => "users:create:all",
    USERS_CREATE_OWN => "users:create:own",
    USERS_READ_ALL => "users:read:all",
    USERS_READ_OWN => "users:read:own",
    USERS_UPDATE_ALL => "users:update:all",
    USERS_UPDATE_OWN => "users:update:own",
    USERS_DELETE_ALL => "users:delete:all",
    USERS_DELETE_OWN => "users:delete:own",

    // Roles
    ROLES_CREATE_ALL => "roles:create:all",
    ROLES_CREATE_OWN => "roles:create:own",
    ROLES_READ_ALL => "roles:read:all",
    ROLES_READ_OWN => "roles:read:own",
    ROLES_UPDATE_ALL => "roles:update:all",
    ROLES_UPDATE_OWN => "roles:update:own",
    ROLES_DELETE_ALL => "roles:delete:all",
    ROLES_DELETE_OWN => "roles:delete:own",
    ROLES_ASSIGN_ALL => "roles:assign:all",
    ROLES_ASSIGN_OWN => "roles:assign:own",

    // Customers (salon clients)
    CUSTOMERS_CREATE_ALL => "customers:create:all",
    CUSTOMERS_CREATE_OWN => "customers:create:own",
    CUSTOMERS_READ_ALL => "customers:read:all",
    CUSTOMERS_READ_OWN => "customers:read:own",
    CUSTOMERS_UPDATE_ALL => "customers:update:all",
    CUSTOMERS_UPDATE_OWN => "customers:update:own",
    CUSTOMERS_DELETE_ALL => "customers:delete:all",
    CUSTOMERS_DELETE_OWN => "customers:delete:own",

    // Appointments
    APPOINTMENTS_CREATE_ALL => "appointments:create:all",
    APPOINTMENTS_CREATE_OWN => "appointments:create:own",
    APPOINTMENTS_READ_ALL => "appointments:read:all",
    APPOINTMENTS_READ_OWN => "appointments:read:own",
    APPOINTMENTS_UPDATE_ALL => "appointments:update:all",
    APPOINTMENTS_UPDATE_OWN => "appointments:update:own",
    APPOINTMENTS_DELETE_ALL => "appointments:delete:all",
    APPOINTMENTS_DELETE_OWN => "appointments:delete:own",

    // Services offered by the salon
    SERVICES_CREATE_ALL => "services:create:all",
    SERVICES_CREATE_OWN => "services:create:own",
    SERVICES_READ_ALL => "services:read:all",
    SERVICES_READ_OWN => "services:read:own",
    SERVICES_UPDATE_ALL => "services:update:all",
    SERVICES_UPDATE_OWN => "services:update:own",
    SERVICES_DELETE_ALL => "services:delete:all",
    SERVICES_DELETE_OWN => "services:delete:own",

    // Invoices
    INVOICES_CREATE_ALL => "invoices:create:all",
    INVOICES_CREATE_OWN => "invoices:create:own",
    INVOICES_READ_ALL => "invoices:read:all",
    INVOICES_READ_OWN => "invoices:read:own",
    INVOICES_UPDATE_ALL => "invoices:update:all",
    INVOICES_UPDATE_OWN => "invoices:update:own",

    // Reports
    REPORTS_READ_ALL => "reports:read:all",
    REPORTS_READ_OWN => "reports:read:own",
    REPORTS_EXPORT_ALL => "reports:export:all",
    REPORTS_EXPORT_OWN => "reports:export:own",

    // Settings
    SETTINGS_READ_ALL => "settings:read:all",
    SETTINGS_READ_OWN => "settings:read:own",
    SETTINGS_UPDATE_ALL => "settings:update:all",
    SETTINGS_UPDATE_OWN => "settings:update:own",

    /// Self-service profile access. Unscoped: a profile always belongs
    /// to the caller.
    PROFILE_READ => "profile:read",
    PROFILE_UPDATE => "profile:update",
}

/// Whether `token` is declared in the catalog.
pub fn contains(token: &str) -> bool {
    ALL.contains(&token)
}

/// Every catalog token ending in `:all`.
pub fn all_scoped() -> impl Iterator<Item = &'static str> {
    ALL.iter().copied().filter(|t| t.ends_with(":all"))
}

/// Every catalog token ending in `:own`.
pub fn own_scoped() -> impl Iterator<Item = &'static str> {
    ALL.iter().copied().filter(|t| t.ends_with(":own"))
}

/// Return the tokens from `tokens` that are not in the catalog.
pub fn unknown<'a, I>(tokens: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    tokens
        .into_iter()
        .map(String::as_str)
        .filter(|t| !contains(t))
        .collect()
}

/// Return the tokens from `tokens` that carry the cross-tenant `:all`
/// scope. Only platform users may hold these.
pub fn cross_tenant<'a, I>(tokens: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    tokens
        .into_iter()
        .map(String::as_str)
        .filter(|t| t.ends_with(":all"))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::token::PermissionToken;

    #[test]
    fn every_entry_is_well_formed() {
        for token in ALL {
            assert!(
                PermissionToken::parse(token).is_ok(),
                "malformed catalog token: {token}"
            );
        }
    }

    #[test]
    fn entries_are_unique() {
        let unique: HashSet<_> = ALL.iter().collect();
        assert_eq!(unique.len(), ALL.len());
    }

    #[test]
    fn every_own_token_has_an_all_counterpart() {
        for own in own_scoped() {
            let all = own.replace(":own", ":all");
            assert!(contains(&all), "{own} has no :all counterpart");
        }
    }

    #[test]
    fn unknown_reports_only_missing_tokens() {
        let tokens = vec![
            USERS_READ_OWN.to_string(),
            "users:fly:own".to_string(),
            PROFILE_READ.to_string(),
        ];
        assert_eq!(unknown(&tokens), vec!["users:fly:own"]);
    }

    #[test]
    fn cross_tenant_picks_out_all_scoped_tokens() {
        let tokens = vec![
            TENANTS_DELETE_ALL.to_string(),
            USERS_READ_OWN.to_string(),
            PROFILE_UPDATE.to_string(),
        ];
        assert_eq!(cross_tenant(&tokens), vec!["tenants:delete:all"]);
    }
}
