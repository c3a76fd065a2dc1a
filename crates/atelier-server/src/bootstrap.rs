//! Startup seeding of the built-in system roles.

use std::collections::HashSet;

use atelier_authz::builtin::builtin_roles;
use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::role::UpdateRole;
use atelier_core::repository::RoleRepository;
use atelier_core::tenant_context::TenantContext;
use tracing::info;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

/// Make sure every built-in role exists with its current permission set.
/// Safe to run on every start.
pub async fn seed_builtin_roles<R: RoleRepository>(roles: &R) -> AtelierResult<SeedReport> {
    let ctx = TenantContext::System;
    let mut report = SeedReport::default();

    for role in builtin_roles() {
        match roles.get_by_name(&ctx, &role.name).await {
            Ok(existing) => {
                let have: HashSet<&String> = existing.permissions.iter().collect();
                let want: HashSet<&String> = role.permissions.iter().collect();
                if have == want {
                    report.unchanged += 1;
                    continue;
                }
                roles
                    .update(
                        &ctx,
                        existing.id,
                        UpdateRole {
                            permissions: Some(role.permissions),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!(role = %existing.name, "built-in role permissions refreshed");
                report.updated += 1;
            }
            Err(AtelierError::NotFound { .. }) => {
                let created = roles.create(&ctx, role).await?;
                info!(role = %created.name, role_id = %created.id, "built-in role created");
                report.created += 1;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(report)
}
