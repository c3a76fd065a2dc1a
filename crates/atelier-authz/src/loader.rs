//! Builds the request [`Principal`] from persisted users and roles.

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::user::UserStatus;
use atelier_core::repository::{RoleRepository, UserRepository};
use atelier_core::tenant_context::TenantContext;
use tracing::debug;
use uuid::Uuid;

use crate::principal::Principal;

/// Load `user_id` and its role under `ctx` and resolve the effective
/// permission set. Only active users yield a principal.
pub async fn load_principal<U, R>(
    users: &U,
    roles: &R,
    ctx: &TenantContext,
    user_id: Uuid,
) -> AtelierResult<Principal>
where
    U: UserRepository,
    R: RoleRepository,
{
    let user = users.get_by_id(ctx, user_id).await?;

    if user.status != UserStatus::Active {
        debug!(%user_id, status = ?user.status, "refusing principal for non-active user");
        return Err(AtelierError::AuthorizationDenied {
            reason: "user is not active".into(),
        });
    }

    let role = roles.get_by_id(ctx, user.role_id).await?;
    Ok(Principal::from_user_and_role(&user, &role))
}
