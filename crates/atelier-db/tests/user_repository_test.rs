//! Integration tests for the User and Session repositories using
//! in-memory SurrealDB.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use atelier_core::error::AtelierError;
use atelier_core::models::role::{CreateRole, Role, RoleType};
use atelier_core::models::session::CreateSession;
use atelier_core::models::tenant::{CreateTenant, SubscriptionPlan};
use atelier_core::models::user::{CreateUser, UpdateUser, UserStatus};
use atelier_core::repository::{
    Pagination, RoleRepository, SessionRepository, TenantRepository, UserRepository,
};
use atelier_core::tenant_context::TenantContext;
use atelier_db::repository::{
    SurrealRoleRepository, SurrealSessionRepository, SurrealTenantRepository,
    SurrealUserRepository,
};
use chrono::{Duration, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    db: Surreal<Db>,
    users: SurrealUserRepository<Db>,
    tenant_id: Uuid,
    role: Role,
}

/// In-memory DB with one tenant of `max_users` seats and a system role.
async fn setup(max_users: u32) -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    atelier_db::run_migrations(&db).await.unwrap();

    let tenant = SurrealTenantRepository::new(db.clone())
        .create(CreateTenant {
            name: "Studio Rosa".into(),
            slug: "studio-rosa".into(),
            subscription_plan: SubscriptionPlan::Free,
            max_users: Some(max_users),
        })
        .await
        .unwrap();

    let role = SurrealRoleRepository::new(db.clone())
        .create(
            &TenantContext::System,
            CreateRole {
                name: "stylist".into(),
                description: String::new(),
                role_type: RoleType::System,
                tenant_id: None,
                level: 30,
                permissions: vec!["appointments:read:own".into()],
            },
        )
        .await
        .unwrap();

    Fixture {
        users: SurrealUserRepository::new(db.clone()),
        db,
        tenant_id: tenant.id,
        role,
    }
}

fn staff(tenant_id: Uuid, role_id: Uuid, email: &str) -> CreateUser {
    CreateUser {
        tenant_id: Some(tenant_id),
        role_id,
        email: email.into(),
        first_name: "Mia".into(),
        last_name: "Lenz".into(),
        password: "correct horse battery".into(),
    }
}

#[tokio::test]
async fn create_user_hashes_password_and_defaults_to_active() {
    let f = setup(3).await;
    let ctx = TenantContext::Tenant(f.tenant_id);

    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "Mia@Rosa.example"))
        .await
        .unwrap();

    assert_eq!(user.status, UserStatus::Active);
    assert_eq!(user.email, "mia@rosa.example");
    assert_eq!(user.tenant_id, Some(f.tenant_id));
    assert!(user.granted_permissions.is_empty());
    assert_ne!(user.password_hash, "correct horse battery");

    let parsed = PasswordHash::new(&user.password_hash).unwrap();
    assert!(
        Argon2::default()
            .verify_password(b"correct horse battery", &parsed)
            .is_ok()
    );
}

#[tokio::test]
async fn pepper_is_prepended_before_hashing() {
    let f = setup(3).await;
    let users = SurrealUserRepository::with_pepper(f.db.clone(), "pepper!".into());
    let ctx = TenantContext::Tenant(f.tenant_id);

    let user = users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    let parsed = PasswordHash::new(&user.password_hash).unwrap();
    let argon2 = Argon2::default();
    assert!(argon2.verify_password(b"pepper!correct horse battery", &parsed).is_ok());
    assert!(argon2.verify_password(b"correct horse battery", &parsed).is_err());
}

#[tokio::test]
async fn get_by_email_is_case_insensitive() {
    let f = setup(3).await;
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    let found = f.users.get_by_email(&ctx, "MIA@rosa.example").await.unwrap();
    assert_eq!(found.id, user.id);
}

#[tokio::test]
async fn seat_limit_counts_active_users() {
    let f = setup(2).await;
    let ctx = TenantContext::Tenant(f.tenant_id);

    let first = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "a@rosa.example"))
        .await
        .unwrap();
    f.users
        .create(&ctx, staff(f.tenant_id, f.role.id, "b@rosa.example"))
        .await
        .unwrap();

    let err = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "c@rosa.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Conflict { .. }), "{err:?}");

    // Deactivating frees a seat.
    f.users.delete(&ctx, first.id).await.unwrap();
    f.users
        .create(&ctx, staff(f.tenant_id, f.role.id, "c@rosa.example"))
        .await
        .unwrap();

    // ...and reactivating needs one again.
    let err = f
        .users
        .update(
            &ctx,
            first.id,
            UpdateUser {
                status: Some(UserStatus::Active),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Conflict { .. }));
}

#[tokio::test]
async fn role_must_be_visible_to_the_users_tenant() {
    let f = setup(5).await;
    let roles = SurrealRoleRepository::new(f.db.clone());

    let other = SurrealTenantRepository::new(f.db.clone())
        .create(CreateTenant {
            name: "Bella".into(),
            slug: "bella".into(),
            subscription_plan: SubscriptionPlan::Basic,
            max_users: None,
        })
        .await
        .unwrap();
    let foreign_role = roles
        .create(
            &TenantContext::Tenant(other.id),
            CreateRole {
                name: "bella-only".into(),
                description: String::new(),
                role_type: RoleType::Tenant,
                tenant_id: Some(other.id),
                level: 20,
                permissions: vec![],
            },
        )
        .await
        .unwrap();

    let ctx = TenantContext::Tenant(f.tenant_id);
    let err = f
        .users
        .create(&ctx, staff(f.tenant_id, foreign_role.id, "mia@rosa.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Validation { .. }), "{err:?}");

    let err = f
        .users
        .create(&ctx, staff(f.tenant_id, Uuid::new_v4(), "mia@rosa.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Validation { .. }));
}

#[tokio::test]
async fn email_is_unique_per_tenant() {
    let f = setup(5).await;
    let ctx = TenantContext::Tenant(f.tenant_id);

    f.users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();
    let err = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::AlreadyExists { .. }), "{err:?}");
}

#[tokio::test]
async fn create_outside_context_is_denied() {
    let f = setup(5).await;

    let err = f
        .users
        .create(
            &TenantContext::Tenant(Uuid::new_v4()),
            staff(f.tenant_id, f.role.id, "mia@rosa.example"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::AuthorizationDenied { .. }));
}

#[tokio::test]
async fn update_sets_permission_overrides() {
    let f = setup(3).await;
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    let updated = f
        .users
        .update(
            &ctx,
            user.id,
            UpdateUser {
                first_name: Some("Maria".into()),
                granted_permissions: Some(vec!["reports:read:own".into()]),
                revoked_permissions: Some(vec!["appointments:read:own".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Maria");
    assert_eq!(updated.last_name, "Lenz");
    assert_eq!(updated.granted_permissions, vec!["reports:read:own".to_string()]);
    assert_eq!(updated.revoked_permissions, vec!["appointments:read:own".to_string()]);
}

/// A system role holding cross-tenant tokens, like the platform admin.
async fn platform_wide_role(db: &Surreal<Db>) -> Role {
    SurrealRoleRepository::new(db.clone())
        .create(
            &TenantContext::System,
            CreateRole {
                name: "operator".into(),
                description: String::new(),
                role_type: RoleType::System,
                tenant_id: None,
                level: 100,
                permissions: vec!["tenants:delete:all".into(), "users:read:all".into()],
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn salon_users_cannot_hold_platform_wide_roles() {
    let f = setup(5).await;
    let operator = platform_wide_role(&f.db).await;
    let ctx = TenantContext::Tenant(f.tenant_id);

    let err = f
        .users
        .create(&ctx, staff(f.tenant_id, operator.id, "mia@rosa.example"))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Validation { .. }), "{err:?}");
    assert!(err.to_string().contains("tenants:delete:all"));

    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();
    let err = f
        .users
        .update(
            &ctx,
            user.id,
            UpdateUser {
                role_id: Some(operator.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::Validation { .. }), "{err:?}");
    assert_eq!(f.users.get_by_id(&ctx, user.id).await.unwrap().role_id, f.role.id);

    // Platform staff may still carry it.
    let admin = f
        .users
        .create(
            &TenantContext::System,
            CreateUser {
                tenant_id: None,
                ..staff(f.tenant_id, operator.id, "ops@atelier.example")
            },
        )
        .await
        .unwrap();
    assert_eq!(admin.role_id, operator.id);
}

#[tokio::test]
async fn permission_overrides_are_checked_against_the_catalog() {
    let f = setup(3).await;
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    let attempts = [
        UpdateUser {
            granted_permissions: Some(vec!["pets:feed:own".into()]),
            ..Default::default()
        },
        UpdateUser {
            revoked_permissions: Some(vec!["not a token".into()]),
            ..Default::default()
        },
        UpdateUser {
            granted_permissions: Some(vec!["tenants:delete:all".into()]),
            ..Default::default()
        },
    ];
    for input in attempts {
        let err = f.users.update(&ctx, user.id, input).await.unwrap_err();
        assert!(matches!(err, AtelierError::Validation { .. }), "{err:?}");
    }

    let unchanged = f.users.get_by_id(&ctx, user.id).await.unwrap();
    assert!(unchanged.granted_permissions.is_empty());
    assert!(unchanged.revoked_permissions.is_empty());

    // Taking away a cross-tenant token is allowed.
    let updated = f
        .users
        .update(
            &ctx,
            user.id,
            UpdateUser {
                revoked_permissions: Some(vec!["users:read:all".into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.revoked_permissions, vec!["users:read:all".to_string()]);
}

#[tokio::test]
async fn delete_is_soft() {
    let f = setup(3).await;
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    f.users.delete(&ctx, user.id).await.unwrap();

    let fetched = f.users.get_by_id(&ctx, user.id).await.unwrap();
    assert_eq!(fetched.status, UserStatus::Inactive);

    let page = f.users.list(&ctx, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
}

// -----------------------------------------------------------------------
// Sessions
// -----------------------------------------------------------------------

fn session(user_id: Uuid, hash: &str, expires_in: Duration) -> CreateSession {
    CreateSession {
        user_id,
        token_hash: hash.into(),
        ip_address: Some("203.0.113.7".into()),
        user_agent: None,
        expires_at: Utc::now() + expires_in,
    }
}

#[tokio::test]
async fn sessions_are_scoped_through_their_user() {
    let f = setup(3).await;
    let sessions = SurrealSessionRepository::new(f.db.clone());
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    let created = sessions
        .create(&ctx, session(user.id, "hash-1", Duration::hours(1)))
        .await
        .unwrap();
    assert_eq!(created.user_id, user.id);

    let found = sessions.get_by_token_hash(&ctx, "hash-1").await.unwrap();
    assert_eq!(found.id, created.id);

    let other = TenantContext::Tenant(Uuid::new_v4());
    let err = sessions.get_by_token_hash(&other, "hash-1").await.unwrap_err();
    assert!(matches!(err, AtelierError::NotFound { .. }));

    let err = sessions
        .create(&other, session(user.id, "hash-2", Duration::hours(1)))
        .await
        .unwrap_err();
    assert!(matches!(err, AtelierError::AuthorizationDenied { .. }));

    // Invalidation from another tenant is a no-op.
    sessions.invalidate(&other, created.id).await.unwrap();
    assert!(sessions.get_by_token_hash(&ctx, "hash-1").await.is_ok());

    sessions.invalidate(&ctx, created.id).await.unwrap();
    assert!(sessions.get_by_token_hash(&ctx, "hash-1").await.is_err());
}

#[tokio::test]
async fn invalidate_user_sessions_and_cleanup() {
    let f = setup(3).await;
    let sessions = SurrealSessionRepository::new(f.db.clone());
    let ctx = TenantContext::Tenant(f.tenant_id);
    let user = f
        .users
        .create(&ctx, staff(f.tenant_id, f.role.id, "mia@rosa.example"))
        .await
        .unwrap();

    sessions
        .create(&ctx, session(user.id, "live", Duration::hours(1)))
        .await
        .unwrap();
    sessions
        .create(&ctx, session(user.id, "stale", -Duration::hours(1)))
        .await
        .unwrap();

    assert_eq!(sessions.cleanup_expired(&ctx).await.unwrap(), 1);
    assert!(sessions.get_by_token_hash(&ctx, "stale").await.is_err());
    assert!(sessions.get_by_token_hash(&ctx, "live").await.is_ok());

    sessions.invalidate_user_sessions(&ctx, user.id).await.unwrap();
    assert!(sessions.get_by_token_hash(&ctx, "live").await.is_err());
}
