//! Authentication service: login, refresh rotation and logout.

use atelier_core::error::{AtelierError, AtelierResult};
use atelier_core::models::session::CreateSession;
use atelier_core::models::user::{User, UserStatus};
use atelier_core::repository::{SessionRepository, TenantRepository, UserRepository};
use atelier_core::tenant_context::TenantContext;
use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::password;
use crate::token::{self, ValidatedClaims};

/// Input for the login flow.
#[derive(Debug)]
pub struct LoginInput {
    /// Salon the user signs in to; `None` for platform staff.
    pub tenant_slug: Option<String>,
    pub email: String,
    pub password: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Input for the refresh token rotation flow.
#[derive(Debug)]
pub struct RefreshInput {
    pub tenant_slug: Option<String>,
    pub raw_refresh_token: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Tokens handed to the client after login or refresh.
#[derive(Debug)]
pub struct TokenPair {
    /// Signed JWT access token.
    pub access_token: String,
    /// Raw opaque refresh token (return to client, not stored).
    pub refresh_token: String,
    /// Session ID (can be used for logout).
    pub session_id: Uuid,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    pub refresh_expires_at: DateTime<Utc>,
}

/// Authentication service.
///
/// Generic over repository implementations so that the auth layer
/// has no dependency on the database crate.
pub struct AuthService<U: UserRepository, S: SessionRepository, T: TenantRepository> {
    user_repo: U,
    session_repo: S,
    tenant_repo: T,
    config: AuthConfig,
}

impl<U, S, T> AuthService<U, S, T>
where
    U: UserRepository,
    S: SessionRepository,
    T: TenantRepository,
{
    pub fn new(user_repo: U, session_repo: S, tenant_repo: T, config: AuthConfig) -> Self {
        Self {
            user_repo,
            session_repo,
            tenant_repo,
            config,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Authenticate with email + password and issue a token pair.
    pub async fn login(&self, input: LoginInput) -> AtelierResult<TokenPair> {
        let ctx = self.resolve_context(input.tenant_slug.as_deref()).await?;

        let user = match self.user_repo.get_by_email(&ctx, &input.email).await {
            Ok(user) => user,
            Err(AtelierError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };
        // Platform users are visible to tenant contexts but may not sign
        // in through a salon.
        if user.tenant_id != ctx.tenant_id() {
            return Err(AuthError::InvalidCredentials.into());
        }

        let valid = password::verify_password(
            &input.password,
            &user.password_hash,
            self.config.pepper.as_deref(),
        )?;
        if !valid {
            info!(user_id = %user.id, "login rejected: bad password");
            return Err(AuthError::InvalidCredentials.into());
        }

        check_status(&user)?;

        let pair = self
            .open_session(&ctx, &user, input.ip_address, input.user_agent)
            .await?;
        info!(user_id = %user.id, tenant_id = ?user.tenant_id, "login succeeded");
        Ok(pair)
    }

    /// Rotate a refresh token: consume the old one, verify the user and
    /// tenant are still allowed in, and issue a new token pair.
    ///
    /// Each refresh token is single-use; the old session is invalidated
    /// before the new one is created, once the session is known to belong
    /// to the tenant the request targets.
    pub async fn refresh(&self, input: RefreshInput) -> AtelierResult<TokenPair> {
        let ctx = self.resolve_context(input.tenant_slug.as_deref()).await?;

        let token_hash = token::hash_refresh_token(&input.raw_refresh_token);
        let session = self
            .session_repo
            .get_by_token_hash(&ctx, &token_hash)
            .await
            .map_err(|e| match e {
                AtelierError::NotFound { .. } => {
                    AuthError::TokenInvalid("refresh token not found or already used".into())
                        .into()
                }
                other => other,
            })?;

        if session.is_expired_at(Utc::now()) {
            if let Err(e) = self.session_repo.invalidate(&ctx, session.id).await {
                warn!(session_id = %session.id, error = %e, "failed to drop expired session");
            }
            return Err(AuthError::TokenExpired.into());
        }

        // A token presented through the wrong tenant is refused without
        // being consumed.
        let user = self.user_repo.get_by_id(&ctx, session.user_id).await?;
        if user.tenant_id != ctx.tenant_id() {
            return Err(AuthError::TokenInvalid("session belongs to another tenant".into()).into());
        }

        self.session_repo.invalidate(&ctx, session.id).await?;
        check_status(&user)?;

        self.open_session(&ctx, &user, input.ip_address, input.user_agent)
            .await
    }

    /// Invalidate a single session (logout).
    pub async fn logout(&self, ctx: &TenantContext, session_id: Uuid) -> AtelierResult<()> {
        self.session_repo.invalidate(ctx, session_id).await
    }

    /// Revoke all sessions for a user (e.g. on password change or
    /// suspension).
    pub async fn revoke_all_sessions(&self, ctx: &TenantContext, user_id: Uuid) -> AtelierResult<()> {
        self.session_repo.invalidate_user_sessions(ctx, user_id).await?;
        info!(%user_id, "all sessions revoked");
        Ok(())
    }

    /// Validate a bearer access token.
    pub fn authenticate(&self, access_token: &str) -> AtelierResult<ValidatedClaims> {
        Ok(token::validate_access_token(access_token, &self.config)?)
    }

    /// Resolve the tenant a sign-in targets and check it accepts sign-ins.
    async fn resolve_context(&self, tenant_slug: Option<&str>) -> AtelierResult<TenantContext> {
        let Some(slug) = tenant_slug else {
            return Ok(TenantContext::System);
        };

        let tenant = match self.tenant_repo.get_by_slug(slug).await {
            Ok(tenant) => tenant,
            Err(AtelierError::NotFound { .. }) => {
                return Err(AuthError::InvalidCredentials.into());
            }
            Err(e) => return Err(e),
        };
        if !tenant.status.allows_sign_in() {
            info!(tenant_id = %tenant.id, status = ?tenant.status, "sign-in to inactive tenant refused");
            return Err(AuthError::TenantInactive.into());
        }
        Ok(TenantContext::Tenant(tenant.id))
    }

    async fn open_session(
        &self,
        ctx: &TenantContext,
        user: &User,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AtelierResult<TokenPair> {
        let raw_refresh = token::generate_refresh_token();
        let lifetime = i64::try_from(self.config.refresh_token_lifetime_secs)
            .map_err(|_| AuthError::Crypto("refresh token lifetime out of range".into()))?;
        let expires_at = Utc::now() + Duration::seconds(lifetime);

        let session = self
            .session_repo
            .create(
                ctx,
                CreateSession {
                    user_id: user.id,
                    token_hash: token::hash_refresh_token(&raw_refresh),
                    ip_address,
                    user_agent,
                    expires_at,
                },
            )
            .await?;

        let access_token = token::issue_access_token(user, &self.config)?;

        Ok(TokenPair {
            access_token,
            refresh_token: raw_refresh,
            session_id: session.id,
            expires_in: self.config.access_token_lifetime_secs,
            refresh_expires_at: expires_at,
        })
    }
}

fn check_status(user: &User) -> Result<(), AuthError> {
    match user.status {
        UserStatus::Active => Ok(()),
        UserStatus::Inactive => Err(AuthError::AccountInactive),
        UserStatus::Suspended => Err(AuthError::AccountSuspended),
    }
}
