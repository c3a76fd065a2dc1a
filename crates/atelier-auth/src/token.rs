//! JWT access token issuance/verification and opaque refresh token
//! generation.

use atelier_core::models::user::User;
use atelier_core::tenant_context::TenantContext;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// JWT claims embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: user ID.
    pub sub: String,
    /// Owning tenant; absent for platform users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub role_id: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

/// Issue a signed EdDSA (Ed25519) JWT access token for `user`.
pub fn issue_access_token(user: &User, config: &AuthConfig) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let lifetime = i64::try_from(config.access_token_lifetime_secs)
        .map_err(|_| AuthError::Crypto("access token lifetime out of range".into()))?;
    let claims = AccessTokenClaims {
        sub: user.id.to_string(),
        tenant_id: user.tenant_id.map(|t| t.to_string()),
        role_id: user.role_id.to_string(),
        iss: config.jwt_issuer.clone(),
        iat: now,
        exp: now + lifetime,
        jti: Uuid::new_v4().to_string(),
    };

    let key = EncodingKey::from_ed_pem(config.jwt_private_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad private key: {e}")))?;

    jsonwebtoken::encode(&Header::new(Algorithm::EdDSA), &claims, &key)
        .map_err(|e| AuthError::Crypto(format!("JWT encode: {e}")))
}

/// Decode and verify an EdDSA JWT access token.
pub fn decode_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<AccessTokenClaims, AuthError> {
    let key = DecodingKey::from_ed_pem(config.jwt_public_key_pem.as_bytes())
        .map_err(|e| AuthError::Crypto(format!("bad public key: {e}")))?;

    let mut validation = Validation::new(Algorithm::EdDSA);
    validation.set_issuer(&[&config.jwt_issuer]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss"]);

    jsonwebtoken::decode::<AccessTokenClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}

/// Claims that passed signature, expiry and issuer checks, with their
/// identifiers parsed.
#[derive(Debug, Clone)]
pub struct ValidatedClaims {
    pub user_id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role_id: Uuid,
    pub jti: String,
}

impl ValidatedClaims {
    /// The tenant context requests carrying this token run under.
    pub fn tenant_context(&self) -> TenantContext {
        TenantContext::for_tenant(self.tenant_id)
    }
}

fn claim_uuid(raw: &str, claim: &str) -> Result<Uuid, AuthError> {
    Uuid::parse_str(raw).map_err(|_| AuthError::TokenInvalid(format!("{claim} is not a UUID")))
}

/// Validate an access token and parse its identifiers. Stateless: no
/// database lookup is performed.
pub fn validate_access_token(
    token: &str,
    config: &AuthConfig,
) -> Result<ValidatedClaims, AuthError> {
    let claims = decode_access_token(token, config)?;
    Ok(ValidatedClaims {
        user_id: claim_uuid(&claims.sub, "sub")?,
        tenant_id: claims
            .tenant_id
            .as_deref()
            .map(|t| claim_uuid(t, "tenant_id"))
            .transpose()?,
        role_id: claim_uuid(&claims.role_id, "role_id")?,
        jti: claims.jti,
    })
}

/// Generate a random opaque refresh token (32 bytes, base64url, no
/// padding).
pub fn generate_refresh_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 of a raw refresh token, hex-encoded. This is what
/// `session.token_hash` stores.
pub fn hash_refresh_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}
