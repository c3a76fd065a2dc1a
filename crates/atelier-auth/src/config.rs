//! Token and password settings for [`AuthService`](crate::AuthService).

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Ed25519 signing key, PKCS#8 PEM.
    pub jwt_private_key_pem: String,
    /// Ed25519 verification key, SPKI PEM.
    pub jwt_public_key_pem: String,
    /// 15 minutes unless overridden.
    pub access_token_lifetime_secs: u64,
    /// 7 days unless overridden.
    pub refresh_token_lifetime_secs: u64,
    pub jwt_issuer: String,
    /// Secret prefix mixed into every password before hashing. The user
    /// repository must hash with the same value.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_private_key_pem: String::new(),
            jwt_public_key_pem: String::new(),
            access_token_lifetime_secs: 15 * 60,
            refresh_token_lifetime_secs: 7 * 24 * 60 * 60,
            jwt_issuer: "atelier".into(),
            pepper: None,
        }
    }
}
