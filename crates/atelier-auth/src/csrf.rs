//! Double-submit CSRF protection.
//!
//! A token is issued in a script-readable cookie; state-changing requests
//! must echo it back in a header. The token generator is injected at
//! construction so tests and deployments can swap it.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use tracing::debug;

use crate::cookie::cookie_value;
use crate::error::AuthError;

/// Produces fresh CSRF token values.
pub trait CsrfTokenSource: Send + Sync {
    fn generate(&self) -> String;
}

/// 32 random bytes, base64url without padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCsrfTokens;

impl CsrfTokenSource for RandomCsrfTokens {
    fn generate(&self) -> String {
        let bytes: [u8; 32] = rand::random();
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

/// A freshly issued token and the `Set-Cookie` value carrying it.
#[derive(Debug, Clone)]
pub struct IssuedCsrfToken {
    pub token: String,
    pub set_cookie: String,
}

pub struct CsrfProtection<S: CsrfTokenSource> {
    source: S,
    cookie_name: String,
    header_name: String,
}

impl<S: CsrfTokenSource> CsrfProtection<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cookie_name: "atelier_csrf".into(),
            header_name: "x-csrf-token".into(),
        }
    }

    /// Header clients echo the token in.
    pub fn header_name(&self) -> &str {
        &self.header_name
    }

    pub fn issue(&self) -> IssuedCsrfToken {
        let token = self.source.generate();
        // Not HttpOnly: the client script must read it to echo it back.
        let set_cookie = format!(
            "{}={token}; Path=/; Secure; SameSite=Strict",
            self.cookie_name
        );
        IssuedCsrfToken { token, set_cookie }
    }

    /// Check a request. Safe methods pass; anything else needs the cookie
    /// and header values to be present and equal.
    pub fn verify(
        &self,
        method: &str,
        cookie_header: Option<&str>,
        header_value: Option<&str>,
    ) -> Result<(), AuthError> {
        if is_safe_method(method) {
            return Ok(());
        }

        let cookie = cookie_header.and_then(|h| cookie_value(h, &self.cookie_name));
        match (cookie, header_value) {
            (Some(cookie), Some(header)) if constant_time_eq(cookie, header) => Ok(()),
            (cookie, header) => {
                debug!(
                    method,
                    has_cookie = cookie.is_some(),
                    has_header = header.is_some(),
                    "CSRF check failed"
                );
                Err(AuthError::CsrfMismatch)
            }
        }
    }
}

fn is_safe_method(method: &str) -> bool {
    ["GET", "HEAD", "OPTIONS"]
        .iter()
        .any(|m| m.eq_ignore_ascii_case(method))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a.bytes()
            .zip(b.bytes())
            .fold(0u8, |acc, (x, y)| acc | (x ^ y))
            == 0
}
