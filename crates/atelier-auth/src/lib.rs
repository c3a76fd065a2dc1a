//! Atelier Auth — password authentication, JWT issuance/validation,
//! refresh rotation, refresh cookies, CSRF and rate limiting.

pub mod config;
pub mod cookie;
pub mod csrf;
pub mod error;
pub mod password;
pub mod rate_limit;
pub mod service;
pub mod token;

pub use config::AuthConfig;
pub use cookie::RefreshCookie;
pub use csrf::{CsrfProtection, CsrfTokenSource, IssuedCsrfToken, RandomCsrfTokens};
pub use error::AuthError;
pub use rate_limit::{
    CounterStore, CounterStoreError, MemoryCounterStore, RateLimitConfig, RateLimiter,
};
pub use service::{AuthService, LoginInput, RefreshInput, TokenPair};
pub use token::{AccessTokenClaims, ValidatedClaims};
