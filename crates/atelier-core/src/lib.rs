//! Atelier Core — domain models, error types, tenant context and
//! repository traits shared by every other crate.

pub mod error;
pub mod models;
pub mod repository;
pub mod tenant_context;

pub use error::{AtelierError, AtelierResult};
pub use tenant_context::{TenantContext, TenantOwned};
