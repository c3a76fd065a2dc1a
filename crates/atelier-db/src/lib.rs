//! Atelier Database — SurrealDB connection management, schema
//! migrations, the tenant row filter and repository implementations.

mod connection;
mod error;
pub mod repository;
mod schema;
pub mod tenant_scope;

pub use connection::{DbConfig, DbManager};
pub use error::DbError;
pub use repository::{
    SurrealCustomerRepository, SurrealRoleRepository, SurrealSessionRepository,
    SurrealTenantRepository, SurrealUserRepository, hash_password,
};
pub use schema::{current_version, run_migrations, schema_v1};
pub use tenant_scope::TenantScope;
