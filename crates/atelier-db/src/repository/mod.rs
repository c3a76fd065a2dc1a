//! SurrealDB repository implementations.

mod customer;
mod role;
mod session;
mod tenant;
mod user;

use surrealdb_types::SurrealValue;

pub use customer::SurrealCustomerRepository;
pub use role::SurrealRoleRepository;
pub use session::SurrealSessionRepository;
pub use tenant::SurrealTenantRepository;
pub use user::{SurrealUserRepository, hash_password};

/// Row struct for `SELECT count() AS total ... GROUP ALL` queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}
