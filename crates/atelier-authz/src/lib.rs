//! Atelier Authz — the authorization decision.
//!
//! - [`catalog`]: the closed set of `resource:action:scope` tokens
//! - [`evaluator`]: permission predicates and entity data scoping
//! - [`guard`]: the route table and the per-operation gate
//! - [`builtin`]: system roles seeded at startup
//! - [`load_principal`]: resolving a user's effective permissions

pub mod builtin;
pub mod catalog;
pub mod error;
pub mod evaluator;
pub mod guard;
mod loader;
pub mod principal;
pub mod token;

pub use error::{AuthzError, AuthzResult};
pub use evaluator::{
    can_access_entity, can_assign_role, has_all_permissions, has_any_permission, has_permission,
    outranks, require_permission,
};
pub use guard::{AuthorizationGuard, GuardConfig, GuardDecision, PermissionRequirement, RouteTable};
pub use loader::load_principal;
pub use principal::Principal;
pub use token::{PermissionToken, Scope};
