//! Domain models for Atelier.
//!
//! These are the core types shared across all crates.

pub mod customer;
pub mod role;
pub mod session;
pub mod tenant;
pub mod user;
