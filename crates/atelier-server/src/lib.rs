//! Atelier Server — configuration, startup seeding, the operation route
//! table and the request pipeline a transport layer drives.

pub mod bootstrap;
pub mod config;
pub mod routes;
pub mod state;
