//! Domain vocabulary shared by the database and HTTP layers.
//!
//! Nothing in this crate performs I/O, so it can be used from the API server,
//! the migration tooling, and tests alike.

pub mod audit;
pub mod error;
pub mod pagination;
pub mod roles;
pub mod types;
