//! CRM API server library.
//!
//! Exposes configuration, state, error handling, middleware, and routes so
//! the binaries and the integration tests build the exact same application.

pub mod audit;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod telemetry;
