//! HTTP request handling for the ATM cash inventory.
//!
//! # Responsibility
//! - Validate the shape of incoming payloads.
//! - Delegate to the core ledger and render wire responses.
//! - Resolve process configuration.

pub mod api;
pub mod config;
pub mod routes;

pub use config::{ConfigError, ServerConfig};
pub use routes::{router, AppState};
