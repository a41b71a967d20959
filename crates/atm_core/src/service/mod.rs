//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record store calls into ledger-level operations.
//! - Keep HTTP/CLI layers decoupled from storage details.

pub mod ledger_service;
