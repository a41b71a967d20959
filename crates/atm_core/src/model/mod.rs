//! Domain model for the cash inventory.
//!
//! # Responsibility
//! - Define the persisted denomination record.
//! - Provide the sorted inventory view, balance arithmetic and the greedy
//!   dispersal planner used by the ledger.
//!
//! # Invariants
//! - Every record is identified by its denomination value.
//! - Records are never deleted; only quantities change.

pub mod denomination;
pub mod dispersal;
pub mod inventory;
