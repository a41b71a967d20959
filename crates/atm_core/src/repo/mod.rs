//! Record store layer for denomination persistence.
//!
//! # Responsibility
//! - Define the storage contract consumed by the ledger.
//! - Isolate SQLite details from ledger orchestration.
//!
//! # Invariants
//! - Store writes enforce `DenominationRecord::validate()` before persistence.
//! - Duplicate keys surface as `RepoError::DuplicateKey`, not transport errors.

pub mod denomination_repo;
