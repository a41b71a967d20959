//! Core domain logic for the ATM cash inventory.
//! This crate owns the denomination ledger, the greedy dispersal planner and
//! the record store contract.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::denomination::{Denomination, DenominationRecord, DenominationValidationError};
pub use model::dispersal::{plan_dispersal, DispersalEntry, DispersalOutcome, DispersalPlan};
pub use model::inventory::{calculate_total_balance, sort_descending, Inventory};
pub use repo::denomination_repo::{
    DenominationRepository, InMemoryDenominationRepository, RepoError, RepoResult,
    SqliteDenominationRepository,
};
pub use service::ledger_service::{
    BalanceReport, DepositRejection, DepositRequest, LedgerError, LedgerResult, LedgerService,
    WithdrawalReceipt,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
