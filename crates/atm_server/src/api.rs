//! Use-case API behind the HTTP routes.
//!
//! # Responsibility
//! - Map request payloads onto ledger operations over one SQLite connection.
//! - Turn ledger errors into wire-level failure bodies with a status code.
//!
//! # Invariants
//! - Functions never panic; every failure becomes an `ErrorBody`.
//! - Withdrawal refusals carry the unchanged inventory as `balance`.
//! - Nothing here depends on the HTTP framework.

use atm_core::{
    BalanceReport, DenominationRecord, DepositRequest, Inventory, LedgerError, LedgerResult,
    LedgerService, SqliteDenominationRepository, WithdrawalReceipt,
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

pub const STATUS_UNPROCESSABLE: u16 = 422;
pub const STATUS_CONFLICT: u16 = 409;
pub const STATUS_INTERNAL: u16 = 500;

/// Withdrawal request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WithdrawRequest {
    #[serde(rename = "intCashRequest")]
    pub int_cash_request: i64,
}

/// Failure envelope: `{error}` or `{error, balance}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<Inventory>,
    /// HTTP status for this failure. Not part of the body.
    #[serde(skip)]
    pub status: u16,
}

impl ErrorBody {
    /// Failure raised before the ledger runs, e.g. an unreadable payload.
    pub fn rejected(message: impl Into<String>, status: u16) -> Self {
        Self {
            error: message.into(),
            balance: None,
            status,
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::rejected(message, STATUS_INTERNAL)
    }
}

impl From<LedgerError> for ErrorBody {
    fn from(err: LedgerError) -> Self {
        let status = match &err {
            LedgerError::InvalidDeposit(_)
            | LedgerError::InvalidWithdrawal { .. }
            | LedgerError::UnfulfillableDenomination { .. }
            | LedgerError::InvalidDenomination(_) => STATUS_UNPROCESSABLE,
            LedgerError::DuplicateDenomination(_) => STATUS_CONFLICT,
            LedgerError::Store(_) => STATUS_INTERNAL,
        };
        Self {
            error: err.to_string(),
            balance: err.balance().cloned(),
            status,
        }
    }
}

pub type ApiResult<T> = Result<T, ErrorBody>;

/// Applies a deposit and returns the full inventory.
pub fn deposit(conn: &Connection, request: &DepositRequest) -> ApiResult<BalanceReport> {
    with_ledger(conn, |ledger| ledger.deposit(request))
}

/// Dispenses cash; refusals report the current inventory.
pub fn withdraw(conn: &Connection, request: WithdrawRequest) -> ApiResult<WithdrawalReceipt> {
    with_ledger(conn, |ledger| ledger.withdraw(request.int_cash_request))
}

/// Registers a new denomination.
pub fn add_denomination(
    conn: &Connection,
    record: DenominationRecord,
) -> ApiResult<DenominationRecord> {
    with_ledger(conn, |ledger| ledger.add_denomination(record))
}

/// Reads the current inventory.
pub fn balance(conn: &Connection) -> ApiResult<BalanceReport> {
    with_ledger(conn, |ledger| ledger.balance())
}

fn with_ledger<T>(
    conn: &Connection,
    f: impl FnOnce(&LedgerService<SqliteDenominationRepository<'_>>) -> LedgerResult<T>,
) -> ApiResult<T> {
    let repo = SqliteDenominationRepository::try_new(conn)
        .map_err(|err| ErrorBody::internal(format!("store init failed: {err}")))?;
    let ledger = LedgerService::new(repo);
    f(&ledger).map_err(ErrorBody::from)
}
