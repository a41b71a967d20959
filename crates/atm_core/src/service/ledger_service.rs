//! Inventory ledger use-case service.
//!
//! # Responsibility
//! - Validate deposit and withdrawal requests.
//! - Run the greedy dispersal planner and commit complete plans.
//! - Register new denominations through the record store.
//!
//! # Invariants
//! - Validation always runs before any store write.
//! - A withdrawal is persisted only when the plan covers the full amount.
//! - Deposits never create records; unknown denominations are ignored.
//! - Service layer remains storage-agnostic.
//!
//! # Concurrency
//! Each mutating call is one unguarded load-all -> compute -> save-all round
//! trip. Two callers sharing a store can read the same quantities and commit
//! plans that together over-draw it. Callers that share a store across
//! threads must serialize mutating calls themselves (see `atm_server`).

use crate::model::denomination::{Denomination, DenominationRecord, DenominationValidationError};
use crate::model::dispersal::{plan_dispersal, DispersalPlan};
use crate::model::inventory::{sort_descending, Inventory};
use crate::repo::denomination_repo::{DenominationRepository, RepoError};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Deposit input: increment per denomination.
///
/// Keys are raw request integers. Keys that name no stored denomination,
/// negative ones included, are ignored by `LedgerService::deposit`.
pub type DepositRequest = BTreeMap<i64, i64>;

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Why a deposit request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DepositRejection {
    /// No increment is strictly positive (includes an empty request).
    NothingToDeposit,
    /// At least one increment is negative.
    NegativeAmount { denomination: i64, amount: i64 },
    /// Applying the increment would exceed the quantity range.
    QuantityOverflow { denomination: Denomination },
}

impl Display for DepositRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NothingToDeposit => write!(f, "Deposit amount cannot be zero"),
            Self::NegativeAmount { .. } => write!(f, "Incorrect deposit amount"),
            Self::QuantityOverflow { denomination } => write!(
                f,
                "Incorrect deposit amount: quantity overflow for denomination {denomination}"
            ),
        }
    }
}

/// Ledger use-case error.
#[derive(Debug)]
pub enum LedgerError {
    InvalidDeposit(DepositRejection),
    /// Requested amount is non-positive or exceeds the total balance.
    InvalidWithdrawal {
        requested: i64,
        total_balance: u64,
        balance: Inventory,
    },
    /// Total balance suffices but the notes on hand cannot form the amount.
    UnfulfillableDenomination {
        requested: u64,
        unfilled: u64,
        balance: Inventory,
    },
    DuplicateDenomination(Denomination),
    InvalidDenomination(DenominationValidationError),
    Store(RepoError),
}

impl LedgerError {
    /// Unchanged inventory reported alongside a refused withdrawal.
    pub fn balance(&self) -> Option<&Inventory> {
        match self {
            Self::InvalidWithdrawal { balance, .. }
            | Self::UnfulfillableDenomination { balance, .. } => Some(balance),
            _ => None,
        }
    }

    /// Stable machine-readable error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidDeposit(_) => "invalid_deposit",
            Self::InvalidWithdrawal { .. } => "invalid_withdrawal",
            Self::UnfulfillableDenomination { .. } => "unfulfillable_denomination",
            Self::DuplicateDenomination(_) => "duplicate_denomination",
            Self::InvalidDenomination(_) => "invalid_denomination",
            Self::Store(_) => "store_error",
        }
    }
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDeposit(rejection) => write!(f, "{rejection}"),
            Self::InvalidWithdrawal { .. } => write!(f, "Incorrect or insufficient funds"),
            Self::UnfulfillableDenomination { .. } => write!(
                f,
                "Unable to dispense. Change the request amount as per the available denominations."
            ),
            Self::DuplicateDenomination(denomination) => {
                write!(f, "Denomination {denomination} already exists")
            }
            Self::InvalidDenomination(err) => write!(f, "{err}"),
            Self::Store(err) => write!(f, "store error: {err}"),
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDenomination(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for LedgerError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DuplicateKey(denomination) => Self::DuplicateDenomination(denomination),
            RepoError::Validation(err) => Self::InvalidDenomination(err),
            other => Self::Store(other),
        }
    }
}

/// Inventory after a deposit, or a plain balance read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub balance_denom: Inventory,
    pub total_balance: u64,
}

impl From<Inventory> for BalanceReport {
    fn from(inventory: Inventory) -> Self {
        Self {
            total_balance: inventory.total_balance(),
            balance_denom: inventory,
        }
    }
}

/// Committed withdrawal: notes handed out and what is left.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalReceipt {
    pub dispense: DispersalPlan,
    pub balance_denom: Inventory,
    pub total_balance: u64,
}

/// Ledger facade over a denomination record store.
pub struct LedgerService<R: DenominationRepository> {
    repo: R,
}

impl<R: DenominationRepository> LedgerService<R> {
    /// Creates a ledger using the provided store implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Loads the current inventory, highest denomination first.
    pub fn inventory(&self) -> LedgerResult<Inventory> {
        Ok(sort_descending(self.repo.load_all()?))
    }

    /// Reads the current inventory and its total balance.
    pub fn balance(&self) -> LedgerResult<BalanceReport> {
        Ok(self.inventory()?.into())
    }

    /// Adds notes to existing denominations.
    ///
    /// # Contract
    /// - Rejects requests with no positive increment or any negative one.
    /// - Ignores denominations that have no stored record.
    /// - Returns the full updated inventory and total balance.
    pub fn deposit(&self, amounts: &DepositRequest) -> LedgerResult<BalanceReport> {
        if let Err(rejection) = validate_deposit(amounts) {
            warn!(
                "event=deposit module=ledger status=rejected reason={:?}",
                rejection
            );
            return Err(LedgerError::InvalidDeposit(rejection));
        }

        let inventory = self.inventory()?;
        let mut changed = Vec::new();
        let mut updated = Vec::with_capacity(inventory.len());

        for record in inventory.iter() {
            let Some(&increment) = amounts.get(&i64::from(record.denomination)) else {
                updated.push(*record);
                continue;
            };

            let quantity = u32::try_from(increment)
                .ok()
                .and_then(|increment| record.quantity.checked_add(increment))
                .ok_or(LedgerError::InvalidDeposit(
                    DepositRejection::QuantityOverflow {
                        denomination: record.denomination,
                    },
                ))?;
            let record = DenominationRecord::new(record.denomination, quantity);
            changed.push(record);
            updated.push(record);
        }

        let ignored = amounts
            .keys()
            .filter(|&&key| {
                Denomination::try_from(key)
                    .ok()
                    .and_then(|denomination| inventory.get(denomination))
                    .is_none()
            })
            .count();

        if !changed.is_empty() {
            self.repo.save_all(&changed)?;
        }

        let report = BalanceReport::from(sort_descending(updated));
        info!(
            "event=deposit module=ledger status=ok updated={} ignored={} total_balance={}",
            changed.len(),
            ignored,
            report.total_balance
        );
        Ok(report)
    }

    /// Dispenses `requested_amount` using the largest notes available first.
    ///
    /// # Contract
    /// - Rejects amounts `<= 0` or above the total balance before planning.
    /// - Persists nothing unless the plan covers the amount exactly.
    /// - Refusals carry the unchanged inventory.
    pub fn withdraw(&self, requested_amount: i64) -> LedgerResult<WithdrawalReceipt> {
        let inventory = self.inventory()?;
        let total_balance = inventory.total_balance();

        let amount = match u64::try_from(requested_amount) {
            Ok(amount) if amount > 0 && amount <= total_balance => amount,
            _ => {
                warn!(
                    "event=withdraw module=ledger status=rejected reason=invalid_amount requested={} total_balance={}",
                    requested_amount, total_balance
                );
                return Err(LedgerError::InvalidWithdrawal {
                    requested: requested_amount,
                    total_balance,
                    balance: inventory,
                });
            }
        };

        let outcome = plan_dispersal(&inventory, amount);
        if !outcome.is_complete() {
            warn!(
                "event=withdraw module=ledger status=rejected reason=unfulfillable requested={} unfilled={}",
                amount, outcome.unfilled
            );
            return Err(LedgerError::UnfulfillableDenomination {
                requested: amount,
                unfilled: outcome.unfilled,
                balance: inventory,
            });
        }

        self.repo.save_all(outcome.remaining_inventory.records())?;

        let total_balance = outcome.remaining_inventory.total_balance();
        info!(
            "event=withdraw module=ledger status=ok requested={} notes={} total_balance={}",
            amount,
            outcome.plan.entries().len(),
            total_balance
        );
        Ok(WithdrawalReceipt {
            dispense: outcome.plan,
            balance_denom: outcome.remaining_inventory,
            total_balance,
        })
    }

    /// Registers a new denomination with its initial stock.
    ///
    /// Uniqueness is enforced by the store; an existing key yields
    /// `DuplicateDenomination`.
    pub fn add_denomination(&self, record: DenominationRecord) -> LedgerResult<DenominationRecord> {
        record.validate().map_err(LedgerError::InvalidDenomination)?;

        match self.repo.save(&record) {
            Ok(created) => {
                info!(
                    "event=add_denomination module=ledger status=ok denomination={} quantity={}",
                    created.denomination, created.quantity
                );
                Ok(created)
            }
            Err(err) => {
                warn!(
                    "event=add_denomination module=ledger status=error denomination={} error={}",
                    record.denomination, err
                );
                Err(err.into())
            }
        }
    }
}

fn validate_deposit(amounts: &DepositRequest) -> Result<(), DepositRejection> {
    if !amounts.values().any(|amount| *amount > 0) {
        return Err(DepositRejection::NothingToDeposit);
    }

    if let Some((&denomination, &amount)) = amounts.iter().find(|(_, amount)| **amount < 0) {
        return Err(DepositRejection::NegativeAmount {
            denomination,
            amount,
        });
    }

    Ok(())
}
