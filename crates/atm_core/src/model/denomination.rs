//! Denomination record model.
//!
//! # Responsibility
//! - Define the only persisted entity: one banknote face value and its count.
//! - Validate records before they reach persistence.
//!
//! # Invariants
//! - `denomination` is strictly positive and acts as the primary key.
//! - `denomination` never changes after creation; only `quantity` mutates.
//! - `quantity` is non-negative by construction (`u32`).

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Banknote face value. Unique key of the inventory.
pub type Denomination = u32;

/// Persisted pair of banknote face value and number of notes held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DenominationRecord {
    pub denomination: Denomination,
    pub quantity: u32,
}

/// Validation failure for a denomination record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenominationValidationError {
    /// Zero is not a banknote; it would also make greedy division undefined.
    ZeroDenomination,
}

impl Display for DenominationValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDenomination => write!(f, "denomination must be greater than zero"),
        }
    }
}

impl Error for DenominationValidationError {}

impl DenominationRecord {
    pub fn new(denomination: Denomination, quantity: u32) -> Self {
        Self {
            denomination,
            quantity,
        }
    }

    /// Checks record-level invariants.
    ///
    /// # Errors
    /// - `ZeroDenomination` when `denomination == 0`.
    pub fn validate(&self) -> Result<(), DenominationValidationError> {
        if self.denomination == 0 {
            return Err(DenominationValidationError::ZeroDenomination);
        }
        Ok(())
    }

    /// Cash value held in this record: `denomination * quantity`.
    pub fn value(&self) -> u64 {
        u64::from(self.denomination) * u64::from(self.quantity)
    }
}
