//! Sorted inventory view and balance arithmetic.
//!
//! # Responsibility
//! - Turn raw store output into a descending, key-unique inventory.
//! - Compute total cash balance without side effects.
//!
//! # Invariants
//! - Records are ordered by `denomination` from highest to lowest.
//! - No two records share a denomination; the first occurrence wins.

use crate::model::denomination::{Denomination, DenominationRecord};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Denomination-keyed inventory, highest face value first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    records: Vec<DenominationRecord>,
}

impl Inventory {
    /// Returns records in descending denomination order.
    pub fn records(&self) -> &[DenominationRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &DenominationRecord> {
        self.records.iter()
    }

    pub fn get(&self, denomination: Denomination) -> Option<&DenominationRecord> {
        self.records
            .iter()
            .find(|record| record.denomination == denomination)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total cash held across all denominations.
    pub fn total_balance(&self) -> u64 {
        calculate_total_balance(&self.records)
    }

    pub fn into_records(self) -> Vec<DenominationRecord> {
        self.records
    }
}

impl FromIterator<DenominationRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = DenominationRecord>>(iter: I) -> Self {
        sort_descending(iter)
    }
}

/// Serialized as `{"<denomination>": {denomination, quantity}, ...}` in
/// descending key order.
impl Serialize for Inventory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for record in &self.records {
            map.serialize_entry(&record.denomination, record)?;
        }
        map.end()
    }
}

/// Sum of `denomination * quantity` over all records.
pub fn calculate_total_balance<'a>(
    records: impl IntoIterator<Item = &'a DenominationRecord>,
) -> u64 {
    records.into_iter().map(DenominationRecord::value).sum()
}

/// Orders records by denomination, highest first, collapsing duplicate keys.
///
/// Duplicate denominations keep the first record seen in input order.
pub fn sort_descending(records: impl IntoIterator<Item = DenominationRecord>) -> Inventory {
    let mut records: Vec<DenominationRecord> = records.into_iter().collect();
    // Stable sort keeps input order among equal keys so dedup retains the first.
    records.sort_by(|a, b| b.denomination.cmp(&a.denomination));
    records.dedup_by_key(|record| record.denomination);
    Inventory { records }
}
