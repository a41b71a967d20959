//! Greedy withdrawal dispersal planning.
//!
//! # Responsibility
//! - Split a requested cash amount into note counts per denomination.
//! - Report the inventory that would remain if the plan were committed.
//!
//! # Invariants
//! - Denominations are visited from highest to lowest, once each.
//! - A denomination never dispenses more notes than it holds.
//! - Plan entries exist only for counts greater than zero.
//! - Planning is pure; committing the result is the caller's decision.
//!
//! Greedy allocation is optimal for canonical note systems only. For
//! arbitrary sets it can leave a remainder even when some other combination
//! would have matched the amount exactly.

use crate::model::denomination::{Denomination, DenominationRecord};
use crate::model::inventory::Inventory;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Number of notes of one denomination handed out for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DispersalEntry {
    pub denomination: Denomination,
    pub count: u32,
}

/// Ordered note allocation for a single withdrawal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispersalPlan {
    entries: Vec<DispersalEntry>,
}

impl DispersalPlan {
    pub fn entries(&self) -> &[DispersalEntry] {
        &self.entries
    }

    pub fn count_for(&self, denomination: Denomination) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.denomination == denomination)
            .map(|entry| entry.count)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cash value covered by the plan.
    pub fn amount(&self) -> u64 {
        self.entries
            .iter()
            .map(|entry| u64::from(entry.denomination) * u64::from(entry.count))
            .sum()
    }
}

impl Serialize for DispersalPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.denomination, entry)?;
        }
        map.end()
    }
}

/// Result of running the planner against an inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispersalOutcome {
    pub plan: DispersalPlan,
    /// Inventory after removing the planned notes.
    pub remaining_inventory: Inventory,
    /// Part of the request that could not be covered. Zero means complete.
    pub unfilled: u64,
}

impl DispersalOutcome {
    pub fn is_complete(&self) -> bool {
        self.unfilled == 0
    }
}

/// Plans a withdrawal of `amount` by taking as many notes as possible from
/// each denomination, largest first.
///
/// A shortfall at one denomination carries forward to smaller ones only.
pub fn plan_dispersal(inventory: &Inventory, amount: u64) -> DispersalOutcome {
    let mut remaining = amount;
    let mut entries = Vec::new();
    let mut updated = Vec::with_capacity(inventory.len());

    for record in inventory.iter() {
        if remaining == 0 || record.denomination == 0 {
            updated.push(*record);
            continue;
        }

        let face_value = u64::from(record.denomination);
        let wanted = remaining / face_value;
        let count = wanted.min(u64::from(record.quantity));
        if count == 0 {
            updated.push(*record);
            continue;
        }

        remaining -= count * face_value;
        // count <= quantity, so both conversions stay in u32 range.
        let count = count as u32;
        entries.push(DispersalEntry {
            denomination: record.denomination,
            count,
        });
        updated.push(DenominationRecord::new(
            record.denomination,
            record.quantity - count,
        ));
    }

    DispersalOutcome {
        plan: DispersalPlan { entries },
        remaining_inventory: updated.into_iter().collect(),
        unfilled: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::plan_dispersal;
    use crate::model::denomination::DenominationRecord;
    use crate::model::inventory::{sort_descending, Inventory};

    fn inventory(pairs: &[(u32, u32)]) -> Inventory {
        sort_descending(
            pairs
                .iter()
                .map(|&(denomination, quantity)| DenominationRecord::new(denomination, quantity)),
        )
    }

    #[test]
    fn takes_largest_notes_first() {
        let outcome = plan_dispersal(&inventory(&[(100, 5), (50, 10), (20, 0)]), 150);

        assert!(outcome.is_complete());
        assert_eq!(outcome.plan.count_for(100), Some(1));
        assert_eq!(outcome.plan.count_for(50), Some(1));
        assert_eq!(outcome.plan.count_for(20), None);
        assert_eq!(outcome.plan.amount(), 150);
        assert_eq!(outcome.remaining_inventory.total_balance(), 850);
    }

    #[test]
    fn clamps_to_available_stock_and_carries_shortfall_down() {
        let outcome = plan_dispersal(&inventory(&[(100, 1), (20, 10)]), 260);

        assert!(outcome.is_complete());
        assert_eq!(outcome.plan.count_for(100), Some(1));
        assert_eq!(outcome.plan.count_for(20), Some(8));
        assert_eq!(outcome.remaining_inventory.get(100).map(|r| r.quantity), Some(0));
        assert_eq!(outcome.remaining_inventory.get(20).map(|r| r.quantity), Some(2));
    }

    #[test]
    fn reports_unfilled_remainder_for_non_canonical_amounts() {
        let outcome = plan_dispersal(&inventory(&[(100, 0), (30, 4)]), 100);

        assert!(!outcome.is_complete());
        assert_eq!(outcome.unfilled, 10);
        assert_eq!(outcome.plan.count_for(30), Some(3));
    }

    #[test]
    fn plan_entries_follow_descending_order() {
        let outcome = plan_dispersal(&inventory(&[(5, 10), (50, 1), (10, 3)]), 85);

        let order: Vec<u32> = outcome
            .plan
            .entries()
            .iter()
            .map(|entry| entry.denomination)
            .collect();
        assert_eq!(order, vec![50, 10, 5]);
        assert_eq!(outcome.plan.amount(), 85);
    }

    #[test]
    fn plan_serializes_as_denomination_map() {
        let outcome = plan_dispersal(&inventory(&[(100, 2), (50, 2)]), 150);
        let json = serde_json::to_string(&outcome.plan).unwrap();
        assert_eq!(
            json,
            r#"{"100":{"denomination":100,"count":1},"50":{"denomination":50,"count":1}}"#
        );
    }
}
