//! Prize inventory and promotion counters

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Remaining units of one prize within one range
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeInventoryRecord {
    /// Prize identity
    pub name: String,
    /// First spin number of the owning range
    pub range_start: u32,
    /// Last spin number of the owning range
    pub range_end: u32,
    /// Units seeded at promotion initialization
    pub total_count: u32,
    /// Units still unissued, `0 ≤ remaining ≤ total_count`, non-increasing
    pub remaining: u32,
}

impl PrizeInventoryRecord {
    /// Is at least one unit left?
    pub fn in_stock(&self) -> bool {
        self.remaining > 0
    }

    /// Units already issued
    pub fn consumed(&self) -> u32 {
        self.total_count - self.remaining
    }
}

/// Singleton promotion counters, owned by the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionCounters {
    /// Total redemptions processed, increases by exactly 1 per success
    pub total_spins: u32,
    /// Grand-prize contestants selected so far, globally
    pub grand_prize_contestants: u32,
    /// Contestants per range, keyed by range start
    pub range_contestants: BTreeMap<u32, u32>,
}

impl PromotionCounters {
    /// Contestants selected in one range
    pub fn contestants_in(&self, range_start: u32) -> u32 {
        self.range_contestants.get(&range_start).copied().unwrap_or(0)
    }

    /// The global count must equal the sum of the per-range counts
    pub fn is_consistent(&self) -> bool {
        self.grand_prize_contestants == self.range_contestants.values().sum::<u32>()
    }
}

/// Counter mutation produced by one allocation decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDelta {
    /// New value for `total_spins` (the spin number just consumed)
    pub total_spins: u32,
    /// Range whose contestant count increments (the global count follows)
    pub contestant_range: Option<u32>,
}

/// Inventory mutation produced by one winning allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryDelta {
    /// Range the decremented record belongs to
    pub range_start: u32,
    /// Prize whose `remaining` decrements by 1
    pub prize: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_stock() {
        let record = PrizeInventoryRecord {
            name: "Phone".into(),
            range_start: 1,
            range_end: 100,
            total_count: 2,
            remaining: 1,
        };
        assert!(record.in_stock());
        assert_eq!(record.consumed(), 1);
    }

    #[test]
    fn test_counters_consistency() {
        let mut counters = PromotionCounters::default();
        assert!(counters.is_consistent());

        counters.range_contestants.insert(1, 3);
        counters.range_contestants.insert(101, 1);
        counters.grand_prize_contestants = 4;
        assert!(counters.is_consistent());
        assert_eq!(counters.contestants_in(1), 3);
        assert_eq!(counters.contestants_in(1001), 0);

        counters.grand_prize_contestants = 5;
        assert!(!counters.is_consistent());
    }
}
