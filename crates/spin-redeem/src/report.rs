//! Reporting snapshots for the admin surface

use rand::Rng;
use serde::Serialize;

use spin_core::{PrizeInventoryRecord, PromoResult, Ticket};
use spin_store::{Store, Txn};

use crate::coordinator::RedemptionCoordinator;

/// Point-in-time view of the whole promotion
#[derive(Debug, Clone, Serialize)]
pub struct PromotionStats {
    /// Redemptions processed so far
    pub total_spins: u32,
    /// Spins left in the promotion budget
    pub remaining_spins: u32,
    /// Grand-prize contestants selected, globally
    pub grand_prize_contestants: u32,
    /// Global contestant ceiling
    pub global_contestant_cap: u32,
    /// Per-range breakdown in range order
    pub ranges: Vec<RangeReport>,
}

/// Per-range slice of a [`PromotionStats`] snapshot
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    /// First spin number of the range
    pub start: u32,
    /// Last spin number of the range
    pub end: u32,
    /// Contestants selected in this range
    pub contestants: u32,
    /// Contestant slots allocated to this range
    pub contestant_quota: u32,
    /// Prize records for this range
    pub prizes: Vec<PrizeInventoryRecord>,
}

impl RangeReport {
    /// Named-prize units still unissued in this range
    pub fn prizes_remaining(&self) -> u32 {
        self.prizes.iter().map(|r| r.remaining).sum()
    }

    /// Named-prize units issued in this range
    pub fn prizes_consumed(&self) -> u32 {
        self.prizes.iter().map(|r| r.consumed()).sum()
    }
}

impl<S: Store, R: Rng> RedemptionCoordinator<S, R> {
    /// Snapshot the promotion counters and the full inventory
    pub fn stats(&self) -> PromoResult<PromotionStats> {
        let mut txn = self.store.begin()?;
        let counters = txn.counters()?;

        let mut ranges = Vec::with_capacity(self.config.ranges.len());
        for range in self.config.ranges.iter() {
            ranges.push(RangeReport {
                start: range.start,
                end: range.end,
                contestants: counters.contestants_in(range.start),
                contestant_quota: range.contestant_quota,
                prizes: txn.inventory(range.start)?,
            });
        }

        Ok(PromotionStats {
            total_spins: counters.total_spins,
            remaining_spins: self.config.max_spins.saturating_sub(counters.total_spins),
            grand_prize_contestants: counters.grand_prize_contestants,
            global_contestant_cap: self.config.global_contestant_cap,
            ranges,
        })
    }

    /// Redeemed tickets holding a prize or the contestant flag, in spin order
    pub fn winners(&self) -> PromoResult<Vec<Ticket>> {
        let mut txn = self.store.begin()?;
        txn.redeemed_winners()
    }
}
