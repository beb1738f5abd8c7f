//! Promotion initialization

use spin_core::{PrizeInventoryRecord, PromotionConfig, PromotionCounters};

/// Build the full prize inventory for a promotion.
///
/// Each range's `gift_quota` is divided evenly across the named prizes with
/// the remainder handed out round-robin from the front, so the per-range unit
/// total always equals the quota. Prizes left with zero units in a range get
/// no record there.
pub fn build_inventory(config: &PromotionConfig) -> Vec<PrizeInventoryRecord> {
    let prize_count = config.prizes.len() as u32;
    let mut records = Vec::new();

    for range in config.ranges.iter() {
        let base = range.gift_quota / prize_count;
        let remainder = range.gift_quota % prize_count;

        for (index, name) in config.prizes.iter().enumerate() {
            let count = base + u32::from((index as u32) < remainder);
            if count == 0 {
                continue;
            }
            records.push(PrizeInventoryRecord {
                name: name.clone(),
                range_start: range.start,
                range_end: range.end,
                total_count: count,
                remaining: count,
            });
        }
    }

    records
}

/// Zeroed counters with every per-range contestant key present
pub fn initial_counters(config: &PromotionConfig) -> PromotionCounters {
    let mut counters = PromotionCounters::default();
    for range in config.ranges.iter() {
        counters.range_contestants.insert(range.start, 0);
    }
    counters
}
