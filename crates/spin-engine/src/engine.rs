//! Allocation decision logic

use rand::Rng;

use spin_core::{
    CounterDelta, InventoryDelta, Outcome, PrizeInventoryRecord, PromotionConfig,
    PromotionCounters,
};

/// Result of one allocation decision
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The spin number lies beyond every configured range. The caller must
    /// treat this as "promotion ended", never as a normal no-win.
    PromotionOver,
    /// A normal spin with its outcome and the deltas to persist
    Spin(SpinDecision),
}

/// Outcome plus the mutations the transaction boundary applies
#[derive(Debug, Clone, PartialEq)]
pub struct SpinDecision {
    /// The decided outcome
    pub outcome: Outcome,
    /// Counter mutation (always advances `total_spins`)
    pub counter_delta: CounterDelta,
    /// Inventory decrement, present only for a named-prize win
    pub inventory_delta: Option<InventoryDelta>,
}

impl SpinDecision {
    fn no_win(spin_number: u32) -> Self {
        Self {
            outcome: Outcome::NoWin,
            counter_delta: CounterDelta {
                total_spins: spin_number,
                contestant_range: None,
            },
            inventory_delta: None,
        }
    }
}

/// Decide the outcome of one spin.
///
/// Pure: reads only its arguments and the injected RNG. The caller reads the
/// snapshots and applies the returned deltas inside one store transaction.
///
/// Order of precedence:
/// 1. resolve the range containing `spin_number`
/// 2. grand-prize-contestant draw (wins over the prize draw; one outcome per
///    spin)
/// 3. named-prize draw over this range's in-stock records
/// 4. no win
///
/// Each draw uses its own uniform roll in `[0, 1)` compared as
/// `roll < probability`, so a probability that reaches 1.0 on the final slots
/// always fires and quotas complete exactly at range end.
pub fn decide<R: Rng>(
    spin_number: u32,
    config: &PromotionConfig,
    inventory: &[PrizeInventoryRecord],
    counters: &PromotionCounters,
    rng: &mut R,
) -> Decision {
    let Some(range) = config.ranges.range_for(spin_number) else {
        return Decision::PromotionOver;
    };
    let slots = range.remaining_slots(spin_number);

    // Grand-prize-contestant draw
    let open_in_range = range
        .contestant_quota
        .saturating_sub(counters.contestants_in(range.start));
    let open_globally = config
        .global_contestant_cap
        .saturating_sub(counters.grand_prize_contestants);
    if open_in_range > 0 && open_globally > 0 {
        let probability = open_in_range as f64 / slots as f64;
        if rng.random::<f64>() < probability {
            return Decision::Spin(SpinDecision {
                outcome: Outcome::GrandPrize,
                counter_delta: CounterDelta {
                    total_spins: spin_number,
                    contestant_range: Some(range.start),
                },
                inventory_delta: None,
            });
        }
    }

    // Named-prize draw
    let in_stock: Vec<&PrizeInventoryRecord> = inventory
        .iter()
        .filter(|r| r.range_start == range.start && r.in_stock())
        .collect();
    let total_remaining: u32 = in_stock.iter().map(|r| r.remaining).sum();
    if total_remaining == 0 {
        return Decision::Spin(SpinDecision::no_win(spin_number));
    }

    let probability = total_remaining as f64 / slots as f64;
    if rng.random::<f64>() < probability {
        let selected = in_stock[rng.random_range(0..in_stock.len())];
        return Decision::Spin(SpinDecision {
            outcome: Outcome::NamedPrize(selected.name.clone()),
            counter_delta: CounterDelta {
                total_spins: spin_number,
                contestant_range: None,
            },
            inventory_delta: Some(InventoryDelta {
                range_start: range.start,
                prize: selected.name.clone(),
            }),
        });
    }

    Decision::Spin(SpinDecision::no_win(spin_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use spin_core::{RangeSpec, RangeTable};

    /// Single range [1, 100], 9 named units, 4 contestant slots
    fn launch_config() -> PromotionConfig {
        PromotionConfig {
            max_spins: 100,
            global_contestant_cap: 4,
            ranges: RangeTable::new(vec![RangeSpec {
                start: 1,
                end: 100,
                gift_quota: 9,
                contestant_quota: 4,
                base_probability: 0.09,
            }]),
            prizes: vec![
                "₦100,000".into(),
                "₦50,000".into(),
                "₦20,000".into(),
                "Phone".into(),
                "Artifact Hoodie".into(),
                "Premiere Invite".into(),
            ],
        }
    }

    fn launch_inventory(config: &PromotionConfig) -> Vec<PrizeInventoryRecord> {
        // 9 units: 2+2+2+1+1+1 across the six prizes
        config
            .prizes
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let count = if i < 3 { 2 } else { 1 };
                PrizeInventoryRecord {
                    name: name.clone(),
                    range_start: 1,
                    range_end: 100,
                    total_count: count,
                    remaining: count,
                }
            })
            .collect()
    }

    fn apply(
        decision: &SpinDecision,
        counters: &mut PromotionCounters,
        inventory: &mut [PrizeInventoryRecord],
    ) {
        assert_eq!(decision.counter_delta.total_spins, counters.total_spins + 1);
        counters.total_spins = decision.counter_delta.total_spins;
        if let Some(range_start) = decision.counter_delta.contestant_range {
            *counters.range_contestants.entry(range_start).or_insert(0) += 1;
            counters.grand_prize_contestants += 1;
        }
        if let Some(delta) = &decision.inventory_delta {
            let record = inventory
                .iter_mut()
                .find(|r| r.range_start == delta.range_start && r.name == delta.prize)
                .expect("delta names a seeded record");
            assert!(record.remaining > 0, "inventory oversold");
            record.remaining -= 1;
        }
    }

    fn expect_spin(decision: Decision) -> SpinDecision {
        match decision {
            Decision::Spin(spin) => spin,
            Decision::PromotionOver => panic!("unexpected PromotionOver"),
        }
    }

    #[test]
    fn test_out_of_range_is_promotion_over() {
        let config = launch_config();
        let inventory = launch_inventory(&config);
        let counters = PromotionCounters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let decision = decide(101, &config, &inventory, &counters, &mut rng);
        assert_eq!(decision, Decision::PromotionOver);
    }

    #[test]
    fn test_final_slot_forces_contestant() {
        let config = launch_config();
        let inventory = launch_inventory(&config);
        let mut counters = PromotionCounters::default();
        counters.total_spins = 99;
        counters.range_contestants.insert(1, 3);
        counters.grand_prize_contestants = 3;

        // One contestant slot open on the last spin: probability 1/1
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spin = expect_spin(decide(100, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::GrandPrize);
            assert_eq!(spin.counter_delta.contestant_range, Some(1));
            assert!(spin.inventory_delta.is_none());
        }
    }

    #[test]
    fn test_final_slot_forces_prize_when_quota_met() {
        let config = launch_config();
        let mut inventory = launch_inventory(&config);
        for record in &mut inventory {
            record.remaining = 0;
        }
        inventory[3].remaining = 1; // one Phone left

        let mut counters = PromotionCounters::default();
        counters.total_spins = 99;
        counters.range_contestants.insert(1, 4);
        counters.grand_prize_contestants = 4;

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spin = expect_spin(decide(100, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::NamedPrize("Phone".into()));
            assert_eq!(
                spin.inventory_delta,
                Some(InventoryDelta {
                    range_start: 1,
                    prize: "Phone".into(),
                })
            );
        }
    }

    #[test]
    fn test_precedence_contestant_draw_first() {
        // Last spin, one contestant slot AND stock both forced to 1.0:
        // the contestant draw must win and the inventory stays untouched.
        let config = launch_config();
        let inventory = launch_inventory(&config);
        let mut counters = PromotionCounters::default();
        counters.total_spins = 99;
        counters.range_contestants.insert(1, 3);
        counters.grand_prize_contestants = 3;

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spin = expect_spin(decide(100, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::GrandPrize);
            assert!(spin.inventory_delta.is_none());
        }
    }

    #[test]
    fn test_empty_pool_never_wins_prize() {
        let config = launch_config();
        let mut inventory = launch_inventory(&config);
        for record in &mut inventory {
            record.remaining = 0;
        }
        let mut counters = PromotionCounters::default();
        counters.range_contestants.insert(1, 4);
        counters.grand_prize_contestants = 4;

        for seed in 0..64 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            counters.total_spins = 49;
            let spin = expect_spin(decide(50, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::NoWin);
            assert!(spin.inventory_delta.is_none());
        }
    }

    #[test]
    fn test_global_cap_blocks_contestant_draw() {
        // Range quota open but the global cap is exhausted: with no stock
        // either, every spin is a no-win.
        let mut config = launch_config();
        config.global_contestant_cap = 2;
        let mut inventory = launch_inventory(&config);
        for record in &mut inventory {
            record.remaining = 0;
        }
        let mut counters = PromotionCounters::default();
        counters.total_spins = 99;
        counters.range_contestants.insert(1, 2);
        counters.grand_prize_contestants = 2;

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spin = expect_spin(decide(100, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::NoWin);
        }
    }

    #[test]
    fn test_selection_only_among_in_stock_names() {
        let config = launch_config();
        let mut inventory = launch_inventory(&config);
        for record in &mut inventory {
            record.remaining = 0;
        }
        inventory[5].remaining = 1; // only Premiere Invite left

        let mut counters = PromotionCounters::default();
        counters.total_spins = 99;
        counters.range_contestants.insert(1, 4);
        counters.grand_prize_contestants = 4;

        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let spin = expect_spin(decide(100, &config, &inventory, &counters, &mut rng));
            assert_eq!(spin.outcome, Outcome::NamedPrize("Premiere Invite".into()));
        }
    }

    #[test]
    fn test_full_range_walk_exhausts_quotas_exactly() {
        let config = launch_config();
        let mut inventory = launch_inventory(&config);
        let mut counters = PromotionCounters::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0xA11C);

        let mut prize_wins = 0u32;
        for spin_number in 1..=100 {
            let spin = expect_spin(decide(
                spin_number,
                &config,
                &inventory,
                &counters,
                &mut rng,
            ));
            if matches!(spin.outcome, Outcome::NamedPrize(_)) {
                prize_wins += 1;
            }
            apply(&spin, &mut counters, &mut inventory);
            assert!(counters.is_consistent());
            assert!(counters.grand_prize_contestants <= 4);
        }

        assert_eq!(counters.total_spins, 100);
        assert_eq!(counters.grand_prize_contestants, 4);
        assert_eq!(counters.contestants_in(1), 4);
        assert_eq!(prize_wins, 9);
        let consumed: u32 = inventory.iter().map(|r| r.consumed()).sum();
        assert_eq!(consumed, 9);
        assert!(inventory.iter().all(|r| r.remaining == 0));
    }

    #[test]
    fn test_contestant_quota_exact_for_any_seed() {
        // The contestant draw is a pure hypergeometric chain: exactly 4
        // contestants fall out of 100 spins no matter the roll sequence.
        for seed in 0..24 {
            let config = launch_config();
            let mut inventory = launch_inventory(&config);
            let mut counters = PromotionCounters::default();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            for spin_number in 1..=100 {
                let spin = expect_spin(decide(
                    spin_number,
                    &config,
                    &inventory,
                    &counters,
                    &mut rng,
                ));
                apply(&spin, &mut counters, &mut inventory);
            }

            assert_eq!(counters.grand_prize_contestants, 4, "seed {seed}");
            let consumed: u32 = inventory.iter().map(|r| r.consumed()).sum();
            assert!(consumed <= 9, "seed {seed} oversold");
        }
    }

    #[test]
    fn test_counter_delta_always_advances_by_one() {
        let config = launch_config();
        let inventory = launch_inventory(&config);
        let mut counters = PromotionCounters::default();
        counters.total_spins = 9;
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let spin = expect_spin(decide(10, &config, &inventory, &counters, &mut rng));
        assert_eq!(spin.counter_delta.total_spins, 10);
    }
}
