//! Batch Spin Simulator
//!
//! Seeds a fresh promotion, registers simulation tickets, and burns through a
//! batch of spins. Single-threaded runs with `--seed` are fully
//! deterministic, so a range can be replayed and its quota pacing inspected;
//! `--threads` runs the same batch under contention to watch the commit/retry
//! path instead.
//!
//! Usage:
//!   spin-sim --spins 100 --seed 42
//!   spin-sim --spins 1000 --threads 8
//!   spin-sim --config promo.json --spins 100 --verbose

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use spin_core::{Outcome, PromotionConfig, RedemptionResult};
use spin_redeem::{RedemptionCoordinator, RetryPolicy};
use spin_store::MemoryStore;

#[derive(Parser)]
#[command(name = "spin-sim", about = "Batch spin simulator for the wheel promotion")]
struct Cli {
    /// Number of spins to simulate
    #[arg(long, default_value_t = 100)]
    spins: u32,

    /// RNG seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Promotion config JSON (defaults to the production promotion)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads (more than 1 exercises commit contention)
    #[arg(long, default_value_t = 1)]
    threads: u32,

    /// Print every spin result
    #[arg(long)]
    verbose: bool,
}

#[derive(Default)]
struct Tally {
    contestants: u32,
    prizes: u32,
    try_again: u32,
    breakdown: BTreeMap<String, u32>,
}

impl Tally {
    fn record(&mut self, result: &RedemptionResult) {
        if result.is_grand_prize_contestant {
            self.contestants += 1;
        }
        match &result.outcome {
            Outcome::NamedPrize(_) => self.prizes += 1,
            Outcome::NoWin => self.try_again += 1,
            Outcome::GrandPrize => {}
        }
        *self
            .breakdown
            .entry(result.outcome.label().to_owned())
            .or_insert(0) += 1;
    }

    fn merge(&mut self, other: Tally) {
        self.contestants += other.contestants;
        self.prizes += other.prizes;
        self.try_again += other.try_again;
        for (label, count) in other.breakdown {
            *self.breakdown.entry(label).or_insert(0) += count;
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            PromotionConfig::from_json(&json)?
        }
        None => PromotionConfig::default(),
    };

    let store = MemoryStore::seeded(&config)?;
    let coordinator = RedemptionCoordinator::with_rng(
        store,
        config.clone(),
        ChaCha8Rng::seed_from_u64(cli.seed),
    )?
    .with_retry(RetryPolicy::no_delay(64));

    let codes: Vec<String> = (1..=cli.spins).map(|i| format!("SIM{i:06}")).collect();
    coordinator.register(&codes)?;
    log::info!("registered {} simulation tickets", codes.len());

    println!("=== Simulating {} spins (seed {}) ===\n", cli.spins, cli.seed);

    let tally = if cli.threads > 1 {
        run_concurrent(&coordinator, &codes, cli.threads as usize)?
    } else {
        run_sequential(&coordinator, &codes, cli.verbose)?
    };

    print_report(&coordinator, &tally, cli.spins)?;
    Ok(())
}

fn run_sequential(
    coordinator: &RedemptionCoordinator<MemoryStore, ChaCha8Rng>,
    codes: &[String],
    verbose: bool,
) -> Result<Tally> {
    let mut tally = Tally::default();
    for code in codes {
        let result = coordinator
            .redeem(code)
            .with_context(|| format!("redeeming {code}"))?;
        if verbose {
            println!(
                "Spin {:>6}: {code} - {}{}",
                result.spin_number,
                result.outcome,
                if result.is_grand_prize_contestant {
                    " (Grand Prize Contestant!)"
                } else {
                    ""
                }
            );
        }
        tally.record(&result);
    }
    Ok(tally)
}

fn run_concurrent(
    coordinator: &RedemptionCoordinator<MemoryStore, ChaCha8Rng>,
    codes: &[String],
    threads: usize,
) -> Result<Tally> {
    let chunk_size = codes.len().div_ceil(threads).max(1);
    let mut tally = Tally::default();

    let partials: Vec<Result<Tally>> = thread::scope(|scope| {
        let handles: Vec<_> = codes
            .chunks(chunk_size)
            .map(|chunk| {
                scope.spawn(move || {
                    let mut partial = Tally::default();
                    for code in chunk {
                        let result = coordinator
                            .redeem(code)
                            .with_context(|| format!("redeeming {code}"))?;
                        partial.record(&result);
                    }
                    Ok(partial)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("simulation worker panicked"))
            .collect()
    });

    for partial in partials {
        tally.merge(partial?);
    }
    Ok(tally)
}

fn print_report(
    coordinator: &RedemptionCoordinator<MemoryStore, ChaCha8Rng>,
    tally: &Tally,
    spins: u32,
) -> Result<()> {
    let stats = coordinator.stats()?;

    println!("\n=== Final Statistics ===\n");
    println!("Total Spins:            {}", stats.total_spins);
    println!(
        "Grand Prize Contestants: {} / {}",
        stats.grand_prize_contestants, stats.global_contestant_cap
    );
    println!("Named Prizes Won:       {}", tally.prizes);
    println!("Try Again Results:      {}", tally.try_again);
    println!("Remaining Spins:        {}", stats.remaining_spins);

    println!("\nOutcome Breakdown:");
    let mut rows: Vec<(&String, &u32)> = tally.breakdown.iter().collect();
    rows.sort_by(|a, b| b.1.cmp(a.1));
    for (label, count) in rows {
        println!("{label:<20}: {count}");
    }

    for range in &stats.ranges {
        if range.start > spins {
            break;
        }
        println!("\nRange {}-{}:", range.start, range.end);
        println!(
            "  Contestants: {} / {}",
            range.contestants, range.contestant_quota
        );
        for record in &range.prizes {
            println!(
                "  {:<20}: {} / {} remaining",
                record.name, record.remaining, record.total_count
            );
        }
    }

    Ok(())
}
