//! # spin-engine — spin-allocation engine
//!
//! The pure decision core of the promotion: given the next sequential spin
//! number and a snapshot of inventory and counters, decide the outcome
//! (grand-prize contestant, named prize, or no win) and the deltas to apply.
//!
//! Win probabilities are finite-population draws: `remaining_wins /
//! remaining_trials`, recomputed per spin, so every range pays out its exact
//! quota by its last spin instead of approximating it on average.
//!
//! No I/O and no hidden state; the RNG is injected, so a seeded generator
//! replays identical allocation sequences.

pub mod engine;

pub use engine::*;
