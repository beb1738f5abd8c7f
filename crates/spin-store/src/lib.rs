//! # spin-store — transactional inventory store
//!
//! Owns durability and atomic mutation of the promotion state: the counters
//! singleton, the per-range prize inventory, and the ticket records.
//!
//! The [`Store`]/[`Txn`] traits are the seam the redemption coordinator runs
//! inside; [`MemoryStore`] is the reference implementation — snapshot reads
//! with per-key version stamps and first-committer-wins commit validation, so
//! two transactions can never both consume the same last unit: one commits,
//! the other observes a conflict and retries on fresh snapshots.

pub mod memory;
pub mod seed;
pub mod store;

pub use memory::*;
pub use seed::*;
pub use store::*;
