//! In-memory reference store
//!
//! Snapshot-isolated optimistic concurrency: every logical row (the counters
//! singleton, one key per inventory range, one key per ticket) carries a
//! version stamp. Transactions record the version of everything they read,
//! buffer their writes, and validate the whole read set under the write lock
//! at commit. First committer wins; the loser gets a clean conflict with
//! nothing applied.

use std::collections::HashMap;

use parking_lot::RwLock;

use spin_core::{
    CounterDelta, InventoryDelta, PrizeInventoryRecord, PromoError, PromoResult,
    PromotionConfig, PromotionCounters, Ticket,
};

use crate::seed;
use crate::store::{Store, Txn};

/// Logical row identity for version stamping
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Key {
    Counters,
    Inventory(u32),
    Ticket(String),
}

#[derive(Default)]
struct State {
    commit_seq: u64,
    counters: Option<PromotionCounters>,
    inventory: HashMap<u32, Vec<PrizeInventoryRecord>>,
    tickets: HashMap<String, Ticket>,
    versions: HashMap<Key, u64>,
}

impl State {
    fn version_of(&self, key: &Key) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }
}

/// In-memory transactional store
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Empty store; reads fail with `NotInitialized` until seeded state is
    /// installed
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    /// Store seeded with the full inventory and zeroed counters for a
    /// validated configuration
    pub fn seeded(config: &PromotionConfig) -> PromoResult<Self> {
        config.validate()?;
        Ok(Self::from_parts(
            seed::initial_counters(config),
            seed::build_inventory(config),
        ))
    }

    /// Store assembled from explicit state (custom pools in tests and tools)
    pub fn from_parts(
        counters: PromotionCounters,
        records: Vec<PrizeInventoryRecord>,
    ) -> Self {
        let mut state = State::default();
        for record in records {
            state
                .inventory
                .entry(record.range_start)
                .or_default()
                .push(record);
        }
        state.counters = Some(counters);
        Self {
            state: RwLock::new(state),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    type Txn<'a>
        = MemoryTxn<'a>
    where
        Self: 'a;

    fn begin(&self) -> PromoResult<MemoryTxn<'_>> {
        Ok(MemoryTxn {
            store: self,
            reads: HashMap::new(),
            counter_delta: None,
            inventory_delta: None,
            inserts: Vec::new(),
            updates: Vec::new(),
        })
    }
}

/// Transaction over a [`MemoryStore`]. Dropping without commit aborts.
pub struct MemoryTxn<'s> {
    store: &'s MemoryStore,
    reads: HashMap<Key, u64>,
    counter_delta: Option<CounterDelta>,
    inventory_delta: Option<InventoryDelta>,
    inserts: Vec<Ticket>,
    updates: Vec<Ticket>,
}

impl MemoryTxn<'_> {
    fn record_read(&mut self, key: Key, version: u64) {
        self.reads.entry(key).or_insert(version);
    }
}

impl Txn for MemoryTxn<'_> {
    fn counters(&mut self) -> PromoResult<PromotionCounters> {
        let state = self.store.state.read();
        let counters = state.counters.clone().ok_or(PromoError::NotInitialized)?;
        let version = state.version_of(&Key::Counters);
        drop(state);
        self.record_read(Key::Counters, version);
        Ok(counters)
    }

    fn inventory(&mut self, range_start: u32) -> PromoResult<Vec<PrizeInventoryRecord>> {
        let state = self.store.state.read();
        if state.counters.is_none() {
            return Err(PromoError::NotInitialized);
        }
        let records = state
            .inventory
            .get(&range_start)
            .cloned()
            .unwrap_or_default();
        let version = state.version_of(&Key::Inventory(range_start));
        drop(state);
        self.record_read(Key::Inventory(range_start), version);
        Ok(records)
    }

    fn ticket(&mut self, code: &str) -> PromoResult<Option<Ticket>> {
        let state = self.store.state.read();
        let ticket = state.tickets.get(code).cloned();
        let version = state.version_of(&Key::Ticket(code.to_owned()));
        drop(state);
        self.record_read(Key::Ticket(code.to_owned()), version);
        Ok(ticket)
    }

    fn insert_ticket(&mut self, ticket: Ticket) -> PromoResult<()> {
        if self.inserts.iter().any(|t| t.code == ticket.code) {
            return Err(PromoError::DuplicateTickets(vec![ticket.code]));
        }
        let version = {
            let state = self.store.state.read();
            state.version_of(&Key::Ticket(ticket.code.clone()))
        };
        self.record_read(Key::Ticket(ticket.code.clone()), version);
        self.inserts.push(ticket);
        Ok(())
    }

    fn write_ticket(&mut self, ticket: Ticket) -> PromoResult<()> {
        let version = {
            let state = self.store.state.read();
            state.version_of(&Key::Ticket(ticket.code.clone()))
        };
        self.record_read(Key::Ticket(ticket.code.clone()), version);
        self.updates.push(ticket);
        Ok(())
    }

    fn apply_deltas(
        &mut self,
        counters: &CounterDelta,
        inventory: Option<&InventoryDelta>,
    ) -> PromoResult<()> {
        if self.counter_delta.is_some() {
            return Err(PromoError::StoreUnavailable(
                "deltas applied twice in one transaction".into(),
            ));
        }
        // The coordinator reads counters/inventory before deciding, so these
        // keys are normally in the read set already; recording here keeps the
        // commit validation complete for any caller.
        let (counter_version, inventory_version) = {
            let state = self.store.state.read();
            (
                state.version_of(&Key::Counters),
                inventory.map(|d| state.version_of(&Key::Inventory(d.range_start))),
            )
        };
        self.record_read(Key::Counters, counter_version);
        if let (Some(delta), Some(version)) = (inventory, inventory_version) {
            self.record_read(Key::Inventory(delta.range_start), version);
        }
        self.counter_delta = Some(counters.clone());
        self.inventory_delta = inventory.cloned();
        Ok(())
    }

    fn redeemed_winners(&mut self) -> PromoResult<Vec<Ticket>> {
        let state = self.store.state.read();
        let mut winners: Vec<Ticket> = state
            .tickets
            .values()
            .filter(|t| {
                t.redeemed
                    && (t.is_grand_prize_contestant
                        || matches!(t.outcome, Some(spin_core::Outcome::NamedPrize(_))))
            })
            .cloned()
            .collect();
        winners.sort_by_key(|t| t.spin_number);
        Ok(winners)
    }

    fn commit(self) -> PromoResult<()> {
        let mut state = self.store.state.write();

        // Validate the read set: first committer wins
        for (key, version) in &self.reads {
            if state.version_of(key) != *version {
                log::debug!("commit conflict on {key:?}");
                return Err(PromoError::Conflict);
            }
        }

        // Validate applicability before touching anything, so a rejected
        // commit leaves the state untouched
        if let Some(delta) = &self.counter_delta {
            let counters = state.counters.as_ref().ok_or(PromoError::NotInitialized)?;
            if delta.total_spins != counters.total_spins + 1 {
                return Err(PromoError::Conflict);
            }
        }
        if let Some(delta) = &self.inventory_delta {
            let in_stock = state
                .inventory
                .get(&delta.range_start)
                .and_then(|rows| rows.iter().find(|r| r.name == delta.prize))
                .is_some_and(|r| r.remaining > 0);
            if !in_stock {
                return Err(PromoError::StoreUnavailable(format!(
                    "decrement on exhausted record {:?} in range {}",
                    delta.prize, delta.range_start
                )));
            }
        }
        for ticket in &self.inserts {
            if state.tickets.contains_key(&ticket.code) {
                return Err(PromoError::Conflict);
            }
        }

        // Apply
        state.commit_seq += 1;
        let seq = state.commit_seq;

        if let Some(delta) = self.counter_delta {
            if let Some(counters) = state.counters.as_mut() {
                counters.total_spins = delta.total_spins;
                if let Some(range_start) = delta.contestant_range {
                    *counters.range_contestants.entry(range_start).or_insert(0) += 1;
                    counters.grand_prize_contestants += 1;
                }
            }
            state.versions.insert(Key::Counters, seq);
        }
        if let Some(delta) = self.inventory_delta {
            if let Some(record) = state
                .inventory
                .get_mut(&delta.range_start)
                .and_then(|rows| rows.iter_mut().find(|r| r.name == delta.prize))
            {
                record.remaining -= 1;
            }
            state.versions.insert(Key::Inventory(delta.range_start), seq);
        }
        for ticket in self.inserts {
            state
                .versions
                .insert(Key::Ticket(ticket.code.clone()), seq);
            state.tickets.insert(ticket.code.clone(), ticket);
        }
        for ticket in self.updates {
            state
                .versions
                .insert(Key::Ticket(ticket.code.clone()), seq);
            state.tickets.insert(ticket.code.clone(), ticket);
        }

        Ok(())
    }
}
