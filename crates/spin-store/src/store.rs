//! Store and transaction traits

use spin_core::{
    CounterDelta, InventoryDelta, PrizeInventoryRecord, PromoResult, PromotionCounters, Ticket,
};

/// One atomic unit of work against the promotion state.
///
/// Reads within a transaction observe a consistent snapshot; writes are
/// buffered until [`Txn::commit`]. Dropping an uncommitted transaction aborts
/// it with no effects. A commit that returns [`spin_core::PromoError::Conflict`]
/// applied nothing and is safe to retry on fresh snapshots.
pub trait Txn {
    /// Read the promotion counters singleton
    fn counters(&mut self) -> PromoResult<PromotionCounters>;

    /// Read every prize record belonging to one range
    fn inventory(&mut self, range_start: u32) -> PromoResult<Vec<PrizeInventoryRecord>>;

    /// Read a ticket by code
    fn ticket(&mut self, code: &str) -> PromoResult<Option<Ticket>>;

    /// Buffer the creation of a new ticket. The commit rejects the
    /// transaction if the code appeared concurrently.
    fn insert_ticket(&mut self, ticket: Ticket) -> PromoResult<()>;

    /// Buffer an update of an existing ticket
    fn write_ticket(&mut self, ticket: Ticket) -> PromoResult<()>;

    /// Buffer the counter/inventory mutations of one allocation decision
    fn apply_deltas(
        &mut self,
        counters: &CounterDelta,
        inventory: Option<&InventoryDelta>,
    ) -> PromoResult<()>;

    /// Redeemed tickets that won a prize or the contestant flag
    fn redeemed_winners(&mut self) -> PromoResult<Vec<Ticket>>;

    /// Validate and apply all buffered writes atomically
    fn commit(self) -> PromoResult<()>
    where
        Self: Sized;
}

/// Factory for transactions against one promotion state
pub trait Store {
    /// Transaction type tied to this store's lifetime
    type Txn<'a>: Txn
    where
        Self: 'a;

    /// Open a new transaction
    fn begin(&self) -> PromoResult<Self::Txn<'_>>;
}
