//! Redemption coordinator

use chrono::Utc;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spin_core::{Outcome, PromoError, PromoResult, PromotionConfig, RedemptionResult};
use spin_engine::{Decision, decide};
use spin_store::{Store, Txn};

use crate::retry::RetryPolicy;

/// Coordinates ticket redemptions against one promotion store.
///
/// Safe to share across threads: every redemption runs in its own store
/// transaction, and the coordinator holds no promotion state of its own —
/// only the static configuration, the retry policy, and the RNG.
pub struct RedemptionCoordinator<S: Store, R: Rng = StdRng> {
    pub(crate) store: S,
    pub(crate) config: PromotionConfig,
    pub(crate) retry: RetryPolicy,
    rng: Mutex<R>,
}

impl<S: Store> RedemptionCoordinator<S, StdRng> {
    /// Coordinator with an OS-seeded RNG
    pub fn new(store: S, config: PromotionConfig) -> PromoResult<Self> {
        Self::with_rng(store, config, StdRng::from_os_rng())
    }
}

impl<S: Store, R: Rng> RedemptionCoordinator<S, R> {
    /// Coordinator with a caller-supplied RNG (seeded generators replay
    /// identical allocation sequences)
    pub fn with_rng(store: S, config: PromotionConfig, rng: R) -> PromoResult<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            retry: RetryPolicy::default(),
            rng: Mutex::new(rng),
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Static configuration in effect
    pub fn config(&self) -> &PromotionConfig {
        &self.config
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Redeem a ticket for one spin outcome.
    ///
    /// Runs the whole flow — eligibility, spin-number assignment, allocation,
    /// persistence — in one transaction. Commit conflicts retry with backoff.
    /// After an *uncertain* commit (the store failed after the write may have
    /// landed), a ticket found already redeemed on the next attempt is this
    /// call's own prior redemption and resolves to its recorded result.
    pub fn redeem(&self, code: &str) -> PromoResult<RedemptionResult> {
        let mut uncertain_commit = false;
        for attempt in 1..=self.retry.max_attempts {
            match self.try_redeem(code) {
                Err(PromoError::AlreadyRedeemed) if uncertain_commit => {
                    log::info!("ticket {code:?}: recovering prior result after uncertain commit");
                    return self.prior_result(code);
                }
                Err(PromoError::Conflict) if attempt < self.retry.max_attempts => {
                    log::debug!("ticket {code:?}: commit conflict on attempt {attempt}");
                    self.retry.backoff(attempt);
                }
                Err(PromoError::StoreUnavailable(reason))
                    if attempt < self.retry.max_attempts =>
                {
                    log::warn!("ticket {code:?}: store unavailable on attempt {attempt}: {reason}");
                    uncertain_commit = true;
                    self.retry.backoff(attempt);
                }
                other => return other,
            }
        }
        Err(PromoError::Conflict)
    }

    fn try_redeem(&self, code: &str) -> PromoResult<RedemptionResult> {
        let mut txn = self.store.begin()?;

        let counters = txn.counters()?;
        if counters.total_spins >= self.config.max_spins {
            return Err(PromoError::PromotionEnded);
        }

        let Some(mut ticket) = txn.ticket(code)? else {
            return Err(PromoError::UnknownTicket);
        };
        if ticket.redeemed {
            return Err(PromoError::AlreadyRedeemed);
        }

        let spin_number = counters.total_spins + 1;
        let Some(range) = self.config.ranges.range_for(spin_number) else {
            return Err(PromoError::PromotionEnded);
        };
        let inventory = txn.inventory(range.start)?;

        let decision = {
            let mut rng = self.rng.lock();
            decide(spin_number, &self.config, &inventory, &counters, &mut *rng)
        };
        let spin = match decision {
            Decision::PromotionOver => return Err(PromoError::PromotionEnded),
            Decision::Spin(spin) => spin,
        };

        txn.apply_deltas(&spin.counter_delta, spin.inventory_delta.as_ref())?;
        ticket.mark_redeemed(spin_number, spin.outcome.clone(), Utc::now());
        let is_grand_prize_contestant = ticket.is_grand_prize_contestant;
        txn.write_ticket(ticket)?;
        txn.commit()?;

        log::info!("spin {spin_number}: ticket {code:?} drew {}", spin.outcome);
        Ok(RedemptionResult {
            outcome: spin.outcome,
            is_grand_prize_contestant,
            spin_number,
            remaining_spins: self.config.max_spins - spin_number,
        })
    }

    /// Rebuild a redemption result from the ticket's recorded outcome
    fn prior_result(&self, code: &str) -> PromoResult<RedemptionResult> {
        let mut txn = self.store.begin()?;
        let Some(ticket) = txn.ticket(code)? else {
            return Err(PromoError::UnknownTicket);
        };
        if !ticket.redeemed {
            return Err(PromoError::AlreadyRedeemed);
        }
        let spin_number = ticket.spin_number.ok_or(PromoError::AlreadyRedeemed)?;
        Ok(RedemptionResult {
            outcome: ticket.outcome.unwrap_or(Outcome::NoWin),
            is_grand_prize_contestant: ticket.is_grand_prize_contestant,
            spin_number,
            remaining_spins: self.config.max_spins.saturating_sub(spin_number),
        })
    }
}

impl<S: Store, R: Rng + SeedableRng> RedemptionCoordinator<S, R> {
    /// Seed the RNG for reproducible allocation sequences
    pub fn seed(&self, seed: u64) {
        *self.rng.lock() = R::seed_from_u64(seed);
    }
}
