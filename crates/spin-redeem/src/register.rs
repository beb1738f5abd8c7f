//! Batch ticket registration

use std::collections::HashSet;

use rand::Rng;

use spin_core::{PromoError, PromoResult, Ticket};
use spin_store::{Store, Txn};

use crate::coordinator::RedemptionCoordinator;

/// Shortest acceptable ticket code
pub const MIN_CODE_LEN: usize = 3;

impl<S: Store, R: Rng> RedemptionCoordinator<S, R> {
    /// Register a batch of fresh ticket codes.
    ///
    /// Every code must be at least [`MIN_CODE_LEN`] characters. A code that
    /// repeats within the batch or already exists in the store rejects the
    /// whole batch, listing the offenders; insertion is all-or-nothing in one
    /// transaction. Returns the number of tickets created.
    pub fn register(&self, codes: &[String]) -> PromoResult<u32> {
        for code in codes {
            if code.trim().len() < MIN_CODE_LEN {
                return Err(PromoError::MalformedCode(code.clone()));
            }
        }

        let mut seen = HashSet::new();
        let in_batch: Vec<String> = codes
            .iter()
            .filter(|code| !seen.insert(code.as_str()))
            .cloned()
            .collect();
        if !in_batch.is_empty() {
            return Err(PromoError::DuplicateTickets(in_batch));
        }

        let mut uncertain_commit = false;
        for attempt in 1..=self.retry.max_attempts {
            match self.try_register(codes) {
                // An uncertain commit that actually landed shows up on retry
                // as every code being a duplicate: that is this call's own
                // batch, already registered.
                Err(PromoError::DuplicateTickets(dups))
                    if uncertain_commit && dups.len() == codes.len() =>
                {
                    log::info!("registration batch found committed after uncertain commit");
                    return Ok(codes.len() as u32);
                }
                Err(PromoError::Conflict) if attempt < self.retry.max_attempts => {
                    log::debug!("registration conflict on attempt {attempt}");
                    self.retry.backoff(attempt);
                }
                Err(PromoError::StoreUnavailable(reason))
                    if attempt < self.retry.max_attempts =>
                {
                    log::warn!("registration: store unavailable on attempt {attempt}: {reason}");
                    uncertain_commit = true;
                    self.retry.backoff(attempt);
                }
                other => return other,
            }
        }
        Err(PromoError::Conflict)
    }

    fn try_register(&self, codes: &[String]) -> PromoResult<u32> {
        let mut txn = self.store.begin()?;

        let mut existing = Vec::new();
        for code in codes {
            if txn.ticket(code)?.is_some() {
                existing.push(code.clone());
            }
        }
        if !existing.is_empty() {
            return Err(PromoError::DuplicateTickets(existing));
        }

        for code in codes {
            txn.insert_ticket(Ticket::new(code.clone()))?;
        }
        txn.commit()?;

        log::info!("registered {} tickets", codes.len());
        Ok(codes.len() as u32)
    }
}
