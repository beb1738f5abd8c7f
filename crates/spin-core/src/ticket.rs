//! Ticket records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::Outcome;

/// One redeemable ticket. Created unused by the registration collaborator,
/// mutated exactly once by the redemption flow, frozen thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// External, case-sensitive code assigned before redemption
    pub code: String,
    /// Has this ticket been spent?
    pub redeemed: bool,
    /// Outcome recorded at redemption
    pub outcome: Option<Outcome>,
    /// Position in the global sequential draw
    pub spin_number: Option<u32>,
    /// Was this ticket selected as a grand-prize contestant?
    pub is_grand_prize_contestant: bool,
    /// When the redemption committed
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// Fresh, unredeemed ticket
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            redeemed: false,
            outcome: None,
            spin_number: None,
            is_grand_prize_contestant: false,
            redeemed_at: None,
        }
    }

    /// Record the single `redeemed = false → true` transition.
    ///
    /// The caller guarantees the ticket is unredeemed; the transaction
    /// boundary makes a second transition unreachable.
    pub fn mark_redeemed(&mut self, spin_number: u32, outcome: Outcome, at: DateTime<Utc>) {
        debug_assert!(!self.redeemed, "ticket redeemed twice");
        self.is_grand_prize_contestant = matches!(outcome, Outcome::GrandPrize);
        self.redeemed = true;
        self.outcome = Some(outcome);
        self.spin_number = Some(spin_number);
        self.redeemed_at = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ticket_is_blank() {
        let ticket = Ticket::new("ABC123");
        assert!(!ticket.redeemed);
        assert!(ticket.outcome.is_none());
        assert!(ticket.spin_number.is_none());
        assert!(!ticket.is_grand_prize_contestant);
        assert!(ticket.redeemed_at.is_none());
    }

    #[test]
    fn test_mark_redeemed_freezes_fields() {
        let mut ticket = Ticket::new("ABC123");
        ticket.mark_redeemed(42, Outcome::NamedPrize("Phone".into()), Utc::now());
        assert!(ticket.redeemed);
        assert_eq!(ticket.spin_number, Some(42));
        assert_eq!(ticket.outcome, Some(Outcome::NamedPrize("Phone".into())));
        assert!(!ticket.is_grand_prize_contestant);
        assert!(ticket.redeemed_at.is_some());
    }

    #[test]
    fn test_grand_prize_sets_contestant_flag() {
        let mut ticket = Ticket::new("ABC123");
        ticket.mark_redeemed(7, Outcome::GrandPrize, Utc::now());
        assert!(ticket.is_grand_prize_contestant);
    }
}
