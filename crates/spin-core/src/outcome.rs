//! Spin outcomes and the redemption result returned to callers

use serde::{Deserialize, Serialize};

/// Outcome of a single spin allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// Flagged as a grand-prize contestant (capped per range and globally)
    GrandPrize,
    /// Won one unit of a named prize from this range's inventory
    NamedPrize(String),
    /// Nothing won on this spin
    NoWin,
}

impl Outcome {
    /// User-facing label for the wheel
    pub fn label(&self) -> &str {
        match self {
            Outcome::GrandPrize => "Grand Prize",
            Outcome::NamedPrize(name) => name,
            Outcome::NoWin => "Try Again",
        }
    }

    /// Did this spin win anything?
    pub fn is_win(&self) -> bool {
        !matches!(self, Outcome::NoWin)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What a successful redemption returns to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionResult {
    /// The spin outcome
    pub outcome: Outcome,
    /// Was this spin selected as a grand-prize contestant?
    pub is_grand_prize_contestant: bool,
    /// Position this ticket occupied in the global draw (1-based)
    pub spin_number: u32,
    /// Spins left in the promotion after this one
    pub remaining_spins: u32,
}
