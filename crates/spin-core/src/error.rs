//! Error types for the promotion engine

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PromoError {
    /// Ticket code not found. Terminal for the request, no state touched.
    #[error("Invalid ticket code")]
    UnknownTicket,

    /// Ticket was already redeemed. Terminal for the request.
    #[error("Ticket has already been used")]
    AlreadyRedeemed,

    /// The global spin budget is exhausted (or the spin number fell outside
    /// every configured range).
    #[error("Promotion has ended")]
    PromotionEnded,

    /// Optimistic commit validation failed. Benign contention; retried at the
    /// commit boundary and only surfaced once the retry budget is spent.
    #[error("Transaction conflict")]
    Conflict,

    /// The store could not complete the request. The commit may or may not
    /// have applied.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// The store has no promotion state to serve.
    #[error("System not initialized")]
    NotInitialized,

    /// Ticket code rejected during registration.
    #[error("Invalid ticket code format: {0:?}")]
    MalformedCode(String),

    /// Registration batch contained codes that already exist.
    #[error("Duplicate tickets found: {}", .0.join(", "))]
    DuplicateTickets(Vec<String>),

    /// Static configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias
pub type PromoResult<T> = Result<T, PromoError>;
