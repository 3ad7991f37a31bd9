use serde::{Deserialize, Serialize};
use std::fmt;

/// Error taxonomy shared by the ledger and the sale engine
///
/// Every component error maps onto exactly one kind so hosts can decide
/// how to report a failure without matching on component variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Caller is not the owner, or not the linked engine
    Unauthorized,
    /// Operation not admissible in the current phase
    InvalidState,
    /// Contribution below the minimum or above the cumulative tier maximum
    CapViolation,
    /// Debit exceeds the available balance
    InsufficientFunds,
    /// transferFrom exceeds the granted allowance
    InsufficientAllowance,
    /// One-time operation invoked again
    AlreadySet,
    /// Holder transfers before the sale is finalized
    TransferLocked,
    /// Operation requires the engine link which is absent
    NotLinked,
    /// Malformed argument (zero address, zero rate, overflow)
    InvalidArgument,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidState => "invalid state",
            Self::CapViolation => "cap violation",
            Self::InsufficientFunds => "insufficient funds",
            Self::InsufficientAllowance => "insufficient allowance",
            Self::AlreadySet => "already set",
            Self::TransferLocked => "transfer locked",
            Self::NotLinked => "not linked",
            Self::InvalidArgument => "invalid argument",
        };
        f.write_str(name)
    }
}
