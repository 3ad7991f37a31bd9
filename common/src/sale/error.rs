//! Crowdsale Error Codes
//!
//! Range: 0x0300 - 0x03FF
//! Format: SALE_ERROR_<CATEGORY>_<SPECIFIC>

use thiserror::Error;

use crate::{
    config::{Amount, ConfigError},
    crypto::Address,
    error::ErrorKind,
    ledger::LedgerError,
    time::TimestampSeconds,
};

// ===== Authorization Errors (0x0300 - 0x030F) =====

pub const SALE_ERROR_UNAUTHORIZED: u64 = 0x0300;

// ===== Phase Errors (0x0310 - 0x031F) =====

pub const SALE_ERROR_NOT_STARTED: u64 = 0x0310;
pub const SALE_ERROR_ALREADY_STARTED: u64 = 0x0311;
pub const SALE_ERROR_ALREADY_ENDED: u64 = 0x0312;
pub const SALE_ERROR_NOT_ENDED: u64 = 0x0313;
pub const SALE_ERROR_PAUSED: u64 = 0x0314;
pub const SALE_ERROR_NOT_PAUSED: u64 = 0x0315;
pub const SALE_ERROR_ALREADY_PAUSED: u64 = 0x0316;
pub const SALE_ERROR_FINALIZED: u64 = 0x0317;
pub const SALE_ERROR_INVALID_START_TIME: u64 = 0x0318;
pub const SALE_ERROR_INVALID_END_TIME: u64 = 0x0319;

// ===== Cap Errors (0x0320 - 0x032F) =====

pub const SALE_ERROR_BELOW_MINIMUM_CAP: u64 = 0x0320;
pub const SALE_ERROR_ABOVE_MAXIMUM_CAP: u64 = 0x0321;
pub const SALE_ERROR_CONTRIBUTION_OVERFLOW: u64 = 0x0322;

// ===== Settlement Errors (0x0330 - 0x033F) =====

pub const SALE_ERROR_INSUFFICIENT_FUNDS: u64 = 0x0330;
pub const SALE_ERROR_ALREADY_FINALIZED: u64 = 0x0331;
pub const SALE_ERROR_NOT_LINKED: u64 = 0x0332;
pub const SALE_ERROR_LEDGER_MISMATCH: u64 = 0x0333;

// ===== Validation Errors (0x0340 - 0x034F) =====

pub const SALE_ERROR_ZERO_RATE: u64 = 0x0340;
pub const SALE_ERROR_ZERO_ADDRESS: u64 = 0x0341;
pub const SALE_ERROR_OVERFLOW: u64 = 0x0342;
pub const SALE_ERROR_INVALID_CONFIG: u64 = 0x0343;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SaleError {
    #[error("Caller {caller} is not the sale owner")]
    Unauthorized { caller: Address },

    #[error("Sale has not started yet")]
    NotStarted,

    #[error("Sale has already started")]
    AlreadyStarted,

    #[error("Sale has already ended")]
    AlreadyEnded,

    #[error("Sale has not ended yet")]
    NotEnded,

    #[error("Sale is paused")]
    Paused,

    #[error("Sale is not paused")]
    NotPaused,

    #[error("Sale is already paused")]
    AlreadyPaused,

    #[error("Sale is finalized")]
    Finalized,

    #[error("Invalid start time {requested}: must be >= {now} and < end time {end}")]
    InvalidStartTime {
        requested: TimestampSeconds,
        now: TimestampSeconds,
        end: TimestampSeconds,
    },

    #[error("Invalid end time {requested}: must be > {now} and > start time {start}")]
    InvalidEndTime {
        requested: TimestampSeconds,
        now: TimestampSeconds,
        start: TimestampSeconds,
    },

    #[error("Contribution of {tokens} tokens is below the minimum of {min}")]
    BelowMinimumCap { tokens: Amount, min: Amount },

    #[error("Cumulative purchase of {total} tokens exceeds the maximum of {max}")]
    AboveMaximumCap { total: Amount, max: Amount },

    #[error("Contribution of {value} at rate {rate} overflows")]
    ContributionOverflow { value: Amount, rate: Amount },

    #[error("Insufficient sale tokens: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("Sale is already finalized")]
    AlreadyFinalized,

    #[error("Sale engine is not linked to the ledger")]
    NotLinked,

    #[error("Ledger {actual} is not the ledger {expected} this sale was created for")]
    LedgerMismatch { expected: Address, actual: Address },

    #[error("Rate must be positive")]
    ZeroRate,

    #[error("Zero address is not a valid beneficiary")]
    ZeroAddress,

    #[error("Value balance overflow")]
    Overflow,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

impl SaleError {
    /// Position of the error in the shared taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotStarted
            | Self::AlreadyStarted
            | Self::AlreadyEnded
            | Self::NotEnded
            | Self::Paused
            | Self::NotPaused
            | Self::AlreadyPaused
            | Self::Finalized
            | Self::InvalidStartTime { .. }
            | Self::InvalidEndTime { .. } => ErrorKind::InvalidState,
            Self::BelowMinimumCap { .. }
            | Self::AboveMaximumCap { .. }
            | Self::ContributionOverflow { .. } => ErrorKind::CapViolation,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::AlreadyFinalized => ErrorKind::AlreadySet,
            Self::NotLinked => ErrorKind::NotLinked,
            Self::LedgerMismatch { .. }
            | Self::ZeroRate
            | Self::ZeroAddress
            | Self::Overflow
            | Self::Config(_) => ErrorKind::InvalidArgument,
            Self::Ledger(e) => e.kind(),
        }
    }

    /// Convert error to u64 error code
    ///
    /// Wrapped ledger errors keep their own code.
    pub fn to_code(&self) -> u64 {
        match self {
            Self::Unauthorized { .. } => SALE_ERROR_UNAUTHORIZED,
            Self::NotStarted => SALE_ERROR_NOT_STARTED,
            Self::AlreadyStarted => SALE_ERROR_ALREADY_STARTED,
            Self::AlreadyEnded => SALE_ERROR_ALREADY_ENDED,
            Self::NotEnded => SALE_ERROR_NOT_ENDED,
            Self::Paused => SALE_ERROR_PAUSED,
            Self::NotPaused => SALE_ERROR_NOT_PAUSED,
            Self::AlreadyPaused => SALE_ERROR_ALREADY_PAUSED,
            Self::Finalized => SALE_ERROR_FINALIZED,
            Self::InvalidStartTime { .. } => SALE_ERROR_INVALID_START_TIME,
            Self::InvalidEndTime { .. } => SALE_ERROR_INVALID_END_TIME,
            Self::BelowMinimumCap { .. } => SALE_ERROR_BELOW_MINIMUM_CAP,
            Self::AboveMaximumCap { .. } => SALE_ERROR_ABOVE_MAXIMUM_CAP,
            Self::ContributionOverflow { .. } => SALE_ERROR_CONTRIBUTION_OVERFLOW,
            Self::InsufficientFunds { .. } => SALE_ERROR_INSUFFICIENT_FUNDS,
            Self::AlreadyFinalized => SALE_ERROR_ALREADY_FINALIZED,
            Self::NotLinked => SALE_ERROR_NOT_LINKED,
            Self::LedgerMismatch { .. } => SALE_ERROR_LEDGER_MISMATCH,
            Self::ZeroRate => SALE_ERROR_ZERO_RATE,
            Self::ZeroAddress => SALE_ERROR_ZERO_ADDRESS,
            Self::Overflow => SALE_ERROR_OVERFLOW,
            Self::Config(_) => SALE_ERROR_INVALID_CONFIG,
            Self::Ledger(e) => e.to_code(),
        }
    }
}

/// Result type for crowdsale operations
pub type SaleResult<T> = Result<T, SaleError>;
