//! Ledger Error Codes
//!
//! Range: 0x0100 - 0x01FF
//! Format: LEDGER_ERROR_<SPECIFIC>

use thiserror::Error;

use crate::{config::Amount, crypto::Address, error::ErrorKind};

pub const LEDGER_ERROR_UNAUTHORIZED: u64 = 0x0100;
pub const LEDGER_ERROR_NOT_ENGINE: u64 = 0x0101;
pub const LEDGER_ERROR_ENGINE_ALREADY_SET: u64 = 0x0102;
pub const LEDGER_ERROR_TRANSFERS_ALREADY_ENABLED: u64 = 0x0103;
pub const LEDGER_ERROR_NOT_LINKED: u64 = 0x0104;
pub const LEDGER_ERROR_TRANSFER_LOCKED: u64 = 0x0110;
pub const LEDGER_ERROR_INSUFFICIENT_FUNDS: u64 = 0x0111;
pub const LEDGER_ERROR_INSUFFICIENT_ALLOWANCE: u64 = 0x0112;
pub const LEDGER_ERROR_ZERO_ADDRESS: u64 = 0x0120;
pub const LEDGER_ERROR_OVERFLOW: u64 = 0x0121;
pub const LEDGER_ERROR_INVALID_ENGINE: u64 = 0x0122;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    /// Owner-only operation invoked by someone else
    #[error("Caller {caller} is not the ledger owner")]
    Unauthorized { caller: Address },

    /// Engine-only operation invoked by someone else
    #[error("Caller {caller} is not the linked sale engine")]
    NotEngine { caller: Address },

    #[error("Sale engine is already linked")]
    EngineAlreadySet,

    #[error("Transfers are already enabled")]
    TransfersAlreadyEnabled,

    #[error("No sale engine is linked to the ledger")]
    NotLinked,

    #[error("Token transfers are locked until the sale is finalized")]
    TransferLocked,

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    #[error("Insufficient allowance: need {needed}, have {available}")]
    InsufficientAllowance { needed: Amount, available: Amount },

    #[error("Zero address is not a valid target")]
    ZeroAddress,

    #[error("Balance overflow")]
    Overflow,

    /// A pool or the ledger's own reserve cannot act as the sale engine
    #[error("Address {engine} holds an allocation and cannot be linked as the sale engine")]
    InvalidEngine { engine: Address },
}

impl LedgerError {
    /// Position of the error in the shared taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } | Self::NotEngine { .. } => ErrorKind::Unauthorized,
            Self::EngineAlreadySet | Self::TransfersAlreadyEnabled => ErrorKind::AlreadySet,
            Self::NotLinked => ErrorKind::NotLinked,
            Self::TransferLocked => ErrorKind::TransferLocked,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::InsufficientAllowance { .. } => ErrorKind::InsufficientAllowance,
            Self::ZeroAddress | Self::Overflow | Self::InvalidEngine { .. } => {
                ErrorKind::InvalidArgument
            }
        }
    }

    /// Convert error to u64 error code
    pub fn to_code(&self) -> u64 {
        match self {
            Self::Unauthorized { .. } => LEDGER_ERROR_UNAUTHORIZED,
            Self::NotEngine { .. } => LEDGER_ERROR_NOT_ENGINE,
            Self::EngineAlreadySet => LEDGER_ERROR_ENGINE_ALREADY_SET,
            Self::TransfersAlreadyEnabled => LEDGER_ERROR_TRANSFERS_ALREADY_ENABLED,
            Self::NotLinked => LEDGER_ERROR_NOT_LINKED,
            Self::TransferLocked => LEDGER_ERROR_TRANSFER_LOCKED,
            Self::InsufficientFunds { .. } => LEDGER_ERROR_INSUFFICIENT_FUNDS,
            Self::InsufficientAllowance { .. } => LEDGER_ERROR_INSUFFICIENT_ALLOWANCE,
            Self::ZeroAddress => LEDGER_ERROR_ZERO_ADDRESS,
            Self::Overflow => LEDGER_ERROR_OVERFLOW,
            Self::InvalidEngine { .. } => LEDGER_ERROR_INVALID_ENGINE,
        }
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
