use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time::TimestampSeconds;

use super::{SaleError, SaleResult};

/// Lifecycle phase of the crowdsale
///
/// ```text
/// Pending -> Active <-> Paused -> Ended -> Finalized
/// ```
///
/// The phase is never stored: it is derived from the clock and the two flags
/// every time an operation needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    /// now < start_time
    Pending,
    /// start_time <= now < end_time, not paused
    Active,
    /// start_time <= now < end_time, paused
    Paused,
    /// now >= end_time, not finalized
    Ended,
    /// Terminal
    Finalized,
}

impl SalePhase {
    /// Resolve the phase from the clock and the sale flags
    ///
    /// `finalized` wins over everything, then the window bounds, then the pause flag.
    /// A pause set before the window opens only shows once the sale is live.
    pub fn resolve(
        now: TimestampSeconds,
        start_time: TimestampSeconds,
        end_time: TimestampSeconds,
        paused: bool,
        finalized: bool,
    ) -> Self {
        if finalized {
            SalePhase::Finalized
        } else if now >= end_time {
            SalePhase::Ended
        } else if now < start_time {
            SalePhase::Pending
        } else if paused {
            SalePhase::Paused
        } else {
            SalePhase::Active
        }
    }

    /// Purchases are only admitted while the sale is active
    pub fn admit_purchase(self) -> SaleResult<()> {
        match self {
            SalePhase::Active => Ok(()),
            SalePhase::Pending => Err(SaleError::NotStarted),
            SalePhase::Paused => Err(SaleError::Paused),
            SalePhase::Ended => Err(SaleError::AlreadyEnded),
            SalePhase::Finalized => Err(SaleError::Finalized),
        }
    }

    /// Presale orders are only admitted before the window opens
    pub fn admit_presale(self) -> SaleResult<()> {
        match self {
            SalePhase::Pending => Ok(()),
            SalePhase::Finalized => Err(SaleError::Finalized),
            SalePhase::Active | SalePhase::Paused | SalePhase::Ended => {
                Err(SaleError::AlreadyStarted)
            }
        }
    }

    /// Owner configuration is refused once the sale is settled
    pub fn admit_configuration(self) -> SaleResult<()> {
        match self {
            SalePhase::Finalized => Err(SaleError::Finalized),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for SalePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SalePhase::Pending => "pending",
            SalePhase::Active => "active",
            SalePhase::Paused => "paused",
            SalePhase::Ended => "ended",
            SalePhase::Finalized => "finalized",
        };
        f.write_str(name)
    }
}
