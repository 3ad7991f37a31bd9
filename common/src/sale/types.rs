use serde::{Deserialize, Serialize};

use crate::{config::Amount, crypto::Address, time::TimestampSeconds};

/// Record of a successful crowdsale operation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SaleEvent {
    TokenPurchase {
        purchaser: Address,
        beneficiary: Address,
        value: Amount,
        tokens: Amount,
    },
    PresaleOrder {
        buyer: Address,
        tokens: Amount,
    },
    Pause,
    Unpause,
    RateChanged {
        old: Amount,
        new: Amount,
    },
    StartTimeChanged {
        old: TimestampSeconds,
        new: TimestampSeconds,
    },
    EndTimeChanged {
        old: TimestampSeconds,
        new: TimestampSeconds,
    },
    Finalized {
        burned: Amount,
        swept: Amount,
        beneficiary: Address,
    },
}

/// Owner-granted credit issued before the sale opens
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresaleOrder {
    pub buyer: Address,
    pub tokens: Amount,
    pub ordered_at: TimestampSeconds,
}

/// Outcome of a successful finalization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    /// Unsold tokens destroyed
    pub burned: Amount,
    /// Collected value moved to the beneficiary
    pub swept: Amount,
    pub beneficiary: Address,
}
