//! Ledger Types
//!
//! Events emitted by the ledger and the serializable snapshot of its state.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{config::Amount, crypto::Address};

/// Record of a successful ledger mutation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    Burn {
        burner: Address,
        amount: Amount,
    },
    EngineLinked {
        engine: Address,
        amount: Amount,
    },
    TransfersEnabled,
}

/// Point-in-time view of the ledger
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub address: Address,
    pub owner: Address,
    pub engine: Option<Address>,
    pub initial_supply: Amount,
    pub total_supply: Amount,
    pub total_burned: Amount,
    pub transfers_enabled: bool,
    /// Non-zero balances in first-credit order
    pub balances: IndexMap<Address, Amount>,
}

impl LedgerSnapshot {
    /// Sum of every balance in the snapshot
    pub fn circulating(&self) -> Amount {
        self.balances.values().sum()
    }

    /// Conservation check: balances plus burned tokens equal the initial supply
    pub fn is_conserved(&self) -> bool {
        self.circulating()
            .checked_add(self.total_burned)
            == Some(self.initial_supply)
    }
}
