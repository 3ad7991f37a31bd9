use indexmap::IndexMap;
use log::trace;

use crate::{config::Amount, crypto::Address};

use super::{SaleError, SaleResult};

/// Native value held on behalf of accounts
///
/// Value arrives with every purchase and is credited to the engine; at
/// finalization the engine's whole balance is swept to the beneficiary.
#[derive(Debug, Clone, Default)]
pub struct ValueVault {
    balances: IndexMap<Address, Amount>,
}

impl ValueVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Balance after a deposit of `amount`, without applying it
    pub fn preview_deposit(&self, account: &Address, amount: Amount) -> SaleResult<Amount> {
        self.balance_of(account)
            .checked_add(amount)
            .ok_or(SaleError::Overflow)
    }

    pub fn deposit(&mut self, account: &Address, amount: Amount) -> SaleResult<Amount> {
        let updated = self.preview_deposit(account, amount)?;
        self.balances.insert(*account, updated);
        trace!("vault credited {} to {}", amount, account.short());
        Ok(updated)
    }

    /// Move the whole balance of `from` to `to`, returning the amount moved
    pub fn sweep(&mut self, from: &Address, to: &Address) -> SaleResult<Amount> {
        let amount = self.balance_of(from);
        if from == to {
            return Ok(amount);
        }
        let credited = self.preview_deposit(to, amount)?;

        self.balances.insert(*from, 0);
        self.balances.insert(*to, credited);
        trace!(
            "vault swept {} from {} to {}",
            amount,
            from.short(),
            to.short()
        );
        Ok(amount)
    }
}
