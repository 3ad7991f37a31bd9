//! Presale registry
//!
//! Owner-granted token credits issued before the sale window opens. Presale
//! orders bypass the rate and both purchaser caps, and do not count towards a
//! buyer's cumulative purchases.

use log::debug;

use crate::{config::Amount, context::CallContext, crypto::Address, ledger::TokenLedger};

use super::{PresaleOrder, SaleEngine, SaleError, SaleEvent, SaleResult};

impl SaleEngine {
    /// Credit `tokens` to `buyer` out of the sale reservation
    ///
    /// The window check comes first: once the sale has started the call fails
    /// with a phase error whoever the caller is.
    pub fn add_presale_order(
        &mut self,
        call: &CallContext,
        buyer: &Address,
        tokens: Amount,
        ledger: &mut TokenLedger,
    ) -> SaleResult<()> {
        self.phase(call.now).admit_presale()?;
        self.require_owner(call)?;
        if buyer.is_zero() {
            return Err(SaleError::ZeroAddress);
        }
        self.require_link(ledger)?;
        let total_presold = self
            .total_presold
            .checked_add(tokens)
            .ok_or(SaleError::Overflow)?;

        ledger.distribute(self.address(), buyer, tokens)?;
        self.total_presold = total_presold;
        self.presale_orders.push(PresaleOrder {
            buyer: *buyer,
            tokens,
            ordered_at: call.now,
        });
        self.events.push(SaleEvent::PresaleOrder {
            buyer: *buyer,
            tokens,
        });

        debug!("presale order of {} tokens for {}", tokens, buyer.short());
        Ok(())
    }

    pub fn presale_orders(&self) -> &[PresaleOrder] {
        &self.presale_orders
    }

    pub fn total_presold(&self) -> Amount {
        self.total_presold
    }
}
