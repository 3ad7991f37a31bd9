use log::info;

use crate::{
    config::{Amount, SaleConfig},
    context::CallContext,
    crypto::Address,
    ledger::{LedgerEvent, LedgerResult, TokenLedger},
    sale::{SaleEngine, SaleEvent, SaleResult, Settlement},
};

/// One ledger and its crowdsale, wired together
///
/// Every operation takes `&mut self`, so a deployment is a single writer:
/// operations run one at a time to completion. Hosts that share a deployment
/// across threads must wrap it in a single lock.
#[derive(Debug, Clone)]
pub struct Deployment {
    ledger: TokenLedger,
    sale: SaleEngine,
}

impl Deployment {
    /// Create the ledger and the engine without linking them
    pub fn unlinked(deployer: &Address, config: SaleConfig) -> SaleResult<Self> {
        let ledger = TokenLedger::new(deployer);
        let sale = SaleEngine::new(deployer, ledger.address(), config)?;
        Ok(Self { ledger, sale })
    }

    /// Create the ledger and the engine, then link them
    pub fn deploy(deployer: &Address, config: SaleConfig) -> SaleResult<Self> {
        let mut deployment = Self::unlinked(deployer, config)?;
        deployment.link(deployer)?;
        info!(
            "deployed ledger {} with crowdsale {}",
            deployment.ledger.address().short(),
            deployment.sale.address().short()
        );
        Ok(deployment)
    }

    /// Link the engine into the ledger; ledger owner only, once
    pub fn link(&mut self, caller: &Address) -> LedgerResult<()> {
        self.ledger.link_engine(caller, self.sale.address())
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn sale(&self) -> &SaleEngine {
        &self.sale
    }

    // ===== Crowdsale operations =====

    pub fn set_start_time(&mut self, call: &CallContext, start_time: u64) -> SaleResult<()> {
        self.sale.set_start_time(call, start_time)
    }

    pub fn set_end_time(&mut self, call: &CallContext, end_time: u64) -> SaleResult<()> {
        self.sale.set_end_time(call, end_time)
    }

    pub fn set_rate(&mut self, call: &CallContext, rate: Amount) -> SaleResult<()> {
        self.sale.set_rate(call, rate)
    }

    pub fn pause(&mut self, call: &CallContext) -> SaleResult<()> {
        self.sale.pause(call)
    }

    pub fn unpause(&mut self, call: &CallContext) -> SaleResult<()> {
        self.sale.unpause(call)
    }

    pub fn add_presale_order(
        &mut self,
        call: &CallContext,
        buyer: &Address,
        tokens: Amount,
    ) -> SaleResult<()> {
        self.sale
            .add_presale_order(call, buyer, tokens, &mut self.ledger)
    }

    pub fn purchase(&mut self, call: &CallContext, value: Amount) -> SaleResult<Amount> {
        self.sale.purchase(call, value, &mut self.ledger)
    }

    pub fn buy_tokens(
        &mut self,
        call: &CallContext,
        beneficiary: &Address,
        value: Amount,
    ) -> SaleResult<Amount> {
        self.sale
            .buy_tokens(call, beneficiary, value, &mut self.ledger)
    }

    pub fn finalize(&mut self, call: &CallContext) -> SaleResult<Settlement> {
        self.sale.finalize(call, &mut self.ledger)
    }

    // ===== Ledger operations =====

    pub fn transfer(&mut self, call: &CallContext, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.ledger.transfer(&call.caller, to, amount)
    }

    pub fn approve(&mut self, call: &CallContext, spender: &Address, amount: Amount) {
        self.ledger.approve(&call.caller, spender, amount)
    }

    pub fn transfer_from(
        &mut self,
        call: &CallContext,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        self.ledger.transfer_from(&call.caller, from, to, amount)
    }

    /// Value held by `account`: the engine's collected proceeds or the beneficiary's sweep
    pub fn value_balance_of(&self, account: &Address) -> Amount {
        self.sale.value_balance_of(account)
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.ledger.balance_of(account)
    }

    // ===== Events =====

    /// Take every event recorded by the ledger since the last drain
    pub fn drain_ledger_events(&mut self) -> Vec<LedgerEvent> {
        self.ledger.drain_events()
    }

    /// Take every event recorded by the crowdsale since the last drain
    pub fn drain_sale_events(&mut self) -> Vec<SaleEvent> {
        self.sale.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SALE_CAP, SALE_FUNDS_ADDR};
    use crate::error::ErrorKind;

    fn deployer() -> Address {
        Address::new([1u8; 32])
    }

    #[test]
    fn test_deploy_links_engine() {
        let deployment = Deployment::deploy(&deployer(), SaleConfig::new(100, 200)).unwrap();
        let ledger = deployment.ledger();
        assert_eq!(ledger.engine(), Some(deployment.sale().address()));
        assert_eq!(deployment.balance_of(deployment.sale().address()), SALE_CAP);
        assert_eq!(deployment.sale().owner(), ledger.owner());
        assert_eq!(deployment.sale().ledger(), ledger.address());
    }

    #[test]
    fn test_link_is_one_time() {
        let mut deployment = Deployment::unlinked(&deployer(), SaleConfig::new(100, 200)).unwrap();
        let stranger = Address::new([2u8; 32]);
        assert_eq!(
            deployment.link(&stranger).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        deployment.link(&deployer()).unwrap();
        assert_eq!(
            deployment.link(&deployer()).unwrap_err().kind(),
            ErrorKind::AlreadySet
        );
    }

    #[test]
    fn test_unlinked_operations_fail_with_not_linked() {
        let mut deployment = Deployment::unlinked(&deployer(), SaleConfig::new(100, 200)).unwrap();
        let buyer = CallContext::new(Address::new([3u8; 32]), 150);
        assert_eq!(
            deployment.purchase(&buyer, 1_000_000_000_000_000_000).unwrap_err().kind(),
            ErrorKind::NotLinked
        );
        let owner = CallContext::new(deployer(), 250);
        assert_eq!(deployment.finalize(&owner).unwrap_err().kind(), ErrorKind::NotLinked);
        assert_eq!(deployment.value_balance_of(&SALE_FUNDS_ADDR), 0);
    }
}
