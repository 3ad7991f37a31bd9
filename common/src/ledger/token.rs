use indexmap::IndexMap;
use log::{debug, info, trace};

use crate::{
    config::{
        Amount, LEDGER_ADDRESS_LABEL, POOL_ALLOCATIONS, SALE_CAP, TOKEN_DECIMALS, TOKEN_NAME,
        TOKEN_SYMBOL, TOTAL_SUPPLY,
    },
    crypto::{contract_address, Address},
};

use super::{LedgerError, LedgerEvent, LedgerResult, LedgerSnapshot};

/// Fixed-supply token ledger
///
/// The full supply is allocated once at construction: every stakeholder pool
/// receives its fixed amount and the sale reservation is parked on the ledger's
/// own account until the sale engine is linked.
///
/// Holder transfers stay locked until the linked engine enables them, which it
/// only does when the sale is finalized. Approvals are never locked.
///
/// # Invariants
///
/// - `sum(balances) + total_burned == initial_supply`
/// - `total_supply` only decreases, and only through `burn`
/// - `engine` and `transfers_enabled` are each set at most once
#[derive(Debug, Clone)]
pub struct TokenLedger {
    address: Address,
    owner: Address,
    balances: IndexMap<Address, Amount>,
    allowances: IndexMap<(Address, Address), Amount>,
    initial_supply: Amount,
    total_supply: Amount,
    total_burned: Amount,
    transfers_enabled: bool,
    engine: Option<Address>,
    events: Vec<LedgerEvent>,
}

impl TokenLedger {
    /// Create the ledger on behalf of `deployer`, who becomes its owner
    pub fn new(deployer: &Address) -> Self {
        let mut ledger = Self {
            address: contract_address(deployer, LEDGER_ADDRESS_LABEL),
            owner: *deployer,
            balances: IndexMap::new(),
            allowances: IndexMap::new(),
            initial_supply: TOTAL_SUPPLY,
            total_supply: TOTAL_SUPPLY,
            total_burned: 0,
            transfers_enabled: false,
            engine: None,
            events: Vec::new(),
        };
        ledger.allocate();
        ledger
    }

    // Credit every pool and the sale reservation.
    // Only reachable from the constructor.
    fn allocate(&mut self) {
        for (name, account, amount) in POOL_ALLOCATIONS.iter() {
            trace!("allocating {} tokens to {} pool {}", amount, name, account.short());
            self.balances.insert(*account, *amount);
            self.events.push(LedgerEvent::Transfer {
                from: Address::zero(),
                to: *account,
                amount: *amount,
            });
        }

        self.balances.insert(self.address, SALE_CAP);
        self.events.push(LedgerEvent::Transfer {
            from: Address::zero(),
            to: self.address,
            amount: SALE_CAP,
        });

        debug!(
            "ledger {} allocated {} tokens across {} pools",
            self.address.short(),
            self.total_supply,
            POOL_ALLOCATIONS.len() + 1
        );
    }

    // ===== Queries =====

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn name(&self) -> &'static str {
        TOKEN_NAME
    }

    pub fn symbol(&self) -> &'static str {
        TOKEN_SYMBOL
    }

    pub fn decimals(&self) -> u8 {
        TOKEN_DECIMALS
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    pub fn initial_supply(&self) -> Amount {
        self.initial_supply
    }

    pub fn total_burned(&self) -> Amount {
        self.total_burned
    }

    pub fn transfers_enabled(&self) -> bool {
        self.transfers_enabled
    }

    pub fn engine(&self) -> Option<&Address> {
        self.engine.as_ref()
    }

    /// Account holding the sale reservation until the engine is linked
    pub fn reserve_account(&self) -> &Address {
        &self.address
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Every account that has ever held tokens, in first-credit order
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
            address: self.address,
            owner: self.owner,
            engine: self.engine,
            initial_supply: self.initial_supply,
            total_supply: self.total_supply,
            total_burned: self.total_burned,
            transfers_enabled: self.transfers_enabled,
            balances: self
                .balances
                .iter()
                .filter(|(_, amount)| **amount > 0)
                .map(|(account, amount)| (*account, *amount))
                .collect(),
        }
    }

    // ===== Authorization =====

    fn require_owner(&self, caller: &Address) -> LedgerResult<()> {
        if *caller != self.owner {
            return Err(LedgerError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Check that `caller` is the linked engine
    pub fn require_engine(&self, caller: &Address) -> LedgerResult<()> {
        match &self.engine {
            None => Err(LedgerError::NotLinked),
            Some(engine) if engine == caller => Ok(()),
            Some(_) => Err(LedgerError::NotEngine { caller: *caller }),
        }
    }

    // ===== Owner operations =====

    /// Bind the sale engine and hand it the sale reservation
    pub fn link_engine(&mut self, caller: &Address, engine: &Address) -> LedgerResult<()> {
        self.require_owner(caller)?;
        if self.engine.is_some() {
            return Err(LedgerError::EngineAlreadySet);
        }
        if engine.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let holds_allocation = *engine == self.address
            || POOL_ALLOCATIONS.iter().any(|(_, pool, _)| pool == engine);
        if holds_allocation {
            return Err(LedgerError::InvalidEngine { engine: *engine });
        }

        let reserve = self.address;
        let amount = self.balance_of(&reserve);
        self.move_balance(&reserve, engine, amount)?;
        self.engine = Some(*engine);
        self.events.push(LedgerEvent::EngineLinked {
            engine: *engine,
            amount,
        });

        info!(
            "sale engine {} linked to ledger {} with {} tokens",
            engine.short(),
            self.address.short(),
            amount
        );
        Ok(())
    }

    // ===== Holder operations =====

    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        if !self.transfers_enabled {
            return Err(LedgerError::TransferLocked);
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        self.move_balance(caller, to, amount)?;
        debug!("transfer {} from {} to {}", amount, caller.short(), to.short());
        Ok(())
    }

    /// Set the allowance of `spender` over the caller's tokens
    ///
    /// Approvals are accepted while transfers are locked; only spending them is gated.
    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) {
        self.set_allowance(caller, spender, amount);
    }

    pub fn increase_allowance(
        &mut self,
        caller: &Address,
        spender: &Address,
        added: Amount,
    ) -> LedgerResult<Amount> {
        let current = self.allowance(caller, spender);
        let updated = current.checked_add(added).ok_or(LedgerError::Overflow)?;
        self.set_allowance(caller, spender, updated);
        Ok(updated)
    }

    // Saturates at zero
    pub fn decrease_allowance(
        &mut self,
        caller: &Address,
        spender: &Address,
        subtracted: Amount,
    ) -> Amount {
        let updated = self.allowance(caller, spender).saturating_sub(subtracted);
        self.set_allowance(caller, spender, updated);
        updated
    }

    fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) {
        self.allowances.insert((*owner, *spender), amount);
        self.events.push(LedgerEvent::Approval {
            owner: *owner,
            spender: *spender,
            amount,
        });
        trace!(
            "allowance of {} over {} set to {}",
            spender.short(),
            owner.short(),
            amount
        );
    }

    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> LedgerResult<()> {
        if !self.transfers_enabled {
            return Err(LedgerError::TransferLocked);
        }
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let allowed = self.allowance(from, caller);
        if amount > allowed {
            return Err(LedgerError::InsufficientAllowance {
                needed: amount,
                available: allowed,
            });
        }

        self.move_balance(from, to, amount)?;
        // Checked above: amount <= allowed
        self.allowances.insert((*from, *caller), allowed - amount);

        debug!(
            "transfer {} from {} to {} spent by {}",
            amount,
            from.short(),
            to.short(),
            caller.short()
        );
        Ok(())
    }

    // ===== Engine operations =====

    /// Move tokens out of the engine's working balance
    ///
    /// Engine-only; not subject to the transfer lock.
    pub fn distribute(&mut self, caller: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        self.require_engine(caller)?;
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        self.move_balance(caller, to, amount)
    }

    /// Destroy `amount` tokens from the engine's balance
    pub fn burn(&mut self, caller: &Address, amount: Amount) -> LedgerResult<()> {
        self.require_engine(caller)?;

        let available = self.balance_of(caller);
        if amount > available {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available,
            });
        }

        self.balances.insert(*caller, available - amount);
        self.total_supply -= amount;
        self.total_burned += amount;
        self.events.push(LedgerEvent::Burn {
            burner: *caller,
            amount,
        });

        info!(
            "burned {} tokens, total supply is now {}",
            amount, self.total_supply
        );
        Ok(())
    }

    /// Unlock holder transfers, once
    pub fn enable_transfers(&mut self, caller: &Address) -> LedgerResult<()> {
        self.require_engine(caller)?;
        if self.transfers_enabled {
            return Err(LedgerError::TransfersAlreadyEnabled);
        }

        self.transfers_enabled = true;
        self.events.push(LedgerEvent::TransfersEnabled);
        info!("token transfers enabled on ledger {}", self.address.short());
        Ok(())
    }

    // Every check happens before the first write so a failure leaves no trace
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> LedgerResult<()> {
        let from_balance = self.balance_of(from);
        if amount > from_balance {
            return Err(LedgerError::InsufficientFunds {
                needed: amount,
                available: from_balance,
            });
        }

        if from == to {
            self.events.push(LedgerEvent::Transfer {
                from: *from,
                to: *to,
                amount,
            });
            return Ok(());
        }

        let to_balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        self.balances.insert(*from, from_balance - amount);
        self.balances.insert(*to, to_balance);
        self.events.push(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        COIN_VALUE, EXPERTS_POOL_ADDR, EXPERTS_POOL_TOKENS, LEGAL_EXPENSES_ADDR,
        LEGAL_EXPENSES_TOKENS, MARKETING_POOL_ADDR, MARKETING_POOL_TOKENS, RESERVE_POOL_ADDR,
        RESERVE_POOL_TOKENS, TEAM_POOL_ADDR, TEAM_POOL_TOKENS,
    };
    use crate::error::ErrorKind;

    fn owner() -> Address {
        Address::new([1u8; 32])
    }

    fn engine() -> Address {
        Address::new([2u8; 32])
    }

    fn alice() -> Address {
        Address::new([3u8; 32])
    }

    fn bob() -> Address {
        Address::new([4u8; 32])
    }

    fn linked_ledger() -> TokenLedger {
        let mut ledger = TokenLedger::new(&owner());
        ledger.link_engine(&owner(), &engine()).unwrap();
        ledger
    }

    // Linked ledger where alice holds 1000 GDPR
    fn funded_ledger(enable: bool) -> TokenLedger {
        let mut ledger = linked_ledger();
        ledger
            .distribute(&engine(), &alice(), 1_000 * COIN_VALUE)
            .unwrap();
        if enable {
            ledger.enable_transfers(&engine()).unwrap();
        }
        ledger
    }

    #[test]
    fn test_metadata() {
        let ledger = TokenLedger::new(&owner());
        assert_eq!(ledger.name(), "GDPR Cash");
        assert_eq!(ledger.symbol(), "GDPR");
        assert_eq!(ledger.decimals(), 18);
        assert_eq!(ledger.owner(), &owner());
        assert!(!ledger.transfers_enabled());
        assert!(ledger.engine().is_none());
    }

    #[test]
    fn test_construction_allocates_every_pool() {
        let ledger = TokenLedger::new(&owner());
        assert_eq!(ledger.balance_of(&EXPERTS_POOL_ADDR), EXPERTS_POOL_TOKENS);
        assert_eq!(ledger.balance_of(&MARKETING_POOL_ADDR), MARKETING_POOL_TOKENS);
        assert_eq!(ledger.balance_of(&TEAM_POOL_ADDR), TEAM_POOL_TOKENS);
        assert_eq!(ledger.balance_of(&LEGAL_EXPENSES_ADDR), LEGAL_EXPENSES_TOKENS);
        assert_eq!(ledger.balance_of(&RESERVE_POOL_ADDR), RESERVE_POOL_TOKENS);
        assert_eq!(ledger.balance_of(ledger.reserve_account()), SALE_CAP);
        assert_eq!(ledger.total_supply(), TOTAL_SUPPLY);
        assert!(ledger.snapshot().is_conserved());
    }

    #[test]
    fn test_link_engine_moves_reservation() {
        let ledger = linked_ledger();
        assert_eq!(ledger.engine(), Some(&engine()));
        assert_eq!(ledger.balance_of(&engine()), SALE_CAP);
        assert_eq!(ledger.balance_of(ledger.reserve_account()), 0);
        assert!(ledger.snapshot().is_conserved());
    }

    #[test]
    fn test_link_engine_only_owner() {
        let mut ledger = TokenLedger::new(&owner());
        let err = ledger.link_engine(&alice(), &engine()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(ledger.engine().is_none());
    }

    #[test]
    fn test_link_engine_only_once() {
        let mut ledger = linked_ledger();
        let err = ledger.link_engine(&owner(), &bob()).unwrap_err();
        assert_eq!(err, LedgerError::EngineAlreadySet);
        assert_eq!(ledger.engine(), Some(&engine()));
        assert_eq!(ledger.balance_of(&bob()), 0);
    }

    #[test]
    fn test_link_engine_rejects_zero_address() {
        let mut ledger = TokenLedger::new(&owner());
        assert_eq!(
            ledger.link_engine(&owner(), &Address::zero()),
            Err(LedgerError::ZeroAddress)
        );
    }

    #[test]
    fn test_link_engine_rejects_allocation_holders() {
        let mut ledger = TokenLedger::new(&owner());
        let reserve = *ledger.reserve_account();
        for candidate in [reserve, TEAM_POOL_ADDR, RESERVE_POOL_ADDR, EXPERTS_POOL_ADDR] {
            let err = ledger.link_engine(&owner(), &candidate).unwrap_err();
            assert_eq!(err, LedgerError::InvalidEngine { engine: candidate });
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
        assert!(ledger.engine().is_none());
        assert_eq!(ledger.balance_of(&TEAM_POOL_ADDR), TEAM_POOL_TOKENS);
        assert_eq!(ledger.balance_of(&reserve), SALE_CAP);

        ledger.link_engine(&owner(), &engine()).unwrap();
    }

    #[test]
    fn test_transfer_locked_before_enable() {
        let mut ledger = funded_ledger(false);
        let err = ledger.transfer(&alice(), &bob(), 5).unwrap_err();
        assert_eq!(err, LedgerError::TransferLocked);
        assert_eq!(ledger.balance_of(&bob()), 0);

        // Pools are locked too
        let err = ledger
            .transfer(&TEAM_POOL_ADDR, &bob(), COIN_VALUE)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TransferLocked);
    }

    #[test]
    fn test_transfer_after_enable() {
        let mut ledger = funded_ledger(true);
        ledger.transfer(&alice(), &bob(), 10).unwrap();
        assert_eq!(ledger.balance_of(&bob()), 10);
        assert_eq!(ledger.balance_of(&alice()), 1_000 * COIN_VALUE - 10);
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let mut ledger = funded_ledger(true);
        let err = ledger
            .transfer(&alice(), &bob(), 1_000 * COIN_VALUE + 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.balance_of(&alice()), 1_000 * COIN_VALUE);
    }

    #[test]
    fn test_transfer_to_zero_address_rejected() {
        let mut ledger = funded_ledger(true);
        assert_eq!(
            ledger.transfer(&alice(), &Address::zero(), 1),
            Err(LedgerError::ZeroAddress)
        );
    }

    #[test]
    fn test_self_transfer_keeps_balance() {
        let mut ledger = funded_ledger(true);
        ledger.transfer(&alice(), &alice(), 100).unwrap();
        assert_eq!(ledger.balance_of(&alice()), 1_000 * COIN_VALUE);
    }

    #[test]
    fn test_approve_allowed_while_locked() {
        let mut ledger = funded_ledger(false);
        ledger.approve(&alice(), &bob(), 50);
        assert_eq!(ledger.allowance(&alice(), &bob()), 50);

        let err = ledger
            .transfer_from(&bob(), &alice(), &bob(), 10)
            .unwrap_err();
        assert_eq!(err, LedgerError::TransferLocked);
        assert_eq!(ledger.allowance(&alice(), &bob()), 50);
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let middleman = Address::new([9u8; 32]);
        let mut ledger = funded_ledger(true);
        ledger.approve(&alice(), &middleman, 10);

        let err = ledger
            .transfer_from(&middleman, &alice(), &bob(), 11)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientAllowance);

        ledger
            .transfer_from(&middleman, &alice(), &bob(), 10)
            .unwrap();
        assert_eq!(ledger.balance_of(&bob()), 10);
        assert_eq!(ledger.allowance(&alice(), &middleman), 0);
    }

    #[test]
    fn test_transfer_from_insufficient_funds_keeps_allowance() {
        let mut ledger = funded_ledger(true);
        ledger.approve(&bob(), &alice(), 100);
        let err = ledger
            .transfer_from(&alice(), &bob(), &alice(), 100)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.allowance(&bob(), &alice()), 100);
    }

    #[test]
    fn test_allowance_adjustments() {
        let mut ledger = TokenLedger::new(&owner());
        assert_eq!(ledger.increase_allowance(&alice(), &bob(), 30), Ok(30));
        assert_eq!(ledger.increase_allowance(&alice(), &bob(), 20), Ok(50));
        assert_eq!(ledger.decrease_allowance(&alice(), &bob(), 80), 0);

        ledger.approve(&alice(), &bob(), Amount::MAX);
        assert_eq!(
            ledger.increase_allowance(&alice(), &bob(), 1),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn test_burn_only_engine() {
        let mut ledger = linked_ledger();
        let err = ledger.burn(&owner(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let mut unlinked = TokenLedger::new(&owner());
        assert_eq!(unlinked.burn(&engine(), 1), Err(LedgerError::NotLinked));
    }

    #[test]
    fn test_burn_reduces_supply() {
        let mut ledger = linked_ledger();
        ledger.burn(&engine(), SALE_CAP).unwrap();
        assert_eq!(ledger.balance_of(&engine()), 0);
        assert_eq!(ledger.total_supply(), TOTAL_SUPPLY - SALE_CAP);
        assert_eq!(ledger.total_burned(), SALE_CAP);
        assert!(ledger.snapshot().is_conserved());

        let err = ledger.burn(&engine(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
    }

    #[test]
    fn test_enable_transfers_once() {
        let mut ledger = linked_ledger();
        assert_eq!(
            ledger.enable_transfers(&alice()).unwrap_err().kind(),
            ErrorKind::Unauthorized
        );
        ledger.enable_transfers(&engine()).unwrap();
        assert!(ledger.transfers_enabled());
        assert_eq!(
            ledger.enable_transfers(&engine()),
            Err(LedgerError::TransfersAlreadyEnabled)
        );
    }

    #[test]
    fn test_distribute_requires_engine() {
        let mut ledger = linked_ledger();
        let err = ledger.distribute(&owner(), &alice(), 1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        let err = ledger
            .distribute(&engine(), &alice(), SALE_CAP + 1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientFunds);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }

    #[test]
    fn test_events_and_snapshot() {
        let mut ledger = funded_ledger(true);
        ledger.drain_events();
        ledger.transfer(&alice(), &bob(), 7).unwrap();
        assert_eq!(
            ledger.drain_events(),
            vec![LedgerEvent::Transfer {
                from: alice(),
                to: bob(),
                amount: 7
            }]
        );
        assert!(ledger.events().is_empty());

        let snapshot = ledger.snapshot();
        assert!(snapshot.is_conserved());
        assert!(!snapshot.balances.contains_key(ledger.reserve_account()));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"transfersEnabled\":true"));
    }
}
