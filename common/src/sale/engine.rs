use indexmap::IndexMap;
use log::{debug, info, trace, warn};

use crate::{
    config::{
        Amount, SaleConfig, DAY_ONE_DURATION, PURCHASER_MAX_TOKEN_CAP,
        PURCHASER_MAX_TOKEN_CAP_DAY1, PURCHASER_MIN_TOKEN_CAP, SALE_ADDRESS_LABEL,
        SALE_FUNDS_ADDR,
    },
    context::CallContext,
    crypto::{contract_address, Address},
    ledger::{LedgerError, TokenLedger},
    time::TimestampSeconds,
};

use super::{PresaleOrder, SaleError, SaleEvent, SalePhase, SaleResult, Settlement, ValueVault};

/// Time-boxed crowdsale converting value into GDPR tokens
///
/// The engine owns the sale reservation once the ledger links it, and is the
/// only principal allowed to move tokens out of it or burn what is left.
///
/// # Security Invariants
///
/// Every operation validates all of its preconditions before the first write,
/// on the engine and on the ledger alike. A failed call leaves no trace.
///
/// `purchased` only counts tokens bought through `buy_tokens`; presale orders
/// and pool allocations never count against a purchaser's caps.
#[derive(Debug, Clone)]
pub struct SaleEngine {
    address: Address,
    owner: Address,
    ledger: Address,
    start_time: TimestampSeconds,
    end_time: TimestampSeconds,
    rate: Amount,
    paused: bool,
    finalized: bool,
    purchased: IndexMap<Address, Amount>,
    tokens_sold: Amount,
    vault: ValueVault,
    pub(super) presale_orders: Vec<PresaleOrder>,
    pub(super) total_presold: Amount,
    pub(super) events: Vec<SaleEvent>,
}

impl SaleEngine {
    /// Create the engine on behalf of `deployer`, who becomes its owner
    ///
    /// The engine cannot sell anything until the ledger owner links it.
    pub fn new(deployer: &Address, ledger: &Address, config: SaleConfig) -> SaleResult<Self> {
        config.validate()?;

        let engine = Self {
            address: contract_address(deployer, SALE_ADDRESS_LABEL),
            owner: *deployer,
            ledger: *ledger,
            start_time: config.start_time,
            end_time: config.end_time,
            rate: config.rate,
            paused: false,
            finalized: false,
            purchased: IndexMap::new(),
            tokens_sold: 0,
            vault: ValueVault::new(),
            presale_orders: Vec::new(),
            total_presold: 0,
            events: Vec::new(),
        };

        info!(
            "crowdsale {} created for ledger {}: window [{}, {}), rate {}",
            engine.address.short(),
            ledger.short(),
            engine.start_time,
            engine.end_time,
            engine.rate
        );
        Ok(engine)
    }

    // ===== Queries =====

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn ledger(&self) -> &Address {
        &self.ledger
    }

    pub fn start_time(&self) -> TimestampSeconds {
        self.start_time
    }

    pub fn end_time(&self) -> TimestampSeconds {
        self.end_time
    }

    pub fn rate(&self) -> Amount {
        self.rate
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn has_ended(&self, now: TimestampSeconds) -> bool {
        now >= self.end_time
    }

    pub fn phase(&self, now: TimestampSeconds) -> SalePhase {
        SalePhase::resolve(
            now,
            self.start_time,
            self.end_time,
            self.paused,
            self.finalized,
        )
    }

    /// First instant after day one
    pub fn day_one_cutoff(&self) -> TimestampSeconds {
        self.start_time.saturating_add(DAY_ONE_DURATION)
    }

    /// Maximum cumulative purchase per purchaser at `now`
    pub fn max_cap_at(&self, now: TimestampSeconds) -> Amount {
        if now < self.day_one_cutoff() {
            PURCHASER_MAX_TOKEN_CAP_DAY1
        } else {
            PURCHASER_MAX_TOKEN_CAP
        }
    }

    pub fn min_cap(&self) -> Amount {
        PURCHASER_MIN_TOKEN_CAP
    }

    /// Tokens bought through the sale by `account`
    pub fn purchased_of(&self, account: &Address) -> Amount {
        self.purchased.get(account).copied().unwrap_or(0)
    }

    pub fn tokens_sold(&self) -> Amount {
        self.tokens_sold
    }

    /// Value currently held by the engine
    pub fn collected_value(&self) -> Amount {
        self.vault.balance_of(&self.address)
    }

    pub fn value_balance_of(&self, account: &Address) -> Amount {
        self.vault.balance_of(account)
    }

    pub fn beneficiary(&self) -> &'static Address {
        &SALE_FUNDS_ADDR
    }

    pub fn events(&self) -> &[SaleEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<SaleEvent> {
        std::mem::take(&mut self.events)
    }

    // ===== Admission =====

    /// Shared owner predicate for every owner-only operation
    pub(super) fn require_owner(&self, call: &CallContext) -> SaleResult<()> {
        if call.caller != self.owner {
            return Err(SaleError::Unauthorized {
                caller: call.caller,
            });
        }
        Ok(())
    }

    /// Check that `ledger` is ours and that it has linked this engine
    pub(super) fn require_link(&self, ledger: &TokenLedger) -> SaleResult<()> {
        if ledger.address() != &self.ledger {
            return Err(SaleError::LedgerMismatch {
                expected: self.ledger,
                actual: *ledger.address(),
            });
        }
        match ledger.engine() {
            None => Err(SaleError::NotLinked),
            Some(engine) if engine == &self.address => Ok(()),
            // Another engine owns the reservation; we hold no rights on this ledger
            Some(_) => Err(SaleError::NotLinked),
        }
    }

    // ===== Owner configuration =====

    /// Move the start of the window; only before it opens
    ///
    /// The new start may not lie in the past nor at or after the end time.
    pub fn set_start_time(&mut self, call: &CallContext, start_time: TimestampSeconds) -> SaleResult<()> {
        self.require_owner(call)?;
        self.phase(call.now).admit_configuration()?;
        if call.now >= self.start_time {
            return Err(SaleError::AlreadyStarted);
        }
        if start_time < call.now || start_time >= self.end_time {
            return Err(SaleError::InvalidStartTime {
                requested: start_time,
                now: call.now,
                end: self.end_time,
            });
        }

        let old = std::mem::replace(&mut self.start_time, start_time);
        self.events.push(SaleEvent::StartTimeChanged {
            old,
            new: start_time,
        });
        info!("crowdsale start time moved from {} to {}", old, start_time);
        Ok(())
    }

    pub fn set_end_time(&mut self, call: &CallContext, end_time: TimestampSeconds) -> SaleResult<()> {
        self.require_owner(call)?;
        self.phase(call.now).admit_configuration()?;
        if self.has_ended(call.now) {
            return Err(SaleError::AlreadyEnded);
        }
        if end_time <= call.now || end_time <= self.start_time {
            return Err(SaleError::InvalidEndTime {
                requested: end_time,
                now: call.now,
                start: self.start_time,
            });
        }

        let old = std::mem::replace(&mut self.end_time, end_time);
        self.events.push(SaleEvent::EndTimeChanged { old, new: end_time });
        info!("crowdsale end time moved from {} to {}", old, end_time);
        Ok(())
    }

    /// Change the exchange rate; allowed in any phase before finalization
    pub fn set_rate(&mut self, call: &CallContext, rate: Amount) -> SaleResult<()> {
        self.require_owner(call)?;
        self.phase(call.now).admit_configuration()?;
        if rate == 0 {
            return Err(SaleError::ZeroRate);
        }

        let old = std::mem::replace(&mut self.rate, rate);
        self.events.push(SaleEvent::RateChanged { old, new: rate });
        info!("crowdsale rate changed from {} to {}", old, rate);
        Ok(())
    }

    pub fn pause(&mut self, call: &CallContext) -> SaleResult<()> {
        self.require_owner(call)?;
        self.phase(call.now).admit_configuration()?;
        if self.paused {
            return Err(SaleError::AlreadyPaused);
        }

        self.paused = true;
        self.events.push(SaleEvent::Pause);
        info!("crowdsale {} paused", self.address.short());
        Ok(())
    }

    pub fn unpause(&mut self, call: &CallContext) -> SaleResult<()> {
        self.require_owner(call)?;
        self.phase(call.now).admit_configuration()?;
        if !self.paused {
            return Err(SaleError::NotPaused);
        }

        self.paused = false;
        self.events.push(SaleEvent::Unpause);
        info!("crowdsale {} unpaused", self.address.short());
        Ok(())
    }

    // ===== Purchases =====

    /// Buy tokens for the caller with `value`
    ///
    /// Returns the number of tokens credited.
    pub fn purchase(
        &mut self,
        call: &CallContext,
        value: Amount,
        ledger: &mut TokenLedger,
    ) -> SaleResult<Amount> {
        self.buy_tokens(call, &call.caller, value, ledger)
    }

    /// Buy tokens for `beneficiary`, paid by the caller with `value`
    ///
    /// Caps are enforced on the beneficiary's cumulative purchases.
    /// Both caps are inclusive: exactly the minimum, or a cumulative total of
    /// exactly the tier maximum, is accepted.
    pub fn buy_tokens(
        &mut self,
        call: &CallContext,
        beneficiary: &Address,
        value: Amount,
        ledger: &mut TokenLedger,
    ) -> SaleResult<Amount> {
        let phase = self.phase(call.now);
        trace!("purchase admission at {}: phase {}", call.now, phase);
        phase.admit_purchase()?;

        if beneficiary.is_zero() {
            return Err(SaleError::ZeroAddress);
        }

        let tokens = value
            .checked_mul(self.rate)
            .ok_or(SaleError::ContributionOverflow {
                value,
                rate: self.rate,
            })?;
        if tokens < PURCHASER_MIN_TOKEN_CAP {
            warn!(
                "rejected purchase of {} tokens by {}: below minimum",
                tokens,
                beneficiary.short()
            );
            return Err(SaleError::BelowMinimumCap {
                tokens,
                min: PURCHASER_MIN_TOKEN_CAP,
            });
        }

        let max = self.max_cap_at(call.now);
        let total = self
            .purchased_of(beneficiary)
            .checked_add(tokens)
            .filter(|total| *total <= max);
        let Some(total) = total else {
            warn!(
                "rejected purchase of {} tokens by {}: above maximum {}",
                tokens,
                beneficiary.short(),
                max
            );
            return Err(SaleError::AboveMaximumCap {
                total: self.purchased_of(beneficiary).saturating_add(tokens),
                max,
            });
        };

        self.require_link(ledger)?;
        let available = ledger.balance_of(&self.address);
        if tokens > available {
            return Err(SaleError::InsufficientFunds {
                needed: tokens,
                available,
            });
        }
        self.vault.preview_deposit(&self.address, value)?;

        // All checks passed: apply
        ledger.distribute(&self.address, beneficiary, tokens)?;
        self.vault.deposit(&self.address, value)?;
        self.purchased.insert(*beneficiary, total);
        self.tokens_sold += tokens;
        self.events.push(SaleEvent::TokenPurchase {
            purchaser: call.caller,
            beneficiary: *beneficiary,
            value,
            tokens,
        });

        debug!(
            "{} bought {} tokens for {} (value {}), cumulative {}",
            call.caller.short(),
            tokens,
            beneficiary.short(),
            value,
            total
        );
        Ok(tokens)
    }

    // ===== Settlement =====

    /// Burn unsold tokens, sweep collected value and unlock transfers
    ///
    /// Owner-only, once, after the sale window has closed.
    pub fn finalize(&mut self, call: &CallContext, ledger: &mut TokenLedger) -> SaleResult<Settlement> {
        self.require_owner(call)?;
        if self.finalized {
            return Err(SaleError::AlreadyFinalized);
        }
        if !self.has_ended(call.now) {
            return Err(SaleError::NotEnded);
        }
        self.require_link(ledger)?;
        if ledger.transfers_enabled() {
            return Err(LedgerError::TransfersAlreadyEnabled.into());
        }
        self.vault
            .preview_deposit(&SALE_FUNDS_ADDR, self.collected_value())?;

        // All checks passed: the steps below cannot fail
        let burned = ledger.balance_of(&self.address);
        ledger.burn(&self.address, burned)?;
        ledger.enable_transfers(&self.address)?;
        let swept = self.vault.sweep(&self.address, &SALE_FUNDS_ADDR)?;
        self.finalized = true;

        let settlement = Settlement {
            burned,
            swept,
            beneficiary: SALE_FUNDS_ADDR,
        };
        self.events.push(SaleEvent::Finalized {
            burned,
            swept,
            beneficiary: SALE_FUNDS_ADDR,
        });

        info!(
            "crowdsale {} finalized: {} tokens burned, {} value swept to {}",
            self.address.short(),
            burned,
            swept,
            SALE_FUNDS_ADDR.short()
        );
        Ok(settlement)
    }
}
