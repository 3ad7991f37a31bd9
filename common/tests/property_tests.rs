//! Property-based tests for the ledger and crowdsale
//!
//! Random operation sequences are replayed against a deployment; whatever
//! succeeds or fails, the accounting invariants must hold after every step.
//!
//! Properties tested:
//! - Conservation: balances plus burned tokens equal the initial supply
//! - Caps: no purchaser ever exceeds the full-period maximum
//! - Value: collected plus swept value equals the value of accepted purchases
//! - Failed operations leave the ledger untouched

use gdpr_common::{
    config::{SaleConfig, COIN_VALUE, PURCHASER_MAX_TOKEN_CAP, SALE_FUNDS_ADDR},
    context::CallContext,
    crypto::Address,
    deployment::Deployment,
    time::{TimestampSeconds, SECONDS_PER_DAY},
};
use proptest::prelude::*;

const START: TimestampSeconds = 1_000_000;
const END: TimestampSeconds = START + 15 * SECONDS_PER_DAY;
const ACCOUNTS: u8 = 5;

#[derive(Debug, Clone)]
enum Op {
    Purchase { who: u8, value: u128 },
    BuyFor { who: u8, beneficiary: u8, value: u128 },
    Presale { buyer: u8, tokens: u128 },
    Transfer { from: u8, to: u8, amount: u128 },
    Approve { owner: u8, spender: u8, amount: u128 },
    TransferFrom { spender: u8, from: u8, to: u8, amount: u128 },
    Pause,
    Unpause,
    SetRate { rate: u128 },
    Finalize,
}

fn account(n: u8) -> Address {
    Address::new([n + 1; 32])
}

fn owner() -> Address {
    Address::new([0xEE; 32])
}

// Values around the cap boundaries at the default rate
fn value_strategy() -> impl Strategy<Value = u128> {
    prop_oneof![
        0u128..COIN_VALUE,
        Just(COIN_VALUE / 10),
        Just(2 * COIN_VALUE),
        (1u128..30).prop_map(|coins| coins * COIN_VALUE),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let who = 0..ACCOUNTS;
    prop_oneof![
        4 => (who.clone(), value_strategy()).prop_map(|(who, value)| Op::Purchase { who, value }),
        2 => (who.clone(), who.clone(), value_strategy())
            .prop_map(|(who, beneficiary, value)| Op::BuyFor { who, beneficiary, value }),
        1 => (who.clone(), 0u128..100_000 * COIN_VALUE)
            .prop_map(|(buyer, tokens)| Op::Presale { buyer, tokens }),
        3 => (who.clone(), who.clone(), 0u128..5_000 * COIN_VALUE)
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        1 => (who.clone(), who.clone(), 0u128..5_000 * COIN_VALUE)
            .prop_map(|(owner, spender, amount)| Op::Approve { owner, spender, amount }),
        2 => (who.clone(), who.clone(), who, 0u128..5_000 * COIN_VALUE)
            .prop_map(|(spender, from, to, amount)| Op::TransferFrom { spender, from, to, amount }),
        1 => Just(Op::Pause),
        1 => Just(Op::Unpause),
        1 => (1u128..5_000).prop_map(|rate| Op::SetRate { rate }),
        1 => Just(Op::Finalize),
    ]
}

fn apply(deployment: &mut Deployment, op: &Op, now: TimestampSeconds) -> Option<u128> {
    let owner_call = CallContext::new(owner(), now);
    match op {
        Op::Purchase { who, value } => deployment
            .purchase(&CallContext::new(account(*who), now), *value)
            .ok()
            .map(|_| *value),
        Op::BuyFor {
            who,
            beneficiary,
            value,
        } => deployment
            .buy_tokens(
                &CallContext::new(account(*who), now),
                &account(*beneficiary),
                *value,
            )
            .ok()
            .map(|_| *value),
        Op::Presale { buyer, tokens } => {
            let _ = deployment.add_presale_order(&owner_call, &account(*buyer), *tokens);
            None
        }
        Op::Transfer { from, to, amount } => {
            let _ = deployment.transfer(&CallContext::new(account(*from), now), &account(*to), *amount);
            None
        }
        Op::Approve {
            owner,
            spender,
            amount,
        } => {
            deployment.approve(&CallContext::new(account(*owner), now), &account(*spender), *amount);
            None
        }
        Op::TransferFrom {
            spender,
            from,
            to,
            amount,
        } => {
            let _ = deployment.transfer_from(
                &CallContext::new(account(*spender), now),
                &account(*from),
                &account(*to),
                *amount,
            );
            None
        }
        Op::Pause => {
            let _ = deployment.pause(&owner_call);
            None
        }
        Op::Unpause => {
            let _ = deployment.unpause(&owner_call);
            None
        }
        Op::SetRate { rate } => {
            let _ = deployment.set_rate(&owner_call, *rate);
            None
        }
        Op::Finalize => {
            let _ = deployment.finalize(&owner_call);
            None
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_invariants_hold_over_random_sequences(
        steps in prop::collection::vec((op_strategy(), 0u64..END - START + 2 * SECONDS_PER_DAY), 1..60),
    ) {
        let mut deployment = Deployment::deploy(&owner(), SaleConfig::new(START, END)).unwrap();
        let mut accepted_value = 0u128;

        // Host time never goes backwards
        let mut offsets: Vec<u64> = steps.iter().map(|(_, offset)| *offset).collect();
        offsets.sort_unstable();

        for ((op, _), offset) in steps.iter().zip(offsets) {
            // Begin a day early so presale orders get a chance
            let now = START - SECONDS_PER_DAY + offset;
            if let Some(value) = apply(&mut deployment, op, now) {
                accepted_value += value;
            }

            let ledger = deployment.ledger();
            let snapshot = ledger.snapshot();
            prop_assert!(snapshot.is_conserved());
            prop_assert_eq!(ledger.total_supply() + ledger.total_burned(), ledger.initial_supply());

            let sale = deployment.sale();
            for n in 0..ACCOUNTS {
                prop_assert!(sale.purchased_of(&account(n)) <= PURCHASER_MAX_TOKEN_CAP);
            }
            prop_assert_eq!(
                sale.collected_value() + deployment.value_balance_of(&SALE_FUNDS_ADDR),
                accepted_value
            );
            prop_assert_eq!(ledger.transfers_enabled(), sale.is_finalized());
            if sale.is_finalized() {
                prop_assert_eq!(ledger.balance_of(sale.address()), 0);
                prop_assert_eq!(sale.collected_value(), 0);
            }
        }
    }

    #[test]
    fn test_failed_transfer_leaves_ledger_untouched(
        amount in 0u128..1_000 * COIN_VALUE,
        from in 0..ACCOUNTS,
        to in 0..ACCOUNTS,
    ) {
        let mut deployment = Deployment::deploy(&owner(), SaleConfig::new(START, END)).unwrap();
        let before = deployment.ledger().snapshot();
        let events_before = deployment.ledger().events().len();

        // Transfers are locked before settlement
        let result = deployment.transfer(&CallContext::new(account(from), START), &account(to), amount);
        prop_assert!(result.is_err());

        let after = deployment.ledger().snapshot();
        prop_assert_eq!(before.balances, after.balances);
        prop_assert_eq!(before.total_supply, after.total_supply);
        prop_assert_eq!(events_before, deployment.ledger().events().len());
    }
}
