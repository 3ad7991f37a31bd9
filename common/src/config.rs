use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    crypto::Address,
    time::{TimestampSeconds, SECONDS_PER_DAY},
};

// Token amounts are counted in the smallest unit (10^-18 GDPR)
pub type Amount = u128;

// ===== Token metadata =====

pub const TOKEN_NAME: &str = "GDPR Cash";
pub const TOKEN_SYMBOL: &str = "GDPR";
pub const TOKEN_DECIMALS: u8 = 18;

// 1 GDPR in atomic units
pub const COIN_VALUE: Amount = 1_000_000_000_000_000_000;

// ===== Allocation =====
// Every pool is credited once when the ledger is created.
// The sale reservation stays on the ledger account until the engine is linked.

pub const SALE_CAP: Amount = 500_000_000 * COIN_VALUE;
pub const EXPERTS_POOL_TOKENS: Amount = 100_000_000 * COIN_VALUE;
pub const MARKETING_POOL_TOKENS: Amount = 80_000_000 * COIN_VALUE;
pub const TEAM_POOL_TOKENS: Amount = 150_000_000 * COIN_VALUE;
pub const LEGAL_EXPENSES_TOKENS: Amount = 20_000_000 * COIN_VALUE;
pub const RESERVE_POOL_TOKENS: Amount = 150_000_000 * COIN_VALUE;

pub const TOTAL_SUPPLY: Amount = SALE_CAP
    + EXPERTS_POOL_TOKENS
    + MARKETING_POOL_TOKENS
    + TEAM_POOL_TOKENS
    + LEGAL_EXPENSES_TOKENS
    + RESERVE_POOL_TOKENS;

// ===== Purchaser caps =====
// Caps are expressed in tokens and are inclusive:
// a contribution of exactly PURCHASER_MIN_TOKEN_CAP is accepted, and a
// cumulative total of exactly the tier maximum is accepted.

pub const PURCHASER_MIN_TOKEN_CAP: Amount = 100 * COIN_VALUE;
pub const PURCHASER_MAX_TOKEN_CAP_DAY1: Amount = 2_000 * COIN_VALUE;
pub const PURCHASER_MAX_TOKEN_CAP: Amount = 20_000 * COIN_VALUE;

// Day one lasts from start_time until start_time + DAY_ONE_DURATION (exclusive)
pub const DAY_ONE_DURATION: TimestampSeconds = SECONDS_PER_DAY;

// Tokens issued per unit of value received
pub const DEFAULT_RATE: Amount = 1_000;

// ===== Fixed accounts =====

pub const EXPERTS_POOL_ADDR: Address = Address::new([
    0x45, 0x58, 0x50, 0x45, 0x52, 0x54, 0x53, 0x5f, // EXPERTS_
    0x50, 0x4f, 0x4f, 0x4c, 0x00, 0x00, 0x00, 0x00, // POOL
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
]);

pub const MARKETING_POOL_ADDR: Address = Address::new([
    0x4d, 0x41, 0x52, 0x4b, 0x45, 0x54, 0x49, 0x4e, // MARKETIN
    0x47, 0x5f, 0x50, 0x4f, 0x4f, 0x4c, 0x00, 0x00, // G_POOL
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
]);

pub const TEAM_POOL_ADDR: Address = Address::new([
    0x54, 0x45, 0x41, 0x4d, 0x5f, 0x50, 0x4f, 0x4f, // TEAM_POO
    0x4c, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // L
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03,
]);

pub const LEGAL_EXPENSES_ADDR: Address = Address::new([
    0x4c, 0x45, 0x47, 0x41, 0x4c, 0x5f, 0x45, 0x58, // LEGAL_EX
    0x50, 0x45, 0x4e, 0x53, 0x45, 0x53, 0x00, 0x00, // PENSES
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x04,
]);

pub const RESERVE_POOL_ADDR: Address = Address::new([
    0x52, 0x45, 0x53, 0x45, 0x52, 0x56, 0x45, 0x5f, // RESERVE_
    0x50, 0x4f, 0x4f, 0x4c, 0x00, 0x00, 0x00, 0x00, // POOL
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x05,
]);

/// Beneficiary of the value collected by the sale
pub const SALE_FUNDS_ADDR: Address = Address::new([
    0x53, 0x41, 0x4c, 0x45, 0x5f, 0x46, 0x55, 0x4e, // SALE_FUN
    0x44, 0x53, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // DS
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x06,
]);

/// Named stakeholder pools, in allocation order
pub const POOL_ALLOCATIONS: [(&str, Address, Amount); 5] = [
    ("experts", EXPERTS_POOL_ADDR, EXPERTS_POOL_TOKENS),
    ("marketing", MARKETING_POOL_ADDR, MARKETING_POOL_TOKENS),
    ("team", TEAM_POOL_ADDR, TEAM_POOL_TOKENS),
    ("legal", LEGAL_EXPENSES_ADDR, LEGAL_EXPENSES_TOKENS),
    ("reserve", RESERVE_POOL_ADDR, RESERVE_POOL_TOKENS),
];

// Labels used to derive the contract addresses from the deployer
pub const LEDGER_ADDRESS_LABEL: &[u8] = b"gdpr-cash-ledger";
pub const SALE_ADDRESS_LABEL: &[u8] = b"gdpr-cash-crowdsale";

// ===== Sale configuration =====

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Start time {start} must be before end time {end}")]
    InvalidWindow {
        start: TimestampSeconds,
        end: TimestampSeconds,
    },

    #[error("Rate must be positive")]
    ZeroRate,

    #[error("Invalid sale configuration: {0}")]
    Parse(String),
}

fn default_rate() -> Amount {
    DEFAULT_RATE
}

/// Deploy-time parameters of the crowdsale engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleConfig {
    pub start_time: TimestampSeconds,
    pub end_time: TimestampSeconds,
    #[serde(default = "default_rate")]
    pub rate: Amount,
}

impl SaleConfig {
    pub fn new(start_time: TimestampSeconds, end_time: TimestampSeconds) -> Self {
        Self {
            start_time,
            end_time,
            rate: DEFAULT_RATE,
        }
    }

    pub fn with_rate(mut self, rate: Amount) -> Self {
        self.rate = rate;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start_time >= self.end_time {
            return Err(ConfigError::InvalidWindow {
                start: self.start_time,
                end: self.end_time,
            });
        }
        if self.rate == 0 {
            return Err(ConfigError::ZeroRate);
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
