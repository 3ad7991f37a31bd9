//! Token Ledger Module
//!
//! Fixed-supply balance and allowance accounting for the GDPR Cash token.
//!
//! # Features
//!
//! - Pool allocation at construction
//! - ERC20-compatible transfer/approve/transferFrom
//! - Transfer lock lifted once by the linked sale engine
//! - Engine-only distribution and burn

pub mod error;
pub mod token;
pub mod types;

pub use error::*;
pub use token::*;
pub use types::*;
