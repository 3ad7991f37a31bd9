//! Crowdsale Module
//!
//! Time-gated distribution of the GDPR Cash sale reservation.
//!
//! # Features
//!
//! - Phase resolution from the clock and the pause/finalize flags
//! - Purchases with a per-contribution minimum and day-tiered cumulative maximums
//! - Owner controls: start/end time, rate, pause
//! - Presale orders before the window opens
//! - One-time finalization: burn unsold tokens, sweep value, unlock transfers

pub mod engine;
pub mod error;
pub mod phase;
pub mod presale;
pub mod types;
pub mod vault;

pub use engine::*;
pub use error::*;
pub use phase::*;
pub use types::*;
pub use vault::*;
