//! Vedex Core
//!
//! Shared types for the read-aggregation and write-orchestration crates:
//! contract call descriptors, reward tokens, pools and lock positions.

pub mod call;
pub mod reward;
pub mod units;

pub use alloy_primitives::{Address, B256, U256};
pub use call::{CallArg, CallDescriptor, CallFailure, CallOutcome, CallValue, ReadFn};
pub use reward::{BribeContract, BribeTier, EarnedEntry, GaugeInfo, LockPosition, Pool, RewardToken};
pub use units::format_units;

use thiserror::Error;

/// Transaction hash as returned by the wallet and node collaborators.
pub type TxHash = B256;

/// Seconds in a day, used to turn per-second reward rates into daily emissions.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Errors shared across the vedex crates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("unexpected call value: expected {expected}, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: String,
    },
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

/// Failure of a node-access round trip as a whole (not of one call inside it).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("node unavailable: {0}")]
    Unavailable(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}
