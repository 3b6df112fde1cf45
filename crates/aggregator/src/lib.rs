//! Vedex Reward Aggregator
//!
//! Walks the active reward-bearing pools for an account and lock position,
//! reads reward tokens and earned amounts through the batch gateway, and
//! classifies the results into bribes, direct gauge rewards and the
//! protocol-wide distribution.

pub mod batch;
pub mod categories;
pub mod collector;
pub mod service;
pub mod summary;

pub use batch::ReadPlan;
pub use categories::{Bribe, BribeClaim, ClaimableRewards, DirectReward, Distribution, RewardCategory};
pub use collector::{BribeCollector, DirectRewardCollector};
pub use service::{AggregatorConfig, RewardAggregator, SymbolOverride};
pub use summary::{AprRange, RewardSummary, TokenTotal};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AggregatorError {
    /// An input the caller is expected to supply has not been loaded yet.
    /// Distinct from a transport failure: nothing broke, there is just
    /// nothing to aggregate over.
    #[error("missing input: {0}")]
    MissingInput(&'static str),
    #[error("batch read failed: {0}")]
    Gateway(#[from] vedex_gateway::GatewayError),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
