//! Reward tokens, pools and lock positions.
//!
//! Pools arrive pre-fetched and annotated with their gauge and bribe
//! contracts; nothing in this module performs reads.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::units::format_units;

/// A reward token as seen in one pool/epoch snapshot. Identity is the address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardToken {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
    /// Tokens emitted per day, in raw units.
    #[serde(default)]
    pub daily_emission_rate: U256,
}

impl RewardToken {
    pub fn new(address: Address, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            decimals,
            daily_emission_rate: U256::ZERO,
        }
    }

    pub fn with_daily_emission(mut self, rate: U256) -> Self {
        self.daily_emission_rate = rate;
        self
    }
}

/// An earned amount for one reward token. Recomputed on every aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarnedEntry {
    pub token: RewardToken,
    pub amount: U256,
}

impl EarnedEntry {
    pub fn new(token: RewardToken, amount: U256) -> Self {
        Self { token, amount }
    }

    pub fn is_positive(&self) -> bool {
        !self.amount.is_zero()
    }

    /// The earned amount as a decimal string in whole token units.
    pub fn display_amount(&self) -> String {
        format_units(self.amount, self.token.decimals)
    }
}

/// Bribe weighting tier. A gauge carries at most one bribe contract per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BribeTier {
    A,
    B,
}

impl BribeTier {
    pub const ALL: [BribeTier; 2] = [BribeTier::A, BribeTier::B];

    pub fn name(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BribeContract {
    pub tier: BribeTier,
    pub address: Address,
    /// Reward tokens registered on the bribe, as pre-fetched by the caller.
    pub tokens: Vec<RewardToken>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeInfo {
    pub address: Address,
    /// False once the gauge has been killed.
    pub alive: bool,
    #[serde(default)]
    pub bribes: Vec<BribeContract>,
}

impl GaugeInfo {
    /// The bribe contract for `tier`. If the annotation lists a tier twice,
    /// the first one wins.
    pub fn bribe(&self, tier: BribeTier) -> Option<&BribeContract> {
        self.bribes.iter().find(|b| b.tier == tier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub address: Address,
    pub symbol: String,
    pub gauge: Option<GaugeInfo>,
}

impl Pool {
    /// The gauge, if attached and still distributing rewards.
    pub fn active_gauge(&self) -> Option<&GaugeInfo> {
        self.gauge.as_ref().filter(|g| g.alive)
    }
}

/// A time-locked stake of governance tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockPosition {
    pub id: U256,
    /// Unix timestamp (seconds) at which the lock expires.
    pub locked_until: u64,
}

impl LockPosition {
    pub fn new(id: U256, locked_until: u64) -> Self {
        Self { id, locked_until }
    }

    /// Id zero denotes the unset position.
    pub fn is_null(&self) -> bool {
        self.id.is_zero()
    }

    pub fn is_valid(&self, now: u64) -> bool {
        !self.is_null() && self.locked_until > now
    }
}
