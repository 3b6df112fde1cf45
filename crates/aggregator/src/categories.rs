//! The three claimable reward categories and their merged view.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vedex_core::{Address, BribeTier, EarnedEntry, RewardToken, U256};

use crate::summary::{self, AprRange, RewardSummary};

/// Positive bribe rewards on one tier of a pool's gauge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BribeClaim {
    pub tier: BribeTier,
    pub bribe: Address,
    /// Strictly positive entries only.
    pub earned: Vec<EarnedEntry>,
}

/// Bribe rewards earned by a lock position on one pool. A pool appears at
/// most once; each positive tier contributes one [`BribeClaim`], A before B.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bribe {
    pub pool: Address,
    pub pool_symbol: String,
    pub lock_id: U256,
    pub tiers: Vec<BribeClaim>,
}

impl Bribe {
    pub fn tier(&self, tier: BribeTier) -> Option<&BribeClaim> {
        self.tiers.iter().find(|c| c.tier == tier)
    }

    /// Earned entries across every tier, in tier order.
    pub fn earned(&self) -> impl Iterator<Item = &EarnedEntry> {
        self.tiers.iter().flat_map(|c| c.earned.iter())
    }
}

/// Gauge rewards earned by an account on one pool. A pool appears at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectReward {
    pub pool: Address,
    pub pool_symbol: String,
    pub gauge: Address,
    pub account: Address,
    /// The first token found with a positive earned amount.
    pub token: RewardToken,
    /// Strictly positive entries only, in discovery order.
    pub earned: Vec<EarnedEntry>,
    /// Every token the gauge pays out with its daily emission rate, earned
    /// by this account or not.
    #[serde(default)]
    pub emissions: Vec<RewardToken>,
}

impl DirectReward {
    pub fn token_addresses(&self) -> Vec<Address> {
        self.earned.iter().map(|e| e.token.address).collect()
    }
}

/// The protocol-wide rebase claimable by a lock position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub lock_id: U256,
    pub distributor: Address,
    pub earned: EarnedEntry,
}

/// A claimable reward of any category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardCategory {
    Bribe(Bribe),
    DirectReward(DirectReward),
    Distribution(Distribution),
}

impl RewardCategory {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bribe(_) => "bribe",
            Self::DirectReward(_) => "reward",
            Self::Distribution(_) => "distribution",
        }
    }

    pub fn earned(&self) -> Vec<&EarnedEntry> {
        match self {
            Self::Bribe(b) => b.earned().collect(),
            Self::DirectReward(r) => r.earned.iter().collect(),
            Self::Distribution(d) => vec![&d.earned],
        }
    }

    /// The pool this reward belongs to; the distribution is not pool-specific.
    pub fn pool(&self) -> Option<Address> {
        match self {
            Self::Bribe(b) => Some(b.pool),
            Self::DirectReward(r) => Some(r.pool),
            Self::Distribution(_) => None,
        }
    }
}

/// Everything an account and lock position can currently claim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableRewards {
    pub bribes: Vec<Bribe>,
    pub rewards: Vec<DirectReward>,
    pub distribution: Vec<Distribution>,
    pub summary: RewardSummary,
}

impl ClaimableRewards {
    pub fn new(bribes: Vec<Bribe>, rewards: Vec<DirectReward>, distribution: Vec<Distribution>) -> Self {
        let mut claimable = Self {
            bribes,
            rewards,
            distribution,
            summary: RewardSummary::default(),
        };
        claimable.summary = RewardSummary::from_categories(&claimable.categories());
        claimable
    }

    pub fn is_empty(&self) -> bool {
        self.bribes.is_empty() && self.rewards.is_empty() && self.distribution.is_empty()
    }

    /// Every entry as a [`RewardCategory`]: bribes, then rewards, then distribution.
    pub fn categories(&self) -> Vec<RewardCategory> {
        self.bribes
            .iter()
            .cloned()
            .map(RewardCategory::Bribe)
            .chain(self.rewards.iter().cloned().map(RewardCategory::DirectReward))
            .chain(self.distribution.iter().cloned().map(RewardCategory::Distribution))
            .collect()
    }

    /// Range of gauge emission APRs over the promoted direct-reward pools,
    /// given USD prices per token and TVL per pool. Pools without a positive
    /// TVL are ignored.
    pub fn apr_range(
        &self,
        prices_usd: &HashMap<Address, f64>,
        tvl_usd: &HashMap<Address, f64>,
    ) -> Option<AprRange> {
        summary::apr_range(&self.categories(), prices_usd, tvl_usd)
    }
}
