//! Totals and APR range over the aggregated categories.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use vedex_core::{format_units, Address, RewardToken, U256};

use crate::categories::RewardCategory;

/// Claimable amount of one token summed across all categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTotal {
    pub token: RewardToken,
    pub amount: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardSummary {
    /// One total per token address, in first-seen order.
    pub totals: Vec<TokenTotal>,
    /// Number of category entries that fed the totals.
    pub entries: usize,
}

impl RewardSummary {
    pub fn from_categories(categories: &[RewardCategory]) -> Self {
        let mut totals: Vec<TokenTotal> = Vec::new();
        let mut index: HashMap<Address, usize> = HashMap::new();

        for entry in categories.iter().flat_map(|c| c.earned()) {
            match index.get(&entry.token.address) {
                Some(&i) => {
                    totals[i].amount = totals[i].amount.saturating_add(entry.amount);
                }
                None => {
                    index.insert(entry.token.address, totals.len());
                    totals.push(TokenTotal {
                        token: entry.token.clone(),
                        amount: entry.amount,
                    });
                }
            }
        }

        Self {
            totals,
            entries: categories.len(),
        }
    }

    pub fn total_for(&self, token: Address) -> U256 {
        self.totals
            .iter()
            .find(|t| t.token.address == token)
            .map(|t| t.amount)
            .unwrap_or(U256::ZERO)
    }
}

/// APR bounds in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AprRange {
    pub min: f64,
    pub max: f64,
}

/// Per-pool APR = daily emission value * 365 / TVL over the gauge's full
/// emission set, for every promoted direct-reward pool with a positive TVL
/// and at least one priced emitting token. Independent of what the account
/// has accrued.
pub fn apr_range(
    categories: &[RewardCategory],
    prices_usd: &HashMap<Address, f64>,
    tvl_usd: &HashMap<Address, f64>,
) -> Option<AprRange> {
    let mut daily_usd: HashMap<Address, f64> = HashMap::new();

    for category in categories {
        let RewardCategory::DirectReward(reward) = category else {
            continue;
        };
        for token in &reward.emissions {
            let Some(price) = prices_usd.get(&token.address) else {
                continue;
            };
            if token.daily_emission_rate.is_zero() {
                continue;
            }
            *daily_usd.entry(reward.pool).or_insert(0.0) += whole_units(token) * price;
        }
    }

    let mut range: Option<AprRange> = None;
    for (pool, daily) in daily_usd {
        let Some(&tvl) = tvl_usd.get(&pool) else {
            continue;
        };
        if tvl <= 0.0 {
            continue;
        }
        let apr = daily * 365.0 / tvl * 100.0;
        range = Some(match range {
            Some(r) => AprRange {
                min: r.min.min(apr),
                max: r.max.max(apr),
            },
            None => AprRange { min: apr, max: apr },
        });
    }
    range
}

fn whole_units(token: &RewardToken) -> f64 {
    format_units(token.daily_emission_rate, token.decimals)
        .parse()
        .unwrap_or(0.0)
}
