//! The reward aggregator: turns a pre-fetched pool list into claimable
//! rewards for one account and lock position.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vedex_core::{
    Address, BribeTier, CallDescriptor, EarnedEntry, GaugeInfo, LockPosition, Pool, RewardToken,
    SECONDS_PER_DAY, U256,
};
use vedex_gateway::BatchGateway;

use crate::batch::{read_address, read_text, read_uint, ReadPlan};
use crate::categories::{Bribe, ClaimableRewards, DirectReward, Distribution};
use crate::collector::{BribeCollector, DirectRewardCollector};
use crate::{AggregatorError, Result};

/// Display symbol patch for a single pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolOverride {
    pub pool: Address,
    pub symbol: String,
}

/// Configuration for the reward aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    /// Rebase distributor queried for the protocol-wide distribution.
    pub distributor: Option<Address>,
    /// Token paid out by the distributor.
    pub governance_token: Option<RewardToken>,
    /// Tokens whose symbol and decimals need no on-chain read.
    pub known_tokens: Vec<RewardToken>,
    /// Pools excluded from aggregation (e.g. known scam pools).
    pub denied_pools: Vec<Address>,
    pub symbol_overrides: Vec<SymbolOverride>,
    /// Upper bound on `rewardsListLength()` trusted per gauge (default: 16).
    pub max_reward_tokens: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            distributor: None,
            governance_token: None,
            known_tokens: Vec::new(),
            denied_pools: Vec::new(),
            symbol_overrides: Vec::new(),
            max_reward_tokens: 16,
        }
    }
}

/// A pool that passed the gauge and deny-list filter.
struct ActivePool<'a> {
    pool: &'a Pool,
    gauge: &'a GaugeInfo,
    symbol: String,
}

#[derive(Debug, Clone, Copy)]
enum DirectRead {
    Symbol(Address),
    Decimals(Address),
    Earned(usize, usize),
    Rate(usize, usize),
}

/// Aggregates claimable rewards through the batch gateway.
///
/// Holds no state between calls; every pass re-reads the chain.
pub struct RewardAggregator {
    gateway: Arc<BatchGateway>,
    config: AggregatorConfig,
    known_tokens: HashMap<Address, RewardToken>,
    denied: HashSet<Address>,
    overrides: HashMap<Address, String>,
}

impl RewardAggregator {
    pub fn new(gateway: Arc<BatchGateway>, config: AggregatorConfig) -> Self {
        let known_tokens = config
            .known_tokens
            .iter()
            .map(|t| (t.address, t.clone()))
            .collect();
        let denied = config.denied_pools.iter().copied().collect();
        let overrides = config
            .symbol_overrides
            .iter()
            .map(|o| (o.pool, o.symbol.clone()))
            .collect();

        Self {
            gateway,
            config,
            known_tokens,
            denied,
            overrides,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Aggregate every claimable reward for `account` and `lock`.
    ///
    /// Without a lock position (or with the null position) bribe and
    /// distribution discovery are skipped entirely. `pools` must already be
    /// loaded; `None` yields [`AggregatorError::MissingInput`].
    pub async fn aggregate(
        &self,
        account: Address,
        lock: Option<&LockPosition>,
        pools: Option<&[Pool]>,
        now: u64,
    ) -> Result<ClaimableRewards> {
        let pools = pools.ok_or(AggregatorError::MissingInput("pools"))?;
        let active = self.active_pools(pools);
        let lock = lock.filter(|l| !l.is_null());

        info!(
            account = %account,
            pools = pools.len(),
            active = active.len(),
            lock_id = ?lock.map(|l| l.id),
            "aggregating rewards"
        );

        let bribes = async {
            match lock {
                Some(lock) => self.collect_bribes(&active, lock).await,
                None => Ok(Vec::new()),
            }
        };
        let distribution = async {
            match lock {
                Some(lock) => self.collect_distribution(lock, now).await,
                None => Ok(Vec::new()),
            }
        };
        let rewards = self.collect_direct_rewards(&active, account);

        let (bribes, distribution, rewards) = futures::try_join!(bribes, distribution, rewards)?;
        let claimable = ClaimableRewards::new(bribes, rewards, distribution);

        info!(
            bribes = claimable.bribes.len(),
            rewards = claimable.rewards.len(),
            distribution = claimable.distribution.len(),
            "rewards aggregated"
        );
        Ok(claimable)
    }

    /// Bribes only. Requires a non-null lock position.
    pub async fn aggregate_bribes(
        &self,
        pools: &[Pool],
        lock: Option<&LockPosition>,
    ) -> Result<Vec<Bribe>> {
        let lock = lock
            .filter(|l| !l.is_null())
            .ok_or(AggregatorError::MissingInput("lock position"))?;
        self.collect_bribes(&self.active_pools(pools), lock).await
    }

    /// The distribution only. Requires a non-null lock position.
    pub async fn aggregate_distribution(
        &self,
        lock: Option<&LockPosition>,
        now: u64,
    ) -> Result<Vec<Distribution>> {
        let lock = lock
            .filter(|l| !l.is_null())
            .ok_or(AggregatorError::MissingInput("lock position"))?;
        self.collect_distribution(lock, now).await
    }

    /// Direct gauge rewards only.
    pub async fn aggregate_direct_rewards(
        &self,
        pools: &[Pool],
        account: Address,
    ) -> Result<Vec<DirectReward>> {
        self.collect_direct_rewards(&self.active_pools(pools), account)
            .await
    }

    fn active_pools<'a>(&self, pools: &'a [Pool]) -> Vec<ActivePool<'a>> {
        pools
            .iter()
            .filter(|pool| {
                if self.denied.contains(&pool.address) {
                    debug!(pool = %pool.address, "pool on deny list, skipping");
                    return false;
                }
                true
            })
            .filter_map(|pool| {
                let gauge = pool.active_gauge()?;
                let symbol = self
                    .overrides
                    .get(&pool.address)
                    .cloned()
                    .unwrap_or_else(|| pool.symbol.clone());
                Some(ActivePool { pool, gauge, symbol })
            })
            .collect()
    }

    async fn collect_bribes(&self, active: &[ActivePool<'_>], lock: &LockPosition) -> Result<Vec<Bribe>> {
        let mut plan = ReadPlan::new();
        for (pi, entry) in active.iter().enumerate() {
            for tier in BribeTier::ALL {
                let Some(bribe) = entry.gauge.bribe(tier) else {
                    continue;
                };
                for (ti, token) in bribe.tokens.iter().enumerate() {
                    plan.push(
                        (pi, tier, ti),
                        CallDescriptor::bribe_earned(bribe.address, token.address, lock.id),
                    );
                }
            }
        }
        debug!(reads = plan.len(), lock_id = %lock.id, "reading bribe balances");

        let mut collector = BribeCollector::new(lock.id);
        for ((pi, tier, ti), outcome) in plan.execute(&self.gateway).await? {
            let entry = &active[pi];
            let Some(bribe) = entry.gauge.bribe(tier) else {
                continue;
            };
            let Some(amount) = read_uint(&outcome, bribe.address, "earned") else {
                continue;
            };
            collector.ingest(
                entry.pool.address,
                &entry.symbol,
                tier,
                bribe.address,
                EarnedEntry::new(bribe.tokens[ti].clone(), amount),
            );
        }
        Ok(collector.finish())
    }

    async fn collect_distribution(&self, lock: &LockPosition, now: u64) -> Result<Vec<Distribution>> {
        if !lock.is_valid(now) {
            debug!(lock_id = %lock.id, locked_until = lock.locked_until, "lock position expired, skipping distribution");
            return Ok(Vec::new());
        }
        let (Some(distributor), Some(token)) =
            (self.config.distributor, self.config.governance_token.as_ref())
        else {
            debug!("no distributor configured, skipping distribution");
            return Ok(Vec::new());
        };

        let mut plan = ReadPlan::new();
        plan.push((), CallDescriptor::claimable(distributor, lock.id));
        let amount = plan
            .execute(&self.gateway)
            .await?
            .into_iter()
            .next()
            .and_then(|((), outcome)| read_uint(&outcome, distributor, "claimable"));

        Ok(match amount {
            Some(amount) if !amount.is_zero() => vec![Distribution {
                lock_id: lock.id,
                distributor,
                earned: EarnedEntry::new(token.clone(), amount),
            }],
            _ => Vec::new(),
        })
    }

    async fn collect_direct_rewards(
        &self,
        active: &[ActivePool<'_>],
        account: Address,
    ) -> Result<Vec<DirectReward>> {
        // Reward-token discovery: list length, then each index.
        let mut lengths = ReadPlan::new();
        for (pi, entry) in active.iter().enumerate() {
            lengths.push(pi, CallDescriptor::rewards_list_length(entry.gauge.address));
        }

        let mut indexed = ReadPlan::new();
        for (pi, outcome) in lengths.execute(&self.gateway).await? {
            let gauge = active[pi].gauge.address;
            let Some(len) = read_uint(&outcome, gauge, "rewardsListLength") else {
                continue;
            };
            let len = u64::try_from(len).unwrap_or(u64::MAX);
            if len > self.config.max_reward_tokens {
                warn!(gauge = %gauge, len, max = self.config.max_reward_tokens, "reward list truncated");
            }
            for i in 0..len.min(self.config.max_reward_tokens) {
                indexed.push(pi, CallDescriptor::reward_at(gauge, i));
            }
        }

        let mut pool_tokens: Vec<Vec<Address>> = vec![Vec::new(); active.len()];
        for (pi, outcome) in indexed.execute(&self.gateway).await? {
            let Some(token) = read_address(&outcome, active[pi].gauge.address, "rewards") else {
                continue;
            };
            if !pool_tokens[pi].contains(&token) {
                pool_tokens[pi].push(token);
            }
        }

        // Metadata for tokens outside the known table, plus earned and rate
        // per (pool, token), in a single batch.
        let mut unknown: Vec<Address> = Vec::new();
        for token in pool_tokens.iter().flatten() {
            if !self.known_tokens.contains_key(token) && !unknown.contains(token) {
                unknown.push(*token);
            }
        }

        let mut plan = ReadPlan::new();
        for token in &unknown {
            plan.push(DirectRead::Symbol(*token), CallDescriptor::symbol(*token));
            plan.push(DirectRead::Decimals(*token), CallDescriptor::decimals(*token));
        }
        for (pi, tokens) in pool_tokens.iter().enumerate() {
            let gauge = active[pi].gauge.address;
            for (ti, token) in tokens.iter().enumerate() {
                plan.push(DirectRead::Earned(pi, ti), CallDescriptor::gauge_earned(gauge, *token, account));
                plan.push(DirectRead::Rate(pi, ti), CallDescriptor::reward_rate(gauge, *token));
            }
        }
        debug!(
            reads = plan.len(),
            unknown_tokens = unknown.len(),
            account = %account,
            "reading gauge rewards"
        );

        let mut symbols: HashMap<Address, String> = HashMap::new();
        let mut decimals: HashMap<Address, u8> = HashMap::new();
        let mut earned: HashMap<(usize, usize), U256> = HashMap::new();
        let mut rates: HashMap<(usize, usize), U256> = HashMap::new();

        for (key, outcome) in plan.execute(&self.gateway).await? {
            match key {
                DirectRead::Symbol(token) => {
                    if let Some(symbol) = read_text(&outcome, token, "symbol") {
                        symbols.insert(token, symbol);
                    }
                }
                DirectRead::Decimals(token) => {
                    if let Some(d) = read_uint(&outcome, token, "decimals").and_then(|d| u8::try_from(d).ok()) {
                        decimals.insert(token, d);
                    }
                }
                DirectRead::Earned(pi, ti) => {
                    if let Some(amount) = read_uint(&outcome, active[pi].gauge.address, "earned") {
                        earned.insert((pi, ti), amount);
                    }
                }
                DirectRead::Rate(pi, ti) => {
                    if let Some(rate) = read_uint(&outcome, active[pi].gauge.address, "rewardRate") {
                        rates.insert((pi, ti), rate);
                    }
                }
            }
        }

        let mut collector = DirectRewardCollector::new(account);
        for (pi, tokens) in pool_tokens.iter().enumerate() {
            let entry = &active[pi];
            let mut emissions = Vec::with_capacity(tokens.len());
            for (ti, address) in tokens.iter().enumerate() {
                let Some(token) = self.token_metadata(*address, &symbols, &decimals) else {
                    debug!(token = %address, "reward token metadata unavailable, skipping");
                    continue;
                };
                let rate = rates.get(&(pi, ti)).copied().unwrap_or(U256::ZERO);
                let token = token.with_daily_emission(rate.saturating_mul(U256::from(SECONDS_PER_DAY)));
                if let Some(&amount) = earned.get(&(pi, ti)) {
                    collector.ingest(
                        entry.pool.address,
                        &entry.symbol,
                        entry.gauge.address,
                        EarnedEntry::new(token.clone(), amount),
                    );
                }
                emissions.push(token);
            }
            collector.record_emissions(entry.pool.address, emissions);
        }
        Ok(collector.finish())
    }

    fn token_metadata(
        &self,
        address: Address,
        symbols: &HashMap<Address, String>,
        decimals: &HashMap<Address, u8>,
    ) -> Option<RewardToken> {
        if let Some(known) = self.known_tokens.get(&address) {
            return Some(known.clone());
        }
        let symbol = symbols.get(&address)?;
        let decimals = *decimals.get(&address)?;
        Some(RewardToken::new(address, symbol.clone(), decimals))
    }
}
