//! Collectors: classify earned reads into category entries, pruning zero
//! amounts and de-duplicating by pool.

use std::collections::HashMap;

use tracing::debug;
use vedex_core::{Address, BribeTier, EarnedEntry, RewardToken, U256};

use crate::categories::{Bribe, BribeClaim, DirectReward};

/// Groups positive bribe reads into one [`Bribe`] per pool, with one
/// [`BribeClaim`] per positive tier.
pub struct BribeCollector {
    lock_id: U256,
    entries: Vec<Bribe>,
    index: HashMap<Address, usize>,
}

impl BribeCollector {
    pub fn new(lock_id: U256) -> Self {
        Self {
            lock_id,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Ingest one earned read. Returns whether the entry was kept.
    pub fn ingest(
        &mut self,
        pool: Address,
        pool_symbol: &str,
        tier: BribeTier,
        bribe: Address,
        entry: EarnedEntry,
    ) -> bool {
        if !entry.is_positive() {
            return false;
        }

        let i = match self.index.get(&pool) {
            Some(&i) => i,
            None => {
                self.index.insert(pool, self.entries.len());
                self.entries.push(Bribe {
                    pool,
                    pool_symbol: pool_symbol.to_string(),
                    lock_id: self.lock_id,
                    tiers: Vec::new(),
                });
                self.entries.len() - 1
            }
        };

        let tiers = &mut self.entries[i].tiers;
        match tiers.iter().position(|c| c.tier == tier) {
            Some(j) => {
                let claim = &mut tiers[j];
                if claim.earned.iter().any(|e| e.token.address == entry.token.address) {
                    debug!(pool = %pool, token = %entry.token.address, "duplicate bribe token ignored");
                    return false;
                }
                claim.earned.push(entry);
            }
            None => {
                tiers.push(BribeClaim {
                    tier,
                    bribe,
                    earned: vec![entry],
                });
                tiers.sort_by_key(|c| c.tier);
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self) -> Vec<Bribe> {
        self.entries
    }
}

/// Promotes pools with at least one positive gauge reward into a single
/// [`DirectReward`] each.
///
/// The first positive token of a pool becomes its representative token;
/// later positive tokens of the same pool are appended to that entry's claim
/// list. Zero amounts are never retained.
pub struct DirectRewardCollector {
    account: Address,
    entries: Vec<DirectReward>,
    index: HashMap<Address, usize>,
}

impl DirectRewardCollector {
    pub fn new(account: Address) -> Self {
        Self {
            account,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Ingest one earned read. Returns whether the entry was kept.
    pub fn ingest(
        &mut self,
        pool: Address,
        pool_symbol: &str,
        gauge: Address,
        entry: EarnedEntry,
    ) -> bool {
        if !entry.is_positive() {
            return false;
        }

        match self.index.get(&pool) {
            Some(&i) => {
                let existing = &mut self.entries[i];
                if existing.earned.iter().any(|e| e.token.address == entry.token.address) {
                    debug!(pool = %pool, token = %entry.token.address, "duplicate reward token ignored");
                    return false;
                }
                existing.earned.push(entry);
            }
            None => {
                self.index.insert(pool, self.entries.len());
                self.entries.push(DirectReward {
                    pool,
                    pool_symbol: pool_symbol.to_string(),
                    gauge,
                    account: self.account,
                    token: entry.token.clone(),
                    earned: vec![entry],
                    emissions: Vec::new(),
                });
            }
        }
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Attach the gauge's full emission set to `pool`, if it was promoted.
    pub fn record_emissions(&mut self, pool: Address, tokens: Vec<RewardToken>) {
        if let Some(&i) = self.index.get(&pool) {
            self.entries[i].emissions = tokens;
        }
    }

    pub fn finish(self) -> Vec<DirectReward> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(byte: u8, amount: u64) -> EarnedEntry {
        EarnedEntry::new(
            RewardToken::new(Address::repeat_byte(byte), format!("T{byte}"), 18),
            U256::from(amount),
        )
    }

    #[test]
    fn test_direct_reward_first_positive_is_representative() {
        let pool = Address::repeat_byte(1);
        let gauge = Address::repeat_byte(2);
        let mut collector = DirectRewardCollector::new(Address::repeat_byte(3));

        assert!(!collector.ingest(pool, "P", gauge, entry(10, 0)));
        assert!(collector.ingest(pool, "P", gauge, entry(11, 7)));
        assert!(collector.ingest(pool, "P", gauge, entry(12, 9)));

        let rewards = collector.finish();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].token.address, Address::repeat_byte(11));
        assert_eq!(
            rewards[0].token_addresses(),
            vec![Address::repeat_byte(11), Address::repeat_byte(12)]
        );
    }

    #[test]
    fn test_direct_reward_same_pool_twice_is_one_entry() {
        let pool = Address::repeat_byte(1);
        let gauge = Address::repeat_byte(2);
        let mut collector = DirectRewardCollector::new(Address::repeat_byte(3));

        collector.ingest(pool, "P", gauge, entry(10, 1));
        assert!(!collector.ingest(pool, "P", gauge, entry(10, 1)));
        collector.ingest(pool, "P", gauge, entry(11, 1));

        assert_eq!(collector.len(), 1);
        assert_eq!(collector.finish()[0].earned.len(), 2);
    }

    #[test]
    fn test_bribe_tiers_of_one_pool_share_an_entry() {
        let pool = Address::repeat_byte(1);
        let mut collector = BribeCollector::new(U256::from(5));

        collector.ingest(pool, "P", BribeTier::B, Address::repeat_byte(21), entry(11, 4));
        collector.ingest(pool, "P", BribeTier::B, Address::repeat_byte(21), entry(10, 0));
        collector.ingest(pool, "P", BribeTier::A, Address::repeat_byte(20), entry(10, 1));
        assert!(!collector.ingest(pool, "P", BribeTier::A, Address::repeat_byte(20), entry(10, 1)));

        let bribes = collector.finish();
        assert_eq!(bribes.len(), 1);
        assert_eq!(bribes[0].lock_id, U256::from(5));
        let tiers: Vec<BribeTier> = bribes[0].tiers.iter().map(|c| c.tier).collect();
        assert_eq!(tiers, vec![BribeTier::A, BribeTier::B]);
        assert_eq!(bribes[0].tier(BribeTier::B).unwrap().earned.len(), 1);
        assert_eq!(bribes[0].tier(BribeTier::A).unwrap().bribe, Address::repeat_byte(20));
        assert_eq!(bribes[0].earned().count(), 2);
    }

    #[test]
    fn test_emissions_only_for_promoted_pools() {
        let gauge = Address::repeat_byte(2);
        let mut collector = DirectRewardCollector::new(Address::repeat_byte(3));
        collector.ingest(Address::repeat_byte(1), "P", gauge, entry(10, 1));

        let rated = entry(11, 0).token.with_daily_emission(U256::from(86_400));
        collector.record_emissions(Address::repeat_byte(1), vec![rated.clone()]);
        collector.record_emissions(Address::repeat_byte(9), vec![rated.clone()]);

        let rewards = collector.finish();
        assert_eq!(rewards.len(), 1);
        assert_eq!(rewards[0].emissions, vec![rated]);
    }

    #[test]
    fn test_all_zero_yields_nothing() {
        let mut collector = BribeCollector::new(U256::from(5));
        collector.ingest(Address::repeat_byte(1), "P", BribeTier::A, Address::repeat_byte(20), entry(10, 0));
        assert!(collector.is_empty());
    }
}
