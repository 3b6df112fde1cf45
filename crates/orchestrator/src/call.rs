//! State-changing contract calls.

use serde::{Deserialize, Serialize};
use vedex_aggregator::{Bribe, DirectReward, Distribution};
use vedex_core::{Address, CallArg, U256};

/// The write functions the orchestrator knows how to build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMethod {
    /// `approve(address spender, uint256 amount)` on an ERC-20.
    Approve { spender: Address, amount: U256 },
    /// `getReward(address account, address[] tokens)` on a gauge.
    GetReward {
        account: Address,
        tokens: Vec<Address>,
    },
    /// `claimBribes(address[] bribes, address[][] tokens, uint256 tokenId)` on the voter.
    ClaimBribes {
        bribes: Vec<Address>,
        tokens: Vec<Vec<Address>>,
        lock_id: U256,
    },
    /// `claim(uint256 tokenId)` on the rebase distributor.
    ClaimDistribution { lock_id: U256 },
    /// Any other write (stake, vote, lock, swap), encoded by the wallet.
    Other {
        signature: String,
        args: Vec<CallArg>,
        #[serde(default)]
        value: U256,
    },
}

impl WriteMethod {
    pub fn signature(&self) -> &str {
        match self {
            Self::Approve { .. } => "approve(address,uint256)",
            Self::GetReward { .. } => "getReward(address,address[])",
            Self::ClaimBribes { .. } => "claimBribes(address[],address[][],uint256)",
            Self::ClaimDistribution { .. } => "claim(uint256)",
            Self::Other { signature, .. } => signature,
        }
    }
}

/// One on-chain write, tracked as one lifecycle job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCall {
    pub target: Address,
    pub method: WriteMethod,
    /// Shown to the user next to the job status.
    pub description: String,
}

impl WriteCall {
    pub fn new(target: Address, method: WriteMethod, description: impl Into<String>) -> Self {
        Self {
            target,
            method,
            description: description.into(),
        }
    }

    pub fn approve(token: Address, spender: Address, amount: U256, symbol: &str) -> Self {
        Self::new(
            token,
            WriteMethod::Approve { spender, amount },
            format!("Approve {symbol}"),
        )
    }

    /// Claim every tier of every bribe in `bribes` in a single voter call,
    /// one `bribes[]`/`tokens[][]` slot per tier. All entries are expected to
    /// share one lock id.
    pub fn claim_bribes(voter: Address, lock_id: U256, bribes: &[&Bribe]) -> Self {
        let (contracts, tokens): (Vec<Address>, Vec<Vec<Address>>) = bribes
            .iter()
            .flat_map(|b| b.tiers.iter())
            .map(|c| (c.bribe, c.earned.iter().map(|e| e.token.address).collect::<Vec<_>>()))
            .unzip();
        Self::new(
            voter,
            WriteMethod::ClaimBribes {
                bribes: contracts,
                tokens,
                lock_id,
            },
            format!("Claim bribes for lock #{lock_id}"),
        )
    }

    pub fn get_reward(reward: &DirectReward) -> Self {
        Self::new(
            reward.gauge,
            WriteMethod::GetReward {
                account: reward.account,
                tokens: reward.token_addresses(),
            },
            format!("Claim {} rewards", reward.pool_symbol),
        )
    }

    pub fn claim_distribution(distribution: &Distribution) -> Self {
        Self::new(
            distribution.distributor,
            WriteMethod::ClaimDistribution {
                lock_id: distribution.lock_id,
            },
            format!("Claim rebase for lock #{}", distribution.lock_id),
        )
    }
}

/// An ERC-20 allowance that must be in place before the dependent action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub token: Address,
    pub symbol: String,
    pub spender: Address,
    pub amount: U256,
    /// Allowance read by the caller just before submitting.
    pub current_allowance: U256,
}

impl Approval {
    pub fn is_satisfied(&self) -> bool {
        self.current_allowance >= self.amount
    }

    pub fn to_call(&self) -> WriteCall {
        WriteCall::approve(self.token, self.spender, self.amount, &self.symbol)
    }
}
