//! Read-call descriptors and their per-call outcomes.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Read-only contract functions the aggregation core issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadFn {
    /// `earned(address token, uint256 tokenId)` on a bribe, or
    /// `earned(address token, address account)` on a gauge.
    Earned,
    RewardsListLength,
    Rewards,
    RewardRate,
    Claimable,
    Symbol,
    Decimals,
}

impl ReadFn {
    /// Human-readable ABI signature, used for logging and by transports
    /// that encode calldata from it.
    pub fn signature(&self, keyed_by_account: bool) -> &'static str {
        match self {
            Self::Earned if keyed_by_account => "earned(address,address)",
            Self::Earned => "earned(address,uint256)",
            Self::RewardsListLength => "rewardsListLength()",
            Self::Rewards => "rewards(uint256)",
            Self::RewardRate => "rewardRate(address)",
            Self::Claimable => "claimable(uint256)",
            Self::Symbol => "symbol()",
            Self::Decimals => "decimals()",
        }
    }
}

/// A single ABI argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    Address(Address),
    Uint(U256),
}

/// An immutable read request. It has no identity beyond its position in
/// the request list handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub target: Address,
    pub function: ReadFn,
    pub args: Vec<CallArg>,
}

impl CallDescriptor {
    pub fn new(target: Address, function: ReadFn, args: Vec<CallArg>) -> Self {
        Self {
            target,
            function,
            args,
        }
    }

    /// `earned(token, tokenId)` on a bribe contract.
    pub fn bribe_earned(bribe: Address, token: Address, lock_id: U256) -> Self {
        Self::new(
            bribe,
            ReadFn::Earned,
            vec![CallArg::Address(token), CallArg::Uint(lock_id)],
        )
    }

    /// `earned(token, account)` on a gauge.
    pub fn gauge_earned(gauge: Address, token: Address, account: Address) -> Self {
        Self::new(
            gauge,
            ReadFn::Earned,
            vec![CallArg::Address(token), CallArg::Address(account)],
        )
    }

    pub fn rewards_list_length(gauge: Address) -> Self {
        Self::new(gauge, ReadFn::RewardsListLength, vec![])
    }

    pub fn reward_at(gauge: Address, index: u64) -> Self {
        Self::new(gauge, ReadFn::Rewards, vec![CallArg::Uint(U256::from(index))])
    }

    pub fn reward_rate(gauge: Address, token: Address) -> Self {
        Self::new(gauge, ReadFn::RewardRate, vec![CallArg::Address(token)])
    }

    pub fn claimable(distributor: Address, lock_id: U256) -> Self {
        Self::new(distributor, ReadFn::Claimable, vec![CallArg::Uint(lock_id)])
    }

    pub fn symbol(token: Address) -> Self {
        Self::new(token, ReadFn::Symbol, vec![])
    }

    pub fn decimals(token: Address) -> Self {
        Self::new(token, ReadFn::Decimals, vec![])
    }

    /// The ABI signature of this call.
    pub fn signature(&self) -> &'static str {
        let keyed_by_account = matches!(self.args.get(1), Some(CallArg::Address(_)));
        self.function.signature(keyed_by_account)
    }
}

/// A decoded return value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallValue {
    Uint(U256),
    Address(Address),
    Text(String),
}

impl CallValue {
    pub fn as_uint(&self) -> Result<U256, CoreError> {
        match self {
            Self::Uint(v) => Ok(*v),
            other => Err(CoreError::UnexpectedValue {
                expected: "uint",
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn as_address(&self) -> Result<Address, CoreError> {
        match self {
            Self::Address(a) => Ok(*a),
            other => Err(CoreError::UnexpectedValue {
                expected: "address",
                found: format!("{other:?}"),
            }),
        }
    }

    pub fn as_text(&self) -> Result<&str, CoreError> {
        match self {
            Self::Text(s) => Ok(s),
            other => Err(CoreError::UnexpectedValue {
                expected: "text",
                found: format!("{other:?}"),
            }),
        }
    }

    /// Interpret a uint result as a small integer such as `decimals()` or a
    /// list length.
    pub fn as_u64(&self) -> Result<u64, CoreError> {
        let v = self.as_uint()?;
        u64::try_from(v).map_err(|_| CoreError::OutOfRange(v.to_string()))
    }
}

/// Per-call failure marker (e.g. a revert of one call inside a chunk).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    pub reason: String,
}

impl CallFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// The result of one call within a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallOutcome {
    Value(CallValue),
    Failed(CallFailure),
}

impl CallOutcome {
    pub fn value(&self) -> Option<&CallValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Failed(_) => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_earned_signature_depends_on_key() {
        let token = Address::repeat_byte(1);
        let bribe = CallDescriptor::bribe_earned(Address::repeat_byte(2), token, U256::from(7));
        let gauge = CallDescriptor::gauge_earned(Address::repeat_byte(3), token, Address::repeat_byte(4));
        assert_eq!(bribe.signature(), "earned(address,uint256)");
        assert_eq!(gauge.signature(), "earned(address,address)");
    }

    #[test]
    fn test_call_value_accessors() {
        assert_eq!(CallValue::Uint(U256::from(18)).as_u64(), Ok(18));
        assert!(CallValue::Text("USDC".into()).as_uint().is_err());
        assert_eq!(CallValue::Text("USDC".into()).as_text(), Ok("USDC"));
        assert!(CallValue::Uint(U256::MAX).as_u64().is_err());
    }

    #[test]
    fn test_outcome_value() {
        let ok = CallOutcome::Value(CallValue::Uint(U256::from(1)));
        let failed = CallOutcome::Failed(CallFailure::new("execution reverted"));
        assert!(ok.value().is_some());
        assert!(failed.is_failed());
        assert!(failed.value().is_none());
    }
}
