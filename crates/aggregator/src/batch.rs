//! Read plans: keyed call lists that zip back to their keys after a batch.

use tracing::warn;
use vedex_core::{Address, CallDescriptor, CallOutcome, CallValue, U256};
use vedex_gateway::BatchGateway;

use crate::Result;

/// An ordered list of calls, each tagged with a caller-chosen key.
///
/// The gateway guarantees `result[i]` answers `calls[i]`, so executing a plan
/// hands every key back with its own outcome.
#[derive(Debug, Clone)]
pub struct ReadPlan<K> {
    keys: Vec<K>,
    calls: Vec<CallDescriptor>,
}

impl<K> ReadPlan<K> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn push(&mut self, key: K, call: CallDescriptor) {
        self.keys.push(key);
        self.calls.push(call);
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn calls(&self) -> &[CallDescriptor] {
        &self.calls
    }

    /// Run the plan through the gateway. An empty plan issues no reads.
    pub async fn execute(self, gateway: &BatchGateway) -> Result<Vec<(K, CallOutcome)>> {
        if self.calls.is_empty() {
            return Ok(Vec::new());
        }
        let outcomes = gateway.execute(&self.calls).await?;
        Ok(self.keys.into_iter().zip(outcomes).collect())
    }
}

impl<K> Default for ReadPlan<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode a uint outcome; reverts and mistyped values are logged and skipped.
pub(crate) fn read_uint(outcome: &CallOutcome, target: Address, what: &str) -> Option<U256> {
    match outcome {
        CallOutcome::Value(value) => match value.as_uint() {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(target = %target, what, error = %e, "unexpected read result");
                None
            }
        },
        CallOutcome::Failed(failure) => {
            warn!(target = %target, what, reason = %failure.reason, "read reverted");
            None
        }
    }
}

pub(crate) fn read_address(outcome: &CallOutcome, target: Address, what: &str) -> Option<Address> {
    match outcome {
        CallOutcome::Value(value) => match value.as_address() {
            Ok(a) => Some(a),
            Err(e) => {
                warn!(target = %target, what, error = %e, "unexpected read result");
                None
            }
        },
        CallOutcome::Failed(failure) => {
            warn!(target = %target, what, reason = %failure.reason, "read reverted");
            None
        }
    }
}

pub(crate) fn read_text(outcome: &CallOutcome, target: Address, what: &str) -> Option<String> {
    match outcome {
        CallOutcome::Value(CallValue::Text(s)) => Some(s.clone()),
        CallOutcome::Value(other) => {
            warn!(target = %target, what, value = ?other, "unexpected read result");
            None
        }
        CallOutcome::Failed(failure) => {
            warn!(target = %target, what, reason = %failure.reason, "read reverted");
            None
        }
    }
}
