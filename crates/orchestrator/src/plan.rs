//! Decomposing write intents into ordered stages of calls.

use serde::{Deserialize, Serialize};
use vedex_aggregator::{Bribe, ClaimableRewards, DirectReward, Distribution};
use vedex_core::{Address, U256};

use crate::call::{Approval, WriteCall};
use crate::{OrchestratorError, Result};

/// A validated user request that needs one or more on-chain writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteIntent {
    /// Ensure an allowance, then run the dependent action.
    ApproveThenAct { approval: Approval, action: WriteCall },
    /// Claim every category in one go.
    ClaimAll(ClaimableRewards),
    ClaimBribes(Vec<Bribe>),
    ClaimReward(DirectReward),
    ClaimDistribution(Distribution),
    /// A stake, vote, lock or swap with no prerequisite.
    Single(WriteCall),
}

/// One job's worth of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Needs a signature.
    Sign(WriteCall),
    /// Precondition already holds; the job goes straight to DONE.
    Satisfied { description: String },
}

impl PlanStep {
    pub fn description(&self) -> &str {
        match self {
            Self::Sign(call) => &call.description,
            Self::Satisfied { description } => description,
        }
    }
}

/// Ordered stages of independent steps. Stage `n + 1` runs only once every
/// step of stage `n` has settled successfully.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub title: String,
    pub stages: Vec<Vec<PlanStep>>,
}

impl Plan {
    /// Build the plan for `intent`. `voter` is the contract bribe claims go
    /// through; it is only required when there are bribes to claim.
    pub fn build(intent: WriteIntent, voter: Option<Address>) -> Result<Self> {
        let (title, stages) = match intent {
            WriteIntent::ApproveThenAct { approval, action } => {
                let approve = if approval.is_satisfied() {
                    PlanStep::Satisfied {
                        description: format!("Approve {}", approval.symbol),
                    }
                } else {
                    PlanStep::Sign(approval.to_call())
                };
                let title = action.description.clone();
                (title, vec![vec![approve], vec![PlanStep::Sign(action)]])
            }
            WriteIntent::ClaimAll(claimable) => {
                let mut calls = bribe_claims(&claimable.bribes, voter)?;
                calls.extend(claimable.rewards.iter().map(WriteCall::get_reward));
                calls.extend(claimable.distribution.iter().map(WriteCall::claim_distribution));
                ("Claim all rewards".to_string(), vec![sign_all(calls)])
            }
            WriteIntent::ClaimBribes(bribes) => {
                let calls = bribe_claims(&bribes, voter)?;
                ("Claim bribes".to_string(), vec![sign_all(calls)])
            }
            WriteIntent::ClaimReward(reward) => {
                let call = WriteCall::get_reward(&reward);
                (call.description.clone(), vec![vec![PlanStep::Sign(call)]])
            }
            WriteIntent::ClaimDistribution(distribution) => {
                let call = WriteCall::claim_distribution(&distribution);
                (call.description.clone(), vec![vec![PlanStep::Sign(call)]])
            }
            WriteIntent::Single(call) => (call.description.clone(), vec![vec![PlanStep::Sign(call)]]),
        };

        let stages: Vec<Vec<PlanStep>> = stages.into_iter().filter(|s| !s.is_empty()).collect();
        if stages.is_empty() {
            return Err(OrchestratorError::NothingToSubmit);
        }
        Ok(Self { title, stages })
    }

    /// Total number of steps, one job each.
    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn sign_all(calls: Vec<WriteCall>) -> Vec<PlanStep> {
    calls.into_iter().map(PlanStep::Sign).collect()
}

/// One voter call per lock id, in first-seen order. Aggregation only ever
/// produces a single lock id, so this is normally at most one call.
fn bribe_claims(bribes: &[Bribe], voter: Option<Address>) -> Result<Vec<WriteCall>> {
    if bribes.is_empty() {
        return Ok(Vec::new());
    }
    let voter = voter.ok_or(OrchestratorError::MissingConfig("voter"))?;

    let mut by_lock: Vec<(U256, Vec<&Bribe>)> = Vec::new();
    for bribe in bribes {
        match by_lock.iter_mut().find(|(id, _)| *id == bribe.lock_id) {
            Some((_, group)) => group.push(bribe),
            None => by_lock.push((bribe.lock_id, vec![bribe])),
        }
    }
    Ok(by_lock
        .into_iter()
        .map(|(lock_id, group)| WriteCall::claim_bribes(voter, lock_id, &group))
        .collect())
}
