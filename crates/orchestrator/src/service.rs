//! The orchestrator: plan, enqueue, then drive each job to a terminal status.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use vedex_core::{Address, TxHash};
use vedex_lifecycle::{GroupId, JobId, NewJob, TransactionStore};

use crate::call::WriteCall;
use crate::plan::{Plan, PlanStep, WriteIntent};
use crate::wallet::{ReceiptStatus, ReceiptWatcher, SendError, WalletSigner};
use crate::Result;

const SIMULATION_FALLBACK: &str = "simulation reverted";
const SEND_FALLBACK: &str = "transaction could not be sent";
const RECEIPT_FALLBACK: &str = "transaction reverted";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Voter contract that bribe claims are sent to.
    pub voter: Option<Address>,
}

/// How a single job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Confirmed(TxHash),
    /// Nothing needed signing.
    Done,
    Rejected(String),
    /// An earlier stage did not settle; the job was left in WAITING.
    Skipped,
}

impl JobOutcome {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Confirmed(_) | Self::Done)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReport {
    pub group: GroupId,
    /// One entry per job, in plan order.
    pub outcomes: Vec<(JobId, JobOutcome)>,
}

impl SubmissionReport {
    pub fn all_settled(&self) -> bool {
        self.outcomes.iter().all(|(_, o)| o.is_settled())
    }

    pub fn outcome(&self, id: &JobId) -> Option<&JobOutcome> {
        self.outcomes.iter().find(|(j, _)| j == id).map(|(_, o)| o)
    }
}

pub struct Orchestrator {
    store: Arc<TransactionStore>,
    signer: Arc<dyn WalletSigner>,
    watcher: Arc<dyn ReceiptWatcher>,
    config: OrchestratorConfig,
    session: u32,
    counter: AtomicU64,
}

impl Orchestrator {
    pub fn new(
        store: Arc<TransactionStore>,
        signer: Arc<dyn WalletSigner>,
        watcher: Arc<dyn ReceiptWatcher>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            signer,
            watcher,
            config,
            session: rand::random(),
            counter: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &Arc<TransactionStore> {
        &self.store
    }

    /// Plan `intent`, enqueue one job per call in a single group, and run the
    /// stages in order. Returns once every job is terminal or skipped.
    ///
    /// Simulation, signature and receipt failures end up as REJECTED jobs in
    /// the report; only lifecycle invariant violations are returned as errors.
    pub async fn submit(&self, intent: WriteIntent) -> Result<SubmissionReport> {
        let plan = Plan::build(intent, self.config.voter)?;

        let stages: Vec<Vec<(JobId, PlanStep)>> = plan
            .stages
            .into_iter()
            .map(|stage| stage.into_iter().map(|step| (self.next_id(), step)).collect())
            .collect();
        let jobs = stages
            .iter()
            .flatten()
            .map(|(id, step)| NewJob::new(id.clone(), step.description()))
            .collect();
        let group = self.store.enqueue(plan.title.clone(), jobs)?;
        info!(group = %group.id, title = %plan.title, stages = stages.len(), "submitting write intent");

        let mut outcomes = Vec::with_capacity(group.jobs.len());
        let mut settled = true;
        for (index, stage) in stages.into_iter().enumerate() {
            if !settled {
                debug!(group = %group.id, stage = index, "previous stage did not settle, skipping");
                outcomes.extend(stage.into_iter().map(|(id, _)| (id, JobOutcome::Skipped)));
                continue;
            }

            let results = join_all(stage.into_iter().map(|(id, step)| async move {
                let outcome = self.run_step(&id, step).await;
                outcome.map(|o| (id, o))
            }))
            .await;

            for result in results {
                let (id, outcome) = result?;
                settled &= outcome.is_settled();
                outcomes.push((id, outcome));
            }
        }

        Ok(SubmissionReport {
            group: group.id,
            outcomes,
        })
    }

    async fn run_step(&self, id: &JobId, step: PlanStep) -> Result<JobOutcome> {
        match step {
            PlanStep::Satisfied { .. } => {
                self.store.mark_done(id)?;
                debug!(job = %id, "precondition already satisfied");
                Ok(JobOutcome::Done)
            }
            PlanStep::Sign(call) => self.run_call(id, call).await,
        }
    }

    async fn run_call(&self, id: &JobId, call: WriteCall) -> Result<JobOutcome> {
        self.store.mark_pending(id)?;

        let prepared = match self.signer.simulate(&call).await {
            Ok(prepared) => prepared,
            Err(revert) => return self.reject(id, revert.reason, SIMULATION_FALLBACK),
        };

        let hash = match self.signer.send(prepared).await {
            Ok(hash) => hash,
            Err(SendError::UserRejected(reason)) => {
                let reason = if reason.trim().is_empty() {
                    "user rejected the request".to_string()
                } else {
                    format!("user rejected: {reason}")
                };
                return self.reject(id, reason, SEND_FALLBACK);
            }
            Err(SendError::Failed(reason)) => return self.reject(id, reason, SEND_FALLBACK),
        };
        self.store.mark_submitted(id, hash)?;
        info!(job = %id, %hash, method = call.method.signature(), "transaction submitted");

        match self.watcher.wait_for_receipt(hash).await {
            Ok(receipt) => match receipt.status {
                ReceiptStatus::Success => {
                    self.store.mark_confirmed(id, receipt.hash)?;
                    info!(job = %id, hash = %receipt.hash, "transaction confirmed");
                    Ok(JobOutcome::Confirmed(receipt.hash))
                }
                ReceiptStatus::Reverted { reason } => {
                    self.reject(id, reason.unwrap_or_default(), RECEIPT_FALLBACK)
                }
            },
            Err(e) => self.reject(id, e.to_string(), RECEIPT_FALLBACK),
        }
    }

    fn reject(&self, id: &JobId, reason: String, fallback: &str) -> Result<JobOutcome> {
        let reason = if reason.trim().is_empty() {
            fallback.to_string()
        } else {
            reason
        };
        warn!(job = %id, %reason, "job rejected");
        self.store.mark_rejected(id, reason.clone())?;
        Ok(JobOutcome::Rejected(reason))
    }

    fn next_id(&self) -> JobId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        JobId::new(format!("{:08x}-{n}", self.session))
    }
}
