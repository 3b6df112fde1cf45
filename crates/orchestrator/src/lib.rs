//! Vedex Claim/Write Orchestrator
//!
//! Turns a user intent (approve then act, claim everything, a single write)
//! into an ordered plan of on-chain calls, registers one lifecycle job per
//! call and drives each job through simulate, sign and receipt.

pub mod call;
pub mod plan;
pub mod service;
pub mod wallet;

#[cfg(test)]
mod tests;

pub use call::{Approval, WriteCall, WriteMethod};
pub use plan::{Plan, PlanStep, WriteIntent};
pub use service::{JobOutcome, Orchestrator, OrchestratorConfig, SubmissionReport};
pub use wallet::{
    DryRunWallet, PreparedCall, Receipt, ReceiptStatus, ReceiptWatcher, Revert, SendError,
    WalletSigner,
};

use thiserror::Error;
use vedex_lifecycle::LifecycleError;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    /// The intent decomposed into zero calls; no job was enqueued.
    #[error("nothing to submit")]
    NothingToSubmit,
    #[error("missing configuration: {0}")]
    MissingConfig(&'static str),
    /// The lifecycle store refused an update. Always a bug in the orchestrator.
    #[error("lifecycle invariant violated: {0}")]
    Invariant(#[from] LifecycleError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
