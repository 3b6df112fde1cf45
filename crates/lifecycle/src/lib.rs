//! Vedex Transaction Lifecycle Store
//!
//! A constructed registry of write operations ("jobs") and their monotonic
//! status. The orchestrator mutates jobs it created; views read snapshots or
//! subscribe to change events.

pub mod job;
pub mod store;

pub use job::{GroupId, JobGroup, JobId, JobStatus, NewJob, TransactionJob};
pub use store::{StoreEvent, TransactionStore};

use thiserror::Error;

/// Contract violations. These indicate a bug in the caller, never a runtime
/// condition, and are not meant to be swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("duplicate job id: {0}")]
    DuplicateJobId(JobId),
    #[error("unknown job: {0}")]
    UnknownJob(JobId),
    #[error("job {id}: invalid transition {from} -> {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    #[error("job {0}: rejection requires a non-empty reason")]
    EmptyRejectionReason(JobId),
    #[error("cannot enqueue an empty job group")]
    EmptyGroup,
}

pub type Result<T> = std::result::Result<T, LifecycleError>;
