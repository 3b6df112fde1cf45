//! Jobs, job groups and the status state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use vedex_core::TxHash;

/// Caller-assigned opaque job identifier, unique for the store's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Job status.
///
/// ```text
/// WAITING   -> PENDING | DONE
/// PENDING   -> SUBMITTED | REJECTED
/// SUBMITTED -> CONFIRMED | REJECTED
/// ```
/// CONFIRMED, REJECTED and DONE are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Waiting,
    Pending,
    Submitted,
    Confirmed,
    Rejected,
    Done,
}

impl JobStatus {
    pub fn can_transition_to(self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Waiting, Pending)
                | (Waiting, Done)
                | (Pending, Submitted)
                | (Pending, Rejected)
                | (Submitted, Confirmed)
                | (Submitted, Rejected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Done)
    }

    /// Terminal and successful: the job's effect is in place.
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Confirmed | Self::Done)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Pending => "PENDING",
            Self::Submitted => "SUBMITTED",
            Self::Confirmed => "CONFIRMED",
            Self::Rejected => "REJECTED",
            Self::Done => "DONE",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A job as handed to [`crate::TransactionStore::enqueue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub id: JobId,
    pub description: String,
}

impl NewJob {
    pub fn new(id: JobId, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// One tracked on-chain write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionJob {
    pub id: JobId,
    pub group: GroupId,
    pub description: String,
    pub status: JobStatus,
    pub hash: Option<TxHash>,
    pub error: Option<String>,
}

/// Jobs belonging to one user-initiated action. Ordering is for display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobGroup {
    pub id: GroupId,
    pub title: String,
    pub jobs: Vec<JobId>,
}
