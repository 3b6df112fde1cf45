//! The shared job registry.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info};
use vedex_core::TxHash;

use crate::job::{GroupId, JobGroup, JobId, JobStatus, NewJob, TransactionJob};
use crate::{LifecycleError, Result};

/// Change notifications published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A group of jobs was inserted, all in WAITING.
    Enqueued(JobGroup),
    Transitioned {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
    Cleared,
}

#[derive(Default)]
struct StoreState {
    jobs: Vec<TransactionJob>,
    index: HashMap<JobId, usize>,
    groups: Vec<JobGroup>,
    /// Every id ever enqueued; survives `clear` so ids are never reused.
    used_ids: HashSet<JobId>,
    next_group: u64,
}

/// Registry of in-flight and completed write jobs.
///
/// Constructed explicitly and shared by `Arc`. The lock is held only for
/// the duration of a single update, never across an `.await`.
pub struct TransactionStore {
    state: Mutex<StoreState>,
    events: broadcast::Sender<StoreEvent>,
    snapshot: watch::Sender<Vec<TransactionJob>>,
}

impl TransactionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        let (snapshot, _) = watch::channel(Vec::new());
        Self {
            state: Mutex::new(StoreState::default()),
            events,
            snapshot,
        }
    }

    /// Subscribe to change events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Subscribe to the full job list; the receiver always holds the latest
    /// snapshot.
    pub fn watch_jobs(&self) -> watch::Receiver<Vec<TransactionJob>> {
        self.snapshot.subscribe()
    }

    /// Insert `jobs` in WAITING as one group, atomically.
    ///
    /// Fails without inserting anything if any id repeats within `jobs` or
    /// was ever used before in this store.
    pub fn enqueue(&self, title: impl Into<String>, jobs: Vec<NewJob>) -> Result<JobGroup> {
        if jobs.is_empty() {
            return Err(LifecycleError::EmptyGroup);
        }

        let group = {
            let mut state = self.lock();

            let mut batch_ids = HashSet::new();
            for job in &jobs {
                if state.used_ids.contains(&job.id) || !batch_ids.insert(job.id.clone()) {
                    error!(id = %job.id, "duplicate job id rejected");
                    return Err(LifecycleError::DuplicateJobId(job.id.clone()));
                }
            }

            let group = JobGroup {
                id: GroupId(state.next_group),
                title: title.into(),
                jobs: jobs.iter().map(|j| j.id.clone()).collect(),
            };
            state.next_group += 1;

            for job in jobs {
                let position = state.jobs.len();
                state.used_ids.insert(job.id.clone());
                state.index.insert(job.id.clone(), position);
                state.jobs.push(TransactionJob {
                    id: job.id,
                    group: group.id,
                    description: job.description,
                    status: JobStatus::Waiting,
                    hash: None,
                    error: None,
                });
            }
            state.groups.push(group.clone());
            self.snapshot.send_replace(state.jobs.clone());
            group
        };

        info!(group = %group.id, title = %group.title, jobs = group.jobs.len(), "jobs enqueued");
        let _ = self.events.send(StoreEvent::Enqueued(group.clone()));
        Ok(group)
    }

    /// WAITING -> PENDING: shown to the user before signing.
    pub fn mark_pending(&self, id: &JobId) -> Result<()> {
        self.transition(id, JobStatus::Pending, |_| {})
    }

    /// PENDING -> SUBMITTED: signed and broadcast.
    pub fn mark_submitted(&self, id: &JobId, hash: TxHash) -> Result<()> {
        self.transition(id, JobStatus::Submitted, |job| job.hash = Some(hash))
    }

    /// SUBMITTED -> CONFIRMED: successful receipt observed.
    pub fn mark_confirmed(&self, id: &JobId, hash: TxHash) -> Result<()> {
        self.transition(id, JobStatus::Confirmed, |job| job.hash = Some(hash))
    }

    /// PENDING | SUBMITTED -> REJECTED. `reason` must not be blank.
    pub fn mark_rejected(&self, id: &JobId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        if reason.trim().is_empty() {
            return Err(LifecycleError::EmptyRejectionReason(id.clone()));
        }
        self.transition(id, JobStatus::Rejected, |job| job.error = Some(reason))
    }

    /// WAITING -> DONE: nothing needed signing.
    pub fn mark_done(&self, id: &JobId) -> Result<()> {
        self.transition(id, JobStatus::Done, |_| {})
    }

    pub fn job(&self, id: &JobId) -> Option<TransactionJob> {
        let state = self.lock();
        state.index.get(id).map(|&i| state.jobs[i].clone())
    }

    pub fn status(&self, id: &JobId) -> Option<JobStatus> {
        let state = self.lock();
        state.index.get(id).map(|&i| state.jobs[i].status)
    }

    /// All jobs in insertion order.
    pub fn jobs(&self) -> Vec<TransactionJob> {
        self.lock().jobs.clone()
    }

    pub fn groups(&self) -> Vec<JobGroup> {
        self.lock().groups.clone()
    }

    pub fn group(&self, id: GroupId) -> Option<JobGroup> {
        self.lock().groups.iter().find(|g| g.id == id).cloned()
    }

    /// Jobs that have not reached a terminal status.
    pub fn in_flight(&self) -> Vec<TransactionJob> {
        self.lock()
            .jobs
            .iter()
            .filter(|j| !j.status.is_terminal())
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    /// Drop every job and group. Ids stay reserved.
    pub fn clear(&self) {
        {
            let mut state = self.lock();
            state.jobs.clear();
            state.index.clear();
            state.groups.clear();
            self.snapshot.send_replace(Vec::new());
        }
        info!("job store cleared");
        let _ = self.events.send(StoreEvent::Cleared);
    }

    fn transition(
        &self,
        id: &JobId,
        to: JobStatus,
        apply: impl FnOnce(&mut TransactionJob),
    ) -> Result<()> {
        let from = {
            let mut state = self.lock();
            let position = *state
                .index
                .get(id)
                .ok_or_else(|| LifecycleError::UnknownJob(id.clone()))?;

            let job = &mut state.jobs[position];
            let from = job.status;
            if !from.can_transition_to(to) {
                error!(id = %id, %from, %to, "invalid job transition");
                return Err(LifecycleError::InvalidTransition {
                    id: id.clone(),
                    from,
                    to,
                });
            }
            job.status = to;
            apply(job);

            self.snapshot.send_replace(state.jobs.clone());
            from
        };

        debug!(id = %id, %from, %to, "job transitioned");
        let _ = self.events.send(StoreEvent::Transitioned {
            id: id.clone(),
            from,
            to,
        });
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for TransactionStore {
    fn default() -> Self {
        Self::new()
    }
}
