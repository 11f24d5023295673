//! The capability set every scheduler backend provides.

use crate::types::{GlobalState, JobRecord, Status, SubmitOutcome, TrackOutcome};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no job description could be built for a submit batch")]
    UnbuildableJdl,
}

/// One scheduler backend: submit, track, complete, kill, plus the static
/// status table.
///
/// Job records are borrowed mutably for the duration of a call; backends
/// update them in place and refer to them by id in the returned partitions.
#[allow(async_fn_in_trait)]
pub trait BatchPlugin {
    /// Map a canonical status name to its global state.
    fn state_map(status: Status) -> GlobalState {
        status.global_state()
    }

    /// Submit jobs, returning id partitions of confirmed and failed
    /// submissions. Jobs in neither partition were left unclassified this
    /// cycle and are retried implicitly by the caller.
    async fn submit(&mut self, jobs: &mut [JobRecord]) -> Result<SubmitOutcome, PluginError>;

    /// Reconcile job records against live scheduler state. `jobid` must be
    /// unique across the records passed to one call.
    async fn track(&mut self, jobs: &mut [JobRecord]) -> Result<TrackOutcome, PluginError>;

    /// Completion bookkeeping. Per-job inconsistencies are logged and
    /// skipped, never fatal to the batch.
    async fn complete(&self, jobs: &[JobRecord]);

    /// Force removal from the scheduler, one synchronous command per job.
    async fn kill(&self, jobs: &[JobRecord]);

    /// Release any resources held on behalf of the backend.
    async fn close(&mut self);
}
