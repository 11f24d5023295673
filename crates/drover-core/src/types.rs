//! Job records and the canonical status vocabulary.

use crate::report::JobReport;
use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Fine-grained job status as reconciled from the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    #[default]
    New,
    Idle,
    Running,
    Held,
    Complete,
    Error,
    Timeout,
    Removed,
    Unknown,
}

/// Coarse four-value state derived from [`Status`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GlobalState {
    #[default]
    Pending,
    Running,
    Error,
    Complete,
}

impl Status {
    /// Every canonical status, in declaration order.
    pub const ALL: [Status; 9] = [
        Status::New,
        Status::Idle,
        Status::Running,
        Status::Held,
        Status::Complete,
        Status::Error,
        Status::Timeout,
        Status::Removed,
        Status::Unknown,
    ];

    /// The canonical status to global state table. Total over every variant;
    /// backends must go through this table instead of mapping inline.
    pub fn global_state(self) -> GlobalState {
        match self {
            Status::New => GlobalState::Pending,
            Status::Idle => GlobalState::Pending,
            Status::Running => GlobalState::Running,
            Status::Held => GlobalState::Error,
            Status::Complete => GlobalState::Complete,
            Status::Error => GlobalState::Error,
            Status::Timeout => GlobalState::Error,
            Status::Removed => GlobalState::Running,
            Status::Unknown => GlobalState::Error,
        }
    }
}

/// One workflow-engine job as seen by a scheduler backend.
///
/// Records are borrowed mutably for the duration of a backend call; the
/// backend updates `status`, `status_time`, `global_state`, and `report`
/// in place and refers to records by id in the returned partitions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Scheduler-agnostic id, unique within one agent instance.
    pub jobid: i64,

    /// Workflow-engine id. May differ from `jobid`.
    pub id: i64,

    #[serde(default)]
    pub status: Status,

    /// Unix timestamp of the last status change.
    #[serde(default)]
    pub status_time: i64,

    /// Packaged input archive transferred with the job.
    pub sandbox: Utf8PathBuf,

    /// Directory owned by the workflow engine where completion reports land.
    #[serde(default)]
    pub cache_dir: Option<Utf8PathBuf>,

    #[serde(default)]
    pub retry_count: Option<u32>,

    /// Site the job is bound to.
    #[serde(default)]
    pub location: Option<String>,

    /// Ordered candidate sites, used when bulk-site submission is enabled.
    #[serde(default)]
    pub possible_sites: Vec<String>,

    /// Raw priority value. Cast to an int at submission; a bad value is
    /// logged and the priority omitted, never fatal.
    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub global_state: GlobalState,

    /// Task type, consulted for multicore routing.
    #[serde(default)]
    pub task_type: Option<String>,

    /// Principal used to delegate a credential for this job.
    #[serde(default)]
    pub user_dn: Option<String>,

    /// Failure report attached when submission is classified as failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<JobReport>,
}

/// Partitions returned by a submit call, as workflow-engine ids.
///
/// Jobs in neither partition were left unclassified this cycle (the worker
/// never reported back) and are retried implicitly by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmitOutcome {
    pub submitted: Vec<i64>,
    pub failed: Vec<i64>,
}

/// Partitions returned by a track call, as scheduler-agnostic job ids.
///
/// A job present in the scheduler snapshot always appears in `running`;
/// `changed` additionally lists jobs whose status moved this cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TrackOutcome {
    pub running: Vec<i64>,
    pub changed: Vec<i64>,
    pub completed: Vec<i64>,
}
