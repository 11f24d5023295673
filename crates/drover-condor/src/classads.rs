//! Query live job state via condor_q.
//!
//! The query asks for a fixed three-field custom format per job:
//!
//! ```text
//! (JobStatus:<v>)  (stateTime:<v>)  (WMAgentID:<v>):::
//! ```
//!
//! `:::` delimits records, `(name:value)` delimits fields. The parser is a
//! small strict decoder: a garbled record is a recoverable case and is
//! skipped without giving up on the rest of the stream.

use drover_core::Status;
use std::collections::HashMap;
use std::time::Duration;
use tokio::process::Command;

/// Record delimiter in the query output.
const RECORD_DELIMITER: &str = ":::";

/// Live scheduler attributes for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassAd {
    /// Raw numeric scheduler state.
    pub job_status: i32,
    /// Unix timestamp at which the job entered its current state.
    pub state_time: i64,
}

/// Map the scheduler's numeric job state to the canonical vocabulary.
///
/// State 6 is transferring output; it is listed as running because it fits.
pub fn status_from_code(code: i32) -> Status {
    match code {
        1 => Status::Idle,
        5 => Status::Held,
        2 | 6 => Status::Running,
        3 => Status::Error,
        4 => Status::Complete,
        other => {
            tracing::info!("job in unknown scheduler state {}", other);
            Status::Unknown
        }
    }
}

/// Parse the delimited query output into a correlation-id keyed map.
pub fn parse_class_ads(raw: &str) -> HashMap<i64, ClassAd> {
    let mut ads = HashMap::new();

    for record in raw.split(RECORD_DELIMITER) {
        if !record.contains('(') {
            continue;
        }
        let mut job_status: Option<i32> = None;
        let mut state_time: Option<i64> = None;
        let mut correlation: Option<i64> = None;

        for statement in record.split('(') {
            let Some((key, rest)) = statement.split_once(':') else {
                continue;
            };
            let value = rest.split(')').next().unwrap_or("").trim();
            match key.trim() {
                "JobStatus" => job_status = value.parse().ok(),
                "stateTime" => state_time = value.parse().ok(),
                "WMAgentID" => correlation = value.parse().ok(),
                _ => {}
            }
        }

        let Some(jobid) = correlation else {
            tracing::error!("classad record without a usable correlation id: {:?}", record);
            continue;
        };
        ads.insert(
            jobid,
            ClassAd {
                job_status: job_status.unwrap_or(0),
                state_time: state_time.unwrap_or(0),
            },
        );
    }

    ads
}

/// Query the scheduler for every job belonging to `agent`.
///
/// Returns `None` when the query tool failed and nothing is known this
/// cycle; a successful query that found zero jobs returns an empty map.
/// Callers must keep the two apart, they demand different reconciliation.
pub async fn query_class_ads(
    query_command: &str,
    agent: &str,
    timeout: Duration,
) -> Option<HashMap<i64, ClassAd>> {
    let agent_constraint = format!("WMAgent_AgentName == \"{}\"", agent);
    let mut cmd = Command::new(query_command);
    cmd.args([
        "-constraint",
        "WMAgent_JobID =!= UNDEFINED",
        "-constraint",
        &agent_constraint,
        "-format",
        "(JobStatus:%s)  ",
        "JobStatus",
        "-format",
        "(stateTime:%s)  ",
        "EnteredCurrentStatus",
        "-format",
        "(WMAgentID:%d):::",
        "WMAgent_JobID",
    ])
    .kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(err)) => {
            tracing::error!("failed to execute {}: {}", query_command, err);
            return None;
        }
        Err(_) => {
            tracing::error!("{} did not finish within {:?}", query_command, timeout);
            return None;
        }
    };

    if !output.status.success() {
        tracing::error!(
            "{} returned non-zero status {:?}, skipping classad processing this cycle",
            query_command,
            output.status.code()
        );
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let ads = parse_class_ads(&stdout);
    tracing::info!("retrieved {} classads", ads.len());
    Some(ads)
}
