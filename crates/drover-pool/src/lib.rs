//! Bounded worker pool for blocking scheduler commands.
//!
//! A fixed set of workers drains a shared input channel and posts one result
//! per work item to a results channel. Workers are fail-stop: a severed
//! channel or an unexpected failure ends the worker after a log line, and an
//! execution failure is converted into a tagged failure result rather than
//! dropped. The pool is rebuilt by closing it and letting the owner respawn
//! lazily; there is no per-worker health check.

use drover_parsers::run_command;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Failure tag posted when a work item arrives without a command.
pub const NO_COMMAND_CODE: &str = "999100";
/// Failure tag posted when command execution itself blows up.
pub const EXEC_CRASH_CODE: &str = "999101";

/// How long `close` waits for each worker before terminating it.
const JOIN_GRACE: Duration = Duration::from_secs(5);

/// One command to run, correlated back to its jobs by `id_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub command: String,
    pub id_list: Vec<i64>,
}

/// Outcome of one work item, tagged with the originating `id_list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkResult {
    pub stdout: String,
    pub stderr: String,
    pub id_list: Vec<i64>,
}

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("input channel to the worker pool is severed: {0}")]
    InputSevered(String),
    #[error("no worker result within {0:?}")]
    ReceiveTimeout(Duration),
    #[error("result channel from the worker pool is severed")]
    ResultSevered,
}

enum PoolMessage {
    Work(WorkItem),
    Stop,
}

/// Fixed-size pool of workers running scheduler commands.
pub struct WorkerPool {
    input: mpsc::UnboundedSender<PoolMessage>,
    results: mpsc::UnboundedReceiver<WorkResult>,
    workers: Vec<JoinHandle<()>>,
    timeout: Duration,
}

impl WorkerPool {
    /// Spawn `n_workers` workers. `timeout` bounds both each command
    /// execution and each [`WorkerPool::collect`] call.
    pub fn spawn(n_workers: usize, timeout: Duration) -> Self {
        let (input_tx, input_rx) = mpsc::unbounded_channel();
        let (result_tx, result_rx) = mpsc::unbounded_channel();
        let shared_rx = Arc::new(Mutex::new(input_rx));

        let mut workers = Vec::with_capacity(n_workers);
        for index in 0..n_workers {
            let input = Arc::clone(&shared_rx);
            let results = result_tx.clone();
            workers.push(tokio::spawn(run_worker(index, input, results, timeout)));
        }

        Self {
            input: input_tx,
            results: result_rx,
            workers,
            timeout,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Enqueue one work item without waiting for execution.
    pub fn enqueue(&self, item: WorkItem) -> Result<(), PoolError> {
        self.input
            .send(PoolMessage::Work(item))
            .map_err(|e| PoolError::InputSevered(e.to_string()))
    }

    /// Receive one result, bounded by the pool timeout. Results arrive in
    /// completion order, not submission order.
    pub async fn collect(&mut self) -> Result<WorkResult, PoolError> {
        match tokio::time::timeout(self.timeout, self.results.recv()).await {
            Ok(Some(result)) => Ok(result),
            Ok(None) => Err(PoolError::ResultSevered),
            Err(_) => Err(PoolError::ReceiveTimeout(self.timeout)),
        }
    }

    /// Send one stop sentinel per worker and join them, terminating any
    /// worker that does not stop within the grace window. Afterwards the
    /// worker set is empty and the owner is expected to respawn lazily.
    pub async fn close(&mut self) {
        for _ in 0..self.workers.len() {
            if self.input.send(PoolMessage::Stop).is_err() {
                tracing::error!("stop sentinel not delivered, workers are already gone");
                break;
            }
        }
        for mut handle in self.workers.drain(..) {
            match tokio::time::timeout(JOIN_GRACE, &mut handle).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => tracing::error!("worker ended abnormally: {}", err),
                Err(_) => {
                    tracing::error!("worker did not stop within {:?}, terminating it", JOIN_GRACE);
                    handle.abort();
                }
            }
        }
    }
}

async fn run_worker(
    index: usize,
    input: Arc<Mutex<mpsc::UnboundedReceiver<PoolMessage>>>,
    results: mpsc::UnboundedSender<WorkResult>,
    timeout: Duration,
) {
    loop {
        let message = {
            let mut rx = input.lock().await;
            rx.recv().await
        };
        let item = match message {
            Some(PoolMessage::Work(item)) => item,
            Some(PoolMessage::Stop) => {
                tracing::debug!("worker {} received stop sentinel", index);
                break;
            }
            None => {
                tracing::error!("worker {}: input channel severed, exiting", index);
                break;
            }
        };

        if item.command.is_empty() {
            let result = WorkResult {
                stdout: String::new(),
                stderr: format!("{}\n Got no command!", NO_COMMAND_CODE),
                id_list: item.id_list,
            };
            if results.send(result).is_err() {
                tracing::error!("worker {}: result channel severed, exiting", index);
                break;
            }
            continue;
        }

        let result = match run_command(&item.command, timeout).await {
            Ok(output) if output.exit_code == 0 => WorkResult {
                stdout: output.stdout,
                stderr: output.stderr,
                id_list: item.id_list,
            },
            Ok(output) => WorkResult {
                stdout: output.stdout,
                stderr: format!(
                    "Non-zero exit code: {}\n stderr: {}",
                    output.exit_code, output.stderr
                ),
                id_list: item.id_list,
            },
            // The worker must not die holding unacknowledged work; the
            // failure travels back as a tagged result instead.
            Err(err) => WorkResult {
                stdout: String::new(),
                stderr: format!("{}\n {}", EXEC_CRASH_CODE, err),
                id_list: item.id_list,
            },
        };
        if results.send(result).is_err() {
            tracing::error!("worker {}: result channel severed, exiting", index);
            break;
        }
    }
}
