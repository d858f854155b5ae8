//! Spawning and supervising a single worker process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Result, WorkerError};
use crate::protocol::{parse_report, WorkerReport};

/// One invocation of an external worker.
///
/// Ephemeral: built by the caller for a single [`WorkerInvoker::invoke`] call
/// and dropped when the invocation resolves. The payload is delivered as one
/// JSON object on the worker's stdin, never spliced into the command line.
#[derive(Debug, Clone)]
pub struct WorkerTask {
    /// Program to execute (interpreter or binary).
    pub program: PathBuf,
    /// Arguments, typically the worker script path.
    pub args: Vec<String>,
    /// JSON payload written to the worker's stdin.
    pub payload: serde_json::Value,
}

impl WorkerTask {
    pub fn new(
        program: impl Into<PathBuf>,
        args: Vec<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            program: program.into(),
            args,
            payload,
        }
    }
}

/// Launches one external process per call and collects its sentinel-delimited
/// report.
///
/// Both the deadline and the cancel handle kill the in-flight process; an
/// external worker must never be able to hang a pipeline stage indefinitely.
#[derive(Debug, Clone)]
pub struct WorkerInvoker {
    deadline: Duration,
}

impl WorkerInvoker {
    /// Create an invoker with the given per-invocation deadline.
    pub fn new(deadline: Duration) -> Self {
        Self { deadline }
    }

    /// The configured per-invocation deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Run one worker to completion and parse its report.
    ///
    /// Exactly one process is spawned. On success the buffered stdout is
    /// parsed per the wire format; nonzero exit yields [`WorkerError::Exit`]
    /// with a summarized stderr capture. Cancellation and the deadline both
    /// terminate the child process.
    pub async fn invoke(
        &self,
        task: &WorkerTask,
        cancel: &CancellationToken,
    ) -> Result<WorkerReport> {
        debug!(program = %task.program.display(), args = ?task.args, "spawning worker");

        let mut child = Command::new(&task.program)
            .args(&task.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WorkerError::spawn(&task.program, e))?;

        if let Some(mut stdin) = child.stdin.take() {
            let body = serde_json::to_vec(&task.payload)?;
            // A worker that exits before draining stdin surfaces through its
            // exit status, not through this write.
            if let Err(e) = stdin.write_all(&body).await {
                debug!(error = %e, "worker closed stdin early");
            }
        }

        let wait = child.wait_with_output();
        tokio::pin!(wait);

        tokio::select! {
            _ = cancel.cancelled() => {
                // Dropping the wait future kills the child (kill_on_drop).
                Err(WorkerError::Cancelled)
            }
            res = tokio::time::timeout(self.deadline, &mut wait) => match res {
                Err(_) => Err(WorkerError::Timeout { deadline: self.deadline }),
                Ok(Err(e)) => Err(WorkerError::Io(e)),
                Ok(Ok(output)) => {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    if !output.status.success() {
                        return Err(WorkerError::exit(output.status, &stderr));
                    }
                    let stdout = String::from_utf8_lossy(&output.stdout);
                    parse_report(&stdout)
                }
            }
        }
    }
}
