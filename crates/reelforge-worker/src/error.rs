//! Error types for reelforge-worker.

use std::path::PathBuf;
use std::time::Duration;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, WorkerError>;

/// Errors that can occur while invoking an external worker process.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    /// The worker process could not be started.
    #[error("failed to spawn worker {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker exited with a nonzero status.
    #[error("worker exited with {code}: {stderr}")]
    Exit { code: String, stderr: String },

    /// The worker exited cleanly but its stdout did not match the wire format.
    #[error("failed to parse worker output: {message}")]
    Parse { message: String },

    /// The worker did not finish within the invocation deadline.
    #[error("worker timed out after {:?}", deadline)]
    Timeout { deadline: Duration },

    /// The invocation was cancelled by the caller.
    #[error("worker invocation cancelled")]
    Cancelled,

    /// An I/O error occurred while communicating with the worker.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to serialize the payload for the worker.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    /// Create a spawn error.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create an exit error from a process status and captured stderr.
    ///
    /// Stderr is collapsed to its last non-empty line and capped so the
    /// message stays safe to surface to callers.
    pub fn exit(status: std::process::ExitStatus, stderr: &str) -> Self {
        let code = match status.code() {
            Some(code) => format!("status {code}"),
            None => "signal".to_string(),
        };
        Self::Exit {
            code,
            stderr: summarize_stderr(stderr),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }
}

/// Reduce a stderr capture to one short line suitable for a job's
/// `last_error` field.
fn summarize_stderr(stderr: &str) -> String {
    const MAX_LEN: usize = 200;

    let line = stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("")
        .trim();

    if line.is_empty() {
        return "(no stderr)".to_string();
    }
    if line.len() > MAX_LEN {
        let cut = line
            .char_indices()
            .take_while(|(i, _)| *i < MAX_LEN)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        format!("{}...", &line[..cut])
    } else {
        line.to_string()
    }
}
