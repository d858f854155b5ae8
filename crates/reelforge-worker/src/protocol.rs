//! The sentinel-delimited result wire format.
//!
//! A worker may log freely to stdout while it runs. Its final act must be to
//! print a line equal to [`RESULT_SENTINEL`] followed by exactly one JSON
//! object. The host takes the *last* sentinel occurrence, so a worker that
//! echoes its own protocol while debugging still parses.

use serde::{Deserialize, Serialize};

use crate::error::WorkerError;

/// Line that separates worker log output from the final JSON report.
pub const RESULT_SENTINEL: &str = "###RESULT###";

/// The structured result a worker reports on completion.
///
/// `success: false` with exit code 0 is a *domain* failure (e.g. "ffmpeg
/// missing"), not a protocol violation; the caller decides what to do with
/// it. Capability-specific fields (`path`, `duration`, ...) land in `extra`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    /// Whether the worker accomplished its task.
    pub success: bool,

    /// Human-readable failure description when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Capability-specific fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl WorkerReport {
    /// Fetch a string field from the capability-specific section.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }

    /// The output path reported by the worker, if any.
    ///
    /// Workers report produced artifacts under a `path` key.
    pub fn path(&self) -> Option<&str> {
        self.field_str("path")
    }

    /// The failure message, falling back to a generic one.
    pub fn error_message(&self) -> String {
        self.error
            .clone()
            .unwrap_or_else(|| "worker reported failure without a message".to_string())
    }
}

/// Parse a buffered stdout capture into a [`WorkerReport`].
///
/// Everything after the last [`RESULT_SENTINEL`] line must be a single JSON
/// object. A missing sentinel or trailing garbage is a
/// [`WorkerError::Parse`].
pub fn parse_report(stdout: &str) -> Result<WorkerReport, WorkerError> {
    let marker = stdout
        .lines()
        .enumerate()
        .filter(|(_, line)| line.trim() == RESULT_SENTINEL)
        .map(|(i, _)| i)
        .last()
        .ok_or_else(|| WorkerError::parse(format!("missing {RESULT_SENTINEL} sentinel line")))?;

    let body: String = stdout
        .lines()
        .skip(marker + 1)
        .collect::<Vec<_>>()
        .join("\n");

    if body.trim().is_empty() {
        return Err(WorkerError::parse("no JSON report after sentinel"));
    }

    serde_json::from_str(body.trim())
        .map_err(|e| WorkerError::parse(format!("invalid JSON report: {e}")))
}
