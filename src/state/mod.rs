//! Application events broadcast over a tokio channel.
//!
//! Every mutation the orchestrator performs is mirrored as an [`AppEvent`] so
//! observers (a CLI progress display, an HTTP push layer) can follow job
//! lifecycles without polling the store.

use reelforge_common::{JobId, StageKind};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::store::Job;

/// Default capacity of the event channel.
///
/// Slow subscribers that fall more than this far behind lose events; the
/// store remains the source of truth.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Events emitted during job lifecycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A job record was created and persisted as a draft.
    JobQueued {
        #[serde(flatten)]
        job: Job,
    },

    /// A pipeline stage started for a job.
    JobStageStarted { id: JobId, stage: StageKind },

    /// Job progress advanced.
    JobProgress { id: JobId, progress: u8, stage: StageKind },

    /// A job finished with a rendered output.
    JobCompleted {
        #[serde(flatten)]
        job: Job,
    },

    /// A job failed or was cancelled.
    JobFailed { id: JobId, error: String },
}

impl AppEvent {
    pub fn job_queued(job: Job) -> Self {
        Self::JobQueued { job }
    }

    pub fn stage_started(id: JobId, stage: StageKind) -> Self {
        Self::JobStageStarted { id, stage }
    }

    pub fn progress(id: JobId, progress: u8, stage: StageKind) -> Self {
        Self::JobProgress { id, progress, stage }
    }

    pub fn completed(job: Job) -> Self {
        Self::JobCompleted { job }
    }

    pub fn failed(id: JobId, error: impl Into<String>) -> Self {
        Self::JobFailed {
            id,
            error: error.into(),
        }
    }
}

/// Create the application event channel.
pub fn event_channel() -> (broadcast::Sender<AppEvent>, broadcast::Receiver<AppEvent>) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
