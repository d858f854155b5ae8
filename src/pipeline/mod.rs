//! The reel generation pipeline.
//!
//! [`PipelineOrchestrator`] owns the public job API (create, run, cancel,
//! delete, subscribe); [`StageRunner`] executes the fixed stage sequence
//! (script, voice, caption, render) for one job, persisting progress after
//! every checkpoint.

mod orchestrator;
mod runner;

pub use orchestrator::PipelineOrchestrator;
pub use runner::{StagePaths, StageRunner};

use reelforge_common::JobId;

use crate::store::{JobStage, StoreError};

/// Errors surfaced by the pipeline API.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// No job record exists for the given id.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// The job already holds a run lease.
    #[error("job {id} is already running")]
    AlreadyRunning { id: JobId },

    /// The job is not in a stage the pipeline can start from.
    #[error("job {id} cannot run from stage {stage}")]
    NotRunnable { id: JobId, stage: JobStage },

    /// The submitted job spec failed validation.
    #[error("invalid job spec: {0}")]
    InvalidSpec(String),

    /// The job store failed.
    #[error(transparent)]
    Store(StoreError),

    /// An I/O error outside the store (artifact cleanup, directory setup).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => PipelineError::NotFound(id),
            other => PipelineError::Store(other),
        }
    }
}
