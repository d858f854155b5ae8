//! Durable per-job persistence.
//!
//! One JSON document per job id, written with a temp-file-and-rename so a
//! crash mid-write never leaves a torn record. The documents are pretty
//! printed on purpose: operators inspect them directly when debugging a
//! failed run.

mod models;

pub use models::{CaptionSpec, Job, JobSpec, JobStage, VoiceSpec};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use reelforge_common::JobId;
use tracing::debug;

/// Errors from the job store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the given job id.
    #[error("job not found: {0}")]
    NotFound(JobId),

    /// An I/O error occurred reading or writing a record.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A record exists but does not parse as a job document.
    #[error("corrupt job record: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// The atomic replace of a record failed.
    #[error("failed to persist job record: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// File-backed store holding one record per job id.
pub struct JobStore {
    dir: PathBuf,
}

impl JobStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory holding the job records.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: JobId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Persist a job record, atomically replacing any existing one.
    pub fn save(&self, job: &Job) -> Result<(), StoreError> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer_pretty(&mut tmp, job)?;
        tmp.write_all(b"\n")?;
        tmp.persist(self.record_path(job.id))?;

        debug!(job_id = %job.id, stage = %job.stage, progress = job.progress, "persisted job record");
        Ok(())
    }

    /// Load the persisted record for a job id.
    pub fn get(&self, id: JobId) -> Result<Job, StoreError> {
        let content = match fs::read_to_string(self.record_path(id)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Remove the persisted record for a job id.
    pub fn delete(&self, id: JobId) -> Result<(), StoreError> {
        match fs::remove_file(self.record_path(id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StoreError::NotFound(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// List every job record in the store, skipping unreadable files.
    pub fn list(&self) -> Result<Vec<Job>, StoreError> {
        let mut jobs = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(StoreError::from)
                .and_then(|c| serde_json::from_str::<Job>(&c).map_err(StoreError::from))
            {
                Ok(job) => jobs.push(job),
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "skipping unreadable job record");
                }
            }
        }
        jobs.sort_by_key(|j| j.created_at);
        Ok(jobs)
    }
}
