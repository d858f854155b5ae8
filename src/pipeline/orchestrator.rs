//! The public job API: create, run, cancel, inspect, delete.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use reelforge_common::JobId;
use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reelforge_worker::{tools, WorkerInvoker};

use crate::config::Config;
use crate::content::ContentGenerator;
use crate::providers::{Capability, ProviderRegistry};
use crate::state::{event_channel, AppEvent};
use crate::store::{Job, JobSpec, JobStore};

use super::runner::{StagePaths, StageRunner};
use super::PipelineError;

/// Longest reel a job may request, in seconds.
const MAX_DURATION_SECONDS: u32 = 600;

/// Removes a job's run lease when dropped.
///
/// `run_job` futures can be dropped mid-run (timeout, select); tying the
/// lease release to `Drop` guarantees the entry never outlives the call that
/// took it.
struct RunLease<'a> {
    running: &'a DashMap<JobId, CancellationToken>,
    id: JobId,
}

impl Drop for RunLease<'_> {
    fn drop(&mut self) {
        self.running.remove(&self.id);
    }
}

/// Owns the job store, the run leases, and the stage runner.
///
/// Cheap to share behind an `Arc`; every method takes `&self`. At most one
/// run lease exists per job id, so two concurrent `run_job` calls for the
/// same id cannot both spawn workers.
pub struct PipelineOrchestrator {
    store: Arc<JobStore>,
    registry: Arc<ProviderRegistry>,
    runner: StageRunner,
    running: DashMap<JobId, CancellationToken>,
    events: broadcast::Sender<AppEvent>,
}

impl PipelineOrchestrator {
    /// Build an orchestrator from configuration, creating the data, temp and
    /// output directories if needed.
    pub fn new(
        config: &Config,
        content: Arc<dyn ContentGenerator>,
    ) -> Result<Self, PipelineError> {
        let store = Arc::new(JobStore::open(config.paths.data_dir.join("jobs"))?);
        let registry = Arc::new(ProviderRegistry::builtin());
        let paths = StagePaths::from_config(&config.paths);

        fs::create_dir_all(&paths.temp_dir)?;
        fs::create_dir_all(&paths.output_dir)?;

        for tool in tools::check_tools() {
            if tool.available {
                debug!(tool = %tool.name, version = ?tool.version, "external tool found");
            } else {
                warn!(tool = %tool.name, "external tool not found; worker invocations may fail");
            }
        }

        let (events, _) = event_channel();
        let runner = StageRunner::new(
            Arc::clone(&store),
            Arc::clone(&registry),
            content,
            WorkerInvoker::new(Duration::from_secs(config.limits.worker_timeout_secs)),
            Arc::new(Semaphore::new(config.limits.max_concurrent_workers)),
            config.credentials.to_credentials(),
            paths,
            events.clone(),
        );

        Ok(Self {
            store,
            registry,
            runner,
            running: DashMap::new(),
            events,
        })
    }

    /// Validate a spec, persist it as a draft job and announce it.
    pub fn create_job(&self, spec: JobSpec) -> Result<Job, PipelineError> {
        self.validate_spec(&spec)?;

        let job = Job::from_spec(spec);
        self.store.save(&job)?;
        self.emit(AppEvent::job_queued(job.clone()));
        info!(job_id = %job.id, title = %job.title, "job created");
        Ok(job)
    }

    /// Run a draft job to a terminal stage.
    ///
    /// Takes the per-job run lease first; a second call for the same id while
    /// the first is in flight fails with [`PipelineError::AlreadyRunning`]
    /// without touching the record. The lease is released whichever way the
    /// run resolves, including the caller dropping this future mid-run.
    pub async fn run_job(&self, id: JobId) -> Result<Job, PipelineError> {
        let cancel = CancellationToken::new();
        let _lease = self.take_lease(id, cancel.clone())?;
        self.runner.run(id, &cancel).await
    }

    /// Request cancellation of an in-flight run.
    ///
    /// Returns whether a run lease existed for the id. Cancellation is
    /// asynchronous: the run still finishes by marking the job failed.
    pub fn cancel_job(&self, id: JobId) -> bool {
        match self.running.get(&id) {
            Some(token) => {
                token.cancel();
                info!(job_id = %id, "cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Whether a run lease currently exists for the id.
    pub fn is_running(&self, id: JobId) -> bool {
        self.running.contains_key(&id)
    }

    /// Load the persisted record for a job.
    pub fn get_job(&self, id: JobId) -> Result<Job, PipelineError> {
        Ok(self.store.get(id)?)
    }

    /// List all persisted jobs, oldest first.
    pub fn list_jobs(&self) -> Result<Vec<Job>, PipelineError> {
        Ok(self.store.list()?)
    }

    /// Delete a job record and its artifacts.
    ///
    /// Refused while the job holds a run lease; deletion takes the lease
    /// itself so a concurrent `run_job` cannot start mid-delete and
    /// resurrect the record. Artifact removal is best effort: files another
    /// process already removed are not an error.
    pub fn delete_job(&self, id: JobId) -> Result<(), PipelineError> {
        let _lease = self.take_lease(id, CancellationToken::new())?;

        let job = self.store.get(id)?;
        for artifact in [&job.audio_path, &job.caption_path, &job.output_path]
            .into_iter()
            .flatten()
        {
            match fs::remove_file(artifact) {
                Ok(()) => debug!(job_id = %id, path = %artifact.display(), "removed artifact"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        self.store.delete(id)?;
        info!(job_id = %id, "job deleted");
        Ok(())
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.events.subscribe()
    }

    /// Insert the run lease for a job id, or fail if one is already held.
    fn take_lease(
        &self,
        id: JobId,
        cancel: CancellationToken,
    ) -> Result<RunLease<'_>, PipelineError> {
        match self.running.entry(id) {
            Entry::Occupied(_) => return Err(PipelineError::AlreadyRunning { id }),
            Entry::Vacant(slot) => {
                slot.insert(cancel);
            }
        }
        Ok(RunLease {
            running: &self.running,
            id,
        })
    }

    fn validate_spec(&self, spec: &JobSpec) -> Result<(), PipelineError> {
        if spec.title.trim().is_empty() {
            return Err(PipelineError::InvalidSpec("title is empty".to_string()));
        }
        if spec.topic.trim().is_empty() {
            return Err(PipelineError::InvalidSpec("topic is empty".to_string()));
        }
        if spec.duration_seconds == 0 || spec.duration_seconds > MAX_DURATION_SECONDS {
            return Err(PipelineError::InvalidSpec(format!(
                "duration_seconds must be between 1 and {MAX_DURATION_SECONDS}"
            )));
        }
        if let Some(provider) = spec.voice.provider.as_deref() {
            if !self.registry.is_known(Capability::VoiceSynthesis, provider) {
                return Err(PipelineError::InvalidSpec(format!(
                    "unknown voice provider: {provider}"
                )));
            }
        }
        Ok(())
    }

    fn emit(&self, event: AppEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::TemplateContentGenerator;
    use crate::store::{CaptionSpec, VoiceSpec};
    use reelforge_common::ReelStyle;

    fn orchestrator(dir: &std::path::Path) -> PipelineOrchestrator {
        let mut config = Config::default();
        config.paths.data_dir = dir.join("data");
        config.paths.temp_dir = dir.join("tmp");
        config.paths.output_dir = dir.join("out");
        config.paths.workers_dir = dir.join("workers");
        PipelineOrchestrator::new(&config, Arc::new(TemplateContentGenerator)).unwrap()
    }

    fn spec() -> JobSpec {
        JobSpec {
            title: "Demo".to_string(),
            topic: "AI tools".to_string(),
            style: ReelStyle::Modern,
            duration_seconds: 30,
            voice: VoiceSpec::default(),
            caption: CaptionSpec::default(),
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let job = orch.create_job(spec()).unwrap();
        let loaded = orch.get_job(job.id).unwrap();
        assert_eq!(job, loaded);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let mut bad = spec();
        bad.title = "   ".to_string();
        assert!(matches!(
            orch.create_job(bad),
            Err(PipelineError::InvalidSpec(_))
        ));
    }

    #[tokio::test]
    async fn zero_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let mut bad = spec();
        bad.duration_seconds = 0;
        assert!(matches!(
            orch.create_job(bad),
            Err(PipelineError::InvalidSpec(_))
        ));
    }

    #[tokio::test]
    async fn unknown_voice_provider_is_rejected_at_creation() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let mut bad = spec();
        bad.voice.provider = Some("polly".to_string());
        assert!(matches!(
            orch.create_job(bad),
            Err(PipelineError::InvalidSpec(_))
        ));
    }

    #[tokio::test]
    async fn cancel_without_lease_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let job = orch.create_job(spec()).unwrap();
        assert!(!orch.cancel_job(job.id));
        assert!(!orch.is_running(job.id));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let job = orch.create_job(spec()).unwrap();
        orch.delete_job(job.id).unwrap();
        assert!(matches!(
            orch.get_job(job.id),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_unknown_job_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        assert!(matches!(
            orch.delete_job(JobId::new()),
            Err(PipelineError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn creation_emits_queued_event() {
        let dir = tempfile::tempdir().unwrap();
        let orch = orchestrator(dir.path());

        let mut events = orch.subscribe();
        let job = orch.create_job(spec()).unwrap();

        match events.recv().await.unwrap() {
            AppEvent::JobQueued { job: queued } => assert_eq!(queued.id, job.id),
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
