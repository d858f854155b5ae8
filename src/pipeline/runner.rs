//! Stage execution for one job.

use std::path::PathBuf;
use std::sync::Arc;

use reelforge_common::{JobId, StageKind};
use serde_json::json;
use tokio::sync::{broadcast, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use reelforge_worker::{WorkerError, WorkerInvoker, WorkerReport, WorkerTask};

use crate::config::PathsConfig;
use crate::content::{ContentGenerator, GeneratedScript};
use crate::providers::{Capability, CredentialKey, Credentials, ProviderRegistry, ProviderSpec};
use crate::state::AppEvent;
use crate::store::{Job, JobStage, JobStore};

use super::PipelineError;

/// Filesystem locations a run needs, resolved once from configuration.
#[derive(Debug, Clone)]
pub struct StagePaths {
    /// Directory containing the worker scripts.
    pub workers_dir: PathBuf,
    /// Scratch directory for intermediate artifacts.
    pub temp_dir: PathBuf,
    /// Directory for final rendered media.
    pub output_dir: PathBuf,
    /// Interpreter used to run worker scripts.
    pub interpreter: PathBuf,
}

impl StagePaths {
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self {
            workers_dir: paths.workers_dir.clone(),
            temp_dir: paths.temp_dir.clone(),
            output_dir: paths.output_dir.clone(),
            interpreter: paths.worker_interpreter.clone(),
        }
    }
}

/// A failed or cancelled stage, folded into the job's `last_error`.
struct StageFailure {
    stage: StageKind,
    message: String,
    cancelled: bool,
}

impl StageFailure {
    fn new(stage: StageKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            cancelled: false,
        }
    }

    fn cancelled(stage: StageKind) -> Self {
        Self {
            stage,
            message: String::new(),
            cancelled: true,
        }
    }

    fn to_last_error(&self) -> String {
        if self.cancelled {
            format!("job cancelled during {} stage", self.stage)
        } else {
            format!("{} stage failed: {}", self.stage, self.message)
        }
    }
}

/// Runs the fixed stage sequence for one job.
///
/// Progress checkpoints are persisted before the next stage starts, so a
/// crash mid-run leaves a record that reflects the last finished stage.
/// Worker invocations across all concurrent runs share one semaphore.
pub struct StageRunner {
    store: Arc<JobStore>,
    registry: Arc<ProviderRegistry>,
    content: Arc<dyn ContentGenerator>,
    invoker: WorkerInvoker,
    worker_slots: Arc<Semaphore>,
    credentials: Credentials,
    paths: StagePaths,
    events: broadcast::Sender<AppEvent>,
}

impl StageRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<JobStore>,
        registry: Arc<ProviderRegistry>,
        content: Arc<dyn ContentGenerator>,
        invoker: WorkerInvoker,
        worker_slots: Arc<Semaphore>,
        credentials: Credentials,
        paths: StagePaths,
        events: broadcast::Sender<AppEvent>,
    ) -> Self {
        Self {
            store,
            registry,
            content,
            invoker,
            worker_slots,
            credentials,
            paths,
            events,
        }
    }

    /// Run the pipeline for a draft job to a terminal stage.
    ///
    /// The record is reloaded from the store before any mutation; the
    /// in-memory copy the caller might hold is not trusted. Stage failures
    /// and cancellation land in the returned job's `last_error` rather than
    /// in the `Err` channel, which is reserved for jobs that could not be
    /// run at all.
    pub async fn run(
        &self,
        id: JobId,
        cancel: &CancellationToken,
    ) -> Result<Job, PipelineError> {
        let mut job = self.store.get(id)?;
        if job.stage != JobStage::Draft {
            return Err(PipelineError::NotRunnable {
                id,
                stage: job.stage,
            });
        }

        job.begin_processing();
        self.store.save(&job)?;
        self.emit(AppEvent::progress(id, job.progress, StageKind::Script));
        info!(job_id = %id, topic = %job.topic, style = %job.style, "pipeline started");

        match self.run_stages(&mut job, cancel).await {
            Ok(output) => {
                job.complete(output.clone());
                self.store.save(&job)?;
                self.emit(AppEvent::completed(job.clone()));
                info!(job_id = %id, output = %output.display(), "pipeline completed");
            }
            Err(failure) => {
                let message = failure.to_last_error();
                job.fail(message.clone());
                self.store.save(&job)?;
                self.emit(AppEvent::failed(id, message.clone()));
                warn!(job_id = %id, error = %message, "pipeline failed");
            }
        }

        Ok(job)
    }

    async fn run_stages(
        &self,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, StageFailure> {
        if cancel.is_cancelled() {
            return Err(StageFailure::cancelled(StageKind::Script));
        }

        let generated = self.script_stage(job).await?;
        self.voice_stage(job, cancel).await?;
        if job.caption.enabled {
            self.caption_stage(job, &generated, cancel).await?;
        }
        self.render_stage(job, &generated, cancel).await
    }

    async fn script_stage(&self, job: &mut Job) -> Result<GeneratedScript, StageFailure> {
        self.emit(AppEvent::stage_started(job.id, StageKind::Script));

        let generated = self
            .content
            .generate(&job.topic, job.style, job.duration_seconds)
            .await
            .map_err(|e| StageFailure::new(StageKind::Script, e.to_string()))?;

        job.script = Some(generated.script.clone());
        self.checkpoint(job, 20, StageKind::Script)?;
        Ok(generated)
    }

    async fn voice_stage(
        &self,
        job: &mut Job,
        cancel: &CancellationToken,
    ) -> Result<(), StageFailure> {
        self.emit(AppEvent::stage_started(job.id, StageKind::Voice));

        let spec = self
            .registry
            .resolve(
                Capability::VoiceSynthesis,
                job.voice.provider.as_deref(),
                &self.credentials,
            )
            .map_err(|e| StageFailure::new(StageKind::Voice, e.to_string()))?;

        let audio_out = self.paths.temp_dir.join(format!("{}_voice.wav", job.id));
        let mut payload = serde_json::Map::new();
        payload.insert("text".to_string(), json!(job.script));
        payload.insert("language".to_string(), json!(job.voice.language));
        payload.insert("speed".to_string(), json!(job.voice.speed));
        payload.insert("pitch".to_string(), json!(job.voice.pitch));
        payload.insert("output".to_string(), json!(audio_out));
        for (key, value) in &job.voice.extra {
            payload.entry(key.clone()).or_insert_with(|| value.clone());
        }
        self.attach_credentials(spec, &mut payload);

        let report = self
            .invoke_worker(StageKind::Voice, spec.script, payload.into(), cancel)
            .await?;

        job.audio_path = Some(report.path().map(PathBuf::from).unwrap_or(audio_out));
        self.checkpoint(job, 40, StageKind::Voice)
    }

    async fn caption_stage(
        &self,
        job: &mut Job,
        generated: &GeneratedScript,
        cancel: &CancellationToken,
    ) -> Result<(), StageFailure> {
        self.emit(AppEvent::stage_started(job.id, StageKind::Caption));

        let spec = self
            .registry
            .resolve(Capability::Caption, None, &self.credentials)
            .map_err(|e| StageFailure::new(StageKind::Caption, e.to_string()))?;

        let caption_out = self
            .paths
            .temp_dir
            .join(format!("{}_captions.json", job.id));
        let style = job
            .caption
            .style
            .clone()
            .unwrap_or_else(|| job.style.to_string());
        let payload = json!({
            "script": job.script,
            "scenes": generated.scenes,
            "style": style,
            "position": job.caption.position,
            "audio": job.audio_path,
            "output": caption_out,
        });

        let report = self
            .invoke_worker(StageKind::Caption, spec.script, payload, cancel)
            .await?;

        job.caption_path = Some(report.path().map(PathBuf::from).unwrap_or(caption_out));
        self.checkpoint(job, 60, StageKind::Caption)
    }

    async fn render_stage(
        &self,
        job: &mut Job,
        generated: &GeneratedScript,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, StageFailure> {
        self.emit(AppEvent::stage_started(job.id, StageKind::Render));

        let spec = self
            .registry
            .resolve(Capability::Render, None, &self.credentials)
            .map_err(|e| StageFailure::new(StageKind::Render, e.to_string()))?;

        let output = self.paths.output_dir.join(format!("{}.mp4", job.id));
        let payload = json!({
            "title": job.title,
            "topic": job.topic,
            "style": job.style,
            "duration_seconds": job.duration_seconds,
            "scenes": generated.scenes,
            "audio": job.audio_path,
            "captions": job.caption_path,
            "output": output,
        });

        let report = self
            .invoke_worker(StageKind::Render, spec.script, payload, cancel)
            .await?;

        // Thumbnails are reported but not tracked in the record.
        if let Some(thumbnail) = report.field_str("thumbnail") {
            debug!(job_id = %job.id, thumbnail, "render worker produced thumbnail");
        }

        Ok(report.path().map(PathBuf::from).unwrap_or(output))
    }

    /// Spawn one worker under the shared concurrency bound.
    ///
    /// `success: false` in the report is a domain failure and folds into the
    /// stage failure the same way a protocol error does.
    async fn invoke_worker(
        &self,
        stage: StageKind,
        script: &str,
        payload: serde_json::Value,
        cancel: &CancellationToken,
    ) -> Result<WorkerReport, StageFailure> {
        let _permit = self
            .worker_slots
            .acquire()
            .await
            .map_err(|_| StageFailure::new(stage, "worker slots closed"))?;

        let script_path = self.paths.workers_dir.join(script);
        let task = WorkerTask::new(
            &self.paths.interpreter,
            vec![script_path.display().to_string()],
            payload,
        );

        let report = self
            .invoker
            .invoke(&task, cancel)
            .await
            .map_err(|e| match e {
                WorkerError::Cancelled => StageFailure::cancelled(stage),
                other => StageFailure::new(stage, other.to_string()),
            })?;

        if !report.success {
            return Err(StageFailure::new(stage, report.error_message()));
        }
        Ok(report)
    }

    fn attach_credentials(&self, spec: &ProviderSpec, payload: &mut serde_json::Map<String, serde_json::Value>) {
        for key in spec.requires {
            match key {
                CredentialKey::ElevenLabsApiKey => {
                    if let Some(value) = &self.credentials.elevenlabs_api_key {
                        payload.insert("api_key".to_string(), json!(value));
                    }
                }
                CredentialKey::ElevenLabsVoiceId => {
                    if let Some(value) = &self.credentials.elevenlabs_voice_id {
                        payload.insert("voice_id".to_string(), json!(value));
                    }
                }
            }
        }
    }

    fn checkpoint(
        &self,
        job: &mut Job,
        progress: u8,
        stage: StageKind,
    ) -> Result<(), StageFailure> {
        job.set_progress(progress);
        self.store
            .save(job)
            .map_err(|e| StageFailure::new(stage, format!("failed to persist progress: {e}")))?;
        self.emit(AppEvent::progress(job.id, job.progress, stage));
        Ok(())
    }

    fn emit(&self, event: AppEvent) {
        // Nobody listening is fine; the store is the source of truth.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_message_names_the_stage() {
        let failure = StageFailure::new(StageKind::Render, "ffmpeg missing");
        assert_eq!(failure.to_last_error(), "render stage failed: ffmpeg missing");
    }

    #[test]
    fn cancelled_message_names_the_stage() {
        let failure = StageFailure::cancelled(StageKind::Voice);
        assert_eq!(failure.to_last_error(), "job cancelled during voice stage");
    }
}
