//! Durable job records and their lifecycle transitions.
//!
//! A [`Job`] is the unit of work tracked end-to-end: one pipeline run with
//! persisted stage and progress. All state transitions go through methods on
//! [`Job`] so the record invariants (`output_path` iff completed,
//! `last_error` iff error, forward-only stages, monotonic progress) live in
//! one place.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use reelforge_common::{JobId, ReelStyle, TextPosition};
use serde::{Deserialize, Serialize};

/// Lifecycle stage of a job.
///
/// Transitions are forward-only within one run:
/// `draft -> processing -> {completed | error}`. Terminal stages have no exit;
/// callers create a new job instead of re-running a finished one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStage {
    Draft,
    Processing,
    Completed,
    Error,
}

impl JobStage {
    /// Whether this stage has no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Completed | JobStage::Error)
    }
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStage::Draft => "draft",
            JobStage::Processing => "processing",
            JobStage::Completed => "completed",
            JobStage::Error => "error",
        };
        f.write_str(s)
    }
}

/// Voice synthesis parameters forwarded to the voice worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSpec {
    /// Requested provider name; `None` means the registry default.
    #[serde(default)]
    pub provider: Option<String>,

    #[serde(default = "default_language")]
    pub language: String,

    /// Playback speed multiplier.
    #[serde(default = "default_rate")]
    pub speed: f64,

    /// Pitch multiplier.
    #[serde(default = "default_rate")]
    pub pitch: f64,

    /// Provider-specific extras, passed through untouched.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_rate() -> f64 {
    1.0
}

impl Default for VoiceSpec {
    fn default() -> Self {
        Self {
            provider: None,
            language: default_language(),
            speed: default_rate(),
            pitch: default_rate(),
            extra: BTreeMap::new(),
        }
    }
}

/// Caption rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSpec {
    /// When false the caption stage is skipped entirely.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Caption style override; defaults to the job's reel style.
    #[serde(default)]
    pub style: Option<String>,

    #[serde(default)]
    pub position: TextPosition,
}

fn default_true() -> bool {
    true
}

impl Default for CaptionSpec {
    fn default() -> Self {
        Self {
            enabled: true,
            style: None,
            position: TextPosition::default(),
        }
    }
}

/// Validated input for creating a new job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSpec {
    pub title: String,
    pub topic: String,
    pub style: ReelStyle,

    #[serde(default = "default_duration")]
    pub duration_seconds: u32,

    #[serde(default)]
    pub voice: VoiceSpec,

    #[serde(default)]
    pub caption: CaptionSpec,
}

fn default_duration() -> u32 {
    30
}

/// One pipeline run with persisted stage/progress state.
///
/// The persisted record is the single source of truth; in-memory copies are
/// stale the moment another task could have written the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub topic: String,
    pub style: ReelStyle,
    pub duration_seconds: u32,

    pub stage: JobStage,

    /// 0-100, non-decreasing while `stage == processing`.
    pub progress: u8,

    /// Script text produced by the content generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    pub voice: VoiceSpec,
    pub caption: CaptionSpec,

    /// Intermediate narration audio, set by the voice stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<PathBuf>,

    /// Intermediate caption artifact, set by the caption stage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_path: Option<PathBuf>,

    /// Final rendered media; present iff `stage == completed`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_path: Option<PathBuf>,

    /// Human-readable failure; present iff `stage == error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a fresh draft job from a validated spec.
    pub fn from_spec(spec: JobSpec) -> Self {
        Self {
            id: JobId::new(),
            title: spec.title,
            topic: spec.topic,
            style: spec.style,
            duration_seconds: spec.duration_seconds,
            stage: JobStage::Draft,
            progress: 0,
            script: None,
            voice: spec.voice,
            caption: spec.caption,
            audio_path: None,
            caption_path: None,
            output_path: None,
            last_error: None,
            created_at: Utc::now(),
        }
    }

    /// Enter the processing stage at the first progress checkpoint.
    pub fn begin_processing(&mut self) {
        self.stage = JobStage::Processing;
        self.set_progress(10);
    }

    /// Advance progress. Monotonic: a lower value than the current one is
    /// ignored rather than applied.
    pub fn set_progress(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    /// Transition to the terminal completed stage with the final artifact.
    pub fn complete(&mut self, output_path: PathBuf) {
        self.stage = JobStage::Completed;
        self.output_path = Some(output_path);
        self.last_error = None;
        self.set_progress(100);
    }

    /// Transition to the terminal error stage.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.stage = JobStage::Error;
        self.last_error = Some(message.into());
        self.output_path = None;
    }
}
