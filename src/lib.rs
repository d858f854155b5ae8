//! reelforge: a short-form media generation pipeline.
//!
//! A job describes one reel (topic, style, duration, voice and caption
//! parameters). Running a job executes a fixed stage sequence of script
//! generation, voice synthesis, captioning and rendering, where every media
//! step is an external worker process speaking a sentinel-delimited JSON
//! protocol (see the `reelforge-worker` crate).
//!
//! The [`pipeline::PipelineOrchestrator`] is the entry point:
//!
//! ```no_run
//! use std::sync::Arc;
//! use reelforge::config::Config;
//! use reelforge::content::TemplateContentGenerator;
//! use reelforge::pipeline::PipelineOrchestrator;
//! use reelforge::store::JobSpec;
//! use reelforge_common::ReelStyle;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let orch = PipelineOrchestrator::new(
//!     &Config::default(),
//!     Arc::new(TemplateContentGenerator),
//! )?;
//!
//! let job = orch.create_job(JobSpec {
//!     title: "Rust in 30 seconds".to_string(),
//!     topic: "the Rust borrow checker".to_string(),
//!     style: ReelStyle::Tech,
//!     duration_seconds: 30,
//!     voice: Default::default(),
//!     caption: Default::default(),
//! })?;
//!
//! let finished = orch.run_job(job.id).await?;
//! println!("stage: {}", finished.stage);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod content;
pub mod pipeline;
pub mod providers;
pub mod state;
pub mod store;

pub use config::{load_config, load_config_or_default, Config};
pub use pipeline::{PipelineError, PipelineOrchestrator};
pub use state::AppEvent;
pub use store::{Job, JobSpec, JobStage, JobStore};

pub use reelforge_common::{JobId, ReelStyle, StageKind, TextPosition};
