use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::providers::Credentials;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub credentials: CredentialsConfig,
}

/// Filesystem layout for job records and generated artifacts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Directory holding the per-job JSON records.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Shared scratch directory for intermediate worker files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory for final rendered media.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory containing the worker scripts.
    #[serde(default = "default_workers_dir")]
    pub workers_dir: PathBuf,

    /// Interpreter used to run worker scripts.
    #[serde(default = "default_worker_interpreter")]
    pub worker_interpreter: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./reelforge-data")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("reelforge")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./generated")
}

fn default_workers_dir() -> PathBuf {
    PathBuf::from("./workers")
}

fn default_worker_interpreter() -> PathBuf {
    PathBuf::from("python3")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            temp_dir: default_temp_dir(),
            output_dir: default_output_dir(),
            workers_dir: default_workers_dir(),
            worker_interpreter: default_worker_interpreter(),
        }
    }
}

/// Resource bounds for the pipeline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LimitsConfig {
    /// Upper bound on worker processes in flight across all jobs.
    #[serde(default = "default_max_concurrent_workers")]
    pub max_concurrent_workers: usize,

    /// Hard deadline for a single worker invocation, in seconds.
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: u64,
}

fn default_max_concurrent_workers() -> usize {
    4
}

fn default_worker_timeout() -> u64 {
    300
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_workers: default_max_concurrent_workers(),
            worker_timeout_secs: default_worker_timeout(),
        }
    }
}

/// Credentials for providers with preconditions.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub elevenlabs_api_key: Option<String>,

    #[serde(default)]
    pub elevenlabs_voice_id: Option<String>,
}

impl CredentialsConfig {
    /// Convert to the registry's credential view.
    pub fn to_credentials(&self) -> Credentials {
        Credentials {
            elevenlabs_api_key: self.elevenlabs_api_key.clone(),
            elevenlabs_voice_id: self.elevenlabs_voice_id.clone(),
        }
    }
}
