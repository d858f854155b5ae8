mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    // Try default locations
    let default_paths = [
        "./config.toml",
        "./reelforge.toml",
        "~/.config/reelforge/config.toml",
        "/etc/reelforge/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.limits.max_concurrent_workers == 0 {
        anyhow::bail!("max_concurrent_workers cannot be 0");
    }

    if config.limits.worker_timeout_secs == 0 {
        anyhow::bail!("worker_timeout_secs cannot be 0");
    }

    if !config.paths.workers_dir.exists() {
        tracing::warn!("Workers directory does not exist: {:?}", config.paths.workers_dir);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.limits.max_concurrent_workers, 4);
        assert_eq!(config.limits.worker_timeout_secs, 300);
        assert!(config.credentials.elevenlabs_api_key.is_none());
    }

    #[test]
    fn partial_config_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            b"[limits]\nmax_concurrent_workers = 2\n\n[credentials]\nelevenlabs_api_key = \"k\"\n",
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.limits.max_concurrent_workers, 2);
        assert_eq!(config.limits.worker_timeout_secs, 300);
        assert_eq!(config.credentials.elevenlabs_api_key.as_deref(), Some("k"));
    }

    #[test]
    fn zero_worker_bound_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[limits]\nmax_concurrent_workers = 0\n").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn credentials_convert_to_registry_view() {
        let config = CredentialsConfig {
            elevenlabs_api_key: Some("key".to_string()),
            elevenlabs_voice_id: Some("voice".to_string()),
        };
        let creds = config.to_credentials();
        assert_eq!(creds.elevenlabs_api_key.as_deref(), Some("key"));
        assert_eq!(creds.elevenlabs_voice_id.as_deref(), Some("voice"));
    }
}
