//! External tool detection.
//!
//! Workers are python scripts that shell out to ffmpeg; checking for the
//! interpreter and ffmpeg up front gives operators a clear signal before any
//! job is accepted.

use crate::error::{Result, WorkerError};
use std::path::PathBuf;
use std::process::Command;

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Version string if available.
    pub version: Option<String>,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
}

/// Check if a tool is available and get its information.
pub fn check_tool(name: &str) -> ToolInfo {
    check_tool_with_arg(name, "--version")
}

/// Check if a tool is available using a custom version argument.
pub fn check_tool_with_arg(name: &str, version_arg: &str) -> ToolInfo {
    let result = Command::new(name).arg(version_arg).output();

    match result {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .map(|s| s.to_string());

            let path = which::which(name).ok();

            ToolInfo {
                name: name.to_string(),
                available: true,
                version,
                path,
            }
        }
        _ => ToolInfo {
            name: name.to_string(),
            available: false,
            version: None,
            path: None,
        },
    }
}

/// Check the tools the bundled workers rely on.
pub fn check_tools() -> Vec<ToolInfo> {
    vec![
        check_tool("python3"),
        check_tool_with_arg("ffmpeg", "-version"),
    ]
}

/// Require that a tool is available, returning its path.
///
/// # Errors
///
/// Returns a spawn-shaped error if the tool is not found on PATH.
pub fn require_tool(name: &str) -> Result<PathBuf> {
    which::which(name).map_err(|_| {
        WorkerError::spawn(
            name,
            std::io::Error::new(std::io::ErrorKind::NotFound, "not found on PATH"),
        )
    })
}
