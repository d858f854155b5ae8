//! Shared enums used by both the worker layer and the orchestration layer.

use serde::{Deserialize, Serialize};

/// Visual style template for a generated reel.
///
/// Each style maps to a background/accent/font palette inside the render
/// worker; the orchestration layer only validates and forwards it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReelStyle {
    Modern,
    Tech,
    Educational,
    Business,
}

impl ReelStyle {
    /// All known styles, in declaration order.
    pub const ALL: [ReelStyle; 4] = [
        ReelStyle::Modern,
        ReelStyle::Tech,
        ReelStyle::Educational,
        ReelStyle::Business,
    ];

    /// Short lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReelStyle::Modern => "modern",
            ReelStyle::Tech => "tech",
            ReelStyle::Educational => "educational",
            ReelStyle::Business => "business",
        }
    }
}

impl std::fmt::Display for ReelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReelStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "modern" => Ok(ReelStyle::Modern),
            "tech" => Ok(ReelStyle::Tech),
            "educational" => Ok(ReelStyle::Educational),
            "business" => Ok(ReelStyle::Business),
            other => Err(format!("unknown style: {other}")),
        }
    }
}

/// One step of the fixed pipeline sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Script,
    Voice,
    Caption,
    Render,
}

impl StageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageKind::Script => "script",
            StageKind::Voice => "voice",
            StageKind::Caption => "caption",
            StageKind::Render => "render",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caption placement within the video frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    Center,
    #[default]
    Bottom,
}

impl std::fmt::Display for TextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TextPosition::Top => "top",
            TextPosition::Center => "center",
            TextPosition::Bottom => "bottom",
        };
        f.write_str(s)
    }
}
