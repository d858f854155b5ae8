//! Shared types for reelforge.
//!
//! Typed IDs and the small enums that cross crate boundaries live here so the
//! worker layer and the orchestration layer agree on them without depending
//! on each other.

pub mod ids;
pub mod types;

pub use ids::JobId;
pub use types::{ReelStyle, StageKind, TextPosition};
