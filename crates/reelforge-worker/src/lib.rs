//! Worker invocation protocol for reelforge.
//!
//! Every media-processing step in the pipeline (voice synthesis, captioning,
//! rendering) runs as a short-lived external process. This crate owns the
//! contract with those processes:
//!
//! - the host writes exactly one JSON payload to the worker's stdin;
//! - the worker writes whatever it wants to stdout, then a line equal to
//!   [`protocol::RESULT_SENTINEL`], then a single JSON report object;
//! - exit code 0 plus a parseable report is the only success shape.
//!
//! [`WorkerInvoker`] spawns one process per call with a hard deadline and a
//! cancel handle. No pooling, no reuse, and no cleanup of files the worker
//! creates: artifact lifecycle belongs to the caller.

pub mod error;
pub mod invoker;
pub mod protocol;
pub mod tools;

pub use error::{Result, WorkerError};
pub use invoker::{WorkerInvoker, WorkerTask};
pub use protocol::{WorkerReport, RESULT_SENTINEL};
pub use tools::{check_tool, require_tool, ToolInfo};
