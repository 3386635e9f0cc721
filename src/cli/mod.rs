#![forbid(unsafe_code)]

//! File-level jobs behind the `voxgraph` command line.
//!
//! Each job reads or writes the tab-separated tables and wraps a library stage,
//! returning a summary the binary renders as text or JSON.

/// Generate and smooth jobs.
pub mod pipeline;

pub use pipeline::{run_generate, run_smooth, GenerateJob, GenerateSummary, SmoothJob, SmoothSummary};
