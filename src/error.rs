//! Error types shared across the pipeline.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::generator::GenerateError;
use crate::tables::TableError;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, VoxgraphError>;

/// Top-level error for a pipeline run. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum VoxgraphError {
    /// Configuration could not be loaded or failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The generator could not satisfy its constraints.
    #[error(transparent)]
    Generate(#[from] GenerateError),
    /// Reading or writing a persisted table failed.
    #[error(transparent)]
    Table(#[from] TableError),
    /// I/O error outside table handling.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A bad log filter, or logging initialized twice.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
