//! Process-wide `tracing` setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::error::{Result, VoxgraphError};

/// Installs the global `tracing` subscriber, filtered by `level`
/// (any `EnvFilter` directive such as `info` or `voxgraph::smoothing=debug`).
///
/// Events go to stderr so table output on stdout stays machine readable.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| VoxgraphError::InvalidArgument(format!("invalid log level: {e}")))?,
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| VoxgraphError::InvalidArgument("logging already initialized".into()))
}
