//! Clustered 3D network generation and voxel-based edge smoothing.
//!
//! The [`generator`] stage samples a clustered network with power-law degrees and
//! writes node and edge tables. The [`smoothing`] stage reads them back, builds a
//! voxel density grid from the edges, filters it in the frequency domain and emits
//! interior points for every edge. [`cli`] wires both stages to files.

#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod model;
pub mod smoothing;
pub mod tables;

pub use config::{ConfigError, GeneratorConfig, PipelineConfig, SmoothingConfig};
pub use error::{Result, VoxgraphError};
pub use generator::{GenerateError, GenerateReport, NetworkGenerator};
pub use model::{Cluster, ClusterId, Domain, Edge, Node, NodeId, Point3, SmoothedEdge};
pub use smoothing::{RasterStrategy, SmoothReport, SmoothingPipeline};
pub use tables::TableError;
