//! Pipeline configuration.
//!
//! Both stages take an immutable config record. Records deserialize from a TOML
//! file with one section per stage; missing keys fall back to the defaults below.
//!
//! ```toml
//! [generator]
//! num_nodes = 10000
//! num_clusters = 100
//! layout_seed = 42
//!
//! [smoothing]
//! grid_size = 128
//! raster = "exact"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Domain;
use crate::smoothing::RasterStrategy;

/// Parameters for the network generator stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Total number of nodes `Nn`.
    pub num_nodes: u64,
    /// Number of clusters `Nc`.
    pub num_clusters: usize,
    /// Standard deviation of the sampled cluster sizes.
    pub cluster_size_std: f64,
    /// Power-law exponent of the degree distribution. Must exceed 1.
    pub gamma: f64,
    /// Smallest emitted out-degree.
    pub k_min: u32,
    /// Largest emitted out-degree.
    pub k_max: u32,
    /// Per-axis standard deviation of node coordinates around their cluster center.
    pub coord_sigma: f64,
    /// Coordinate domain for centers and nodes.
    pub domain: Domain,
    /// Seed for cluster layout and node placement.
    pub layout_seed: u64,
    /// Seed for degree sampling and edge wiring. `None` draws from OS entropy.
    pub wiring_seed: Option<u64>,
    /// Random reconciliation attempts before the deterministic fallback takes over.
    pub reconcile_attempt_limit: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_nodes: 10_000,
            num_clusters: 100,
            cluster_size_std: 200.0,
            gamma: 2.5,
            k_min: 1,
            k_max: 5,
            coord_sigma: 10.0,
            domain: Domain::default(),
            layout_seed: 42,
            wiring_seed: None,
            reconcile_attempt_limit: 1_000_000,
        }
    }
}

impl GeneratorConfig {
    /// Mean cluster size `Nn / Nc`.
    pub fn mean_cluster_size(&self) -> f64 {
        self.num_nodes as f64 / self.num_clusters.max(1) as f64
    }

    /// Checks parameter ranges. Layout feasibility is checked by the layout generator.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_domain("generator.domain", &self.domain)?;
        if self.num_nodes == 0 {
            return Err(ConfigError::invalid("generator.num_nodes", "must be positive"));
        }
        if self.num_clusters == 0 {
            return Err(ConfigError::invalid(
                "generator.num_clusters",
                "must be positive",
            ));
        }
        if !self.cluster_size_std.is_finite() || self.cluster_size_std < 0.0 {
            return Err(ConfigError::invalid(
                "generator.cluster_size_std",
                format!("must be a finite non-negative number, got {}", self.cluster_size_std),
            ));
        }
        if !self.gamma.is_finite() || self.gamma <= 1.0 {
            return Err(ConfigError::invalid(
                "generator.gamma",
                format!("must be greater than 1, got {}", self.gamma),
            ));
        }
        if self.k_min > self.k_max {
            return Err(ConfigError::invalid(
                "generator.k_min",
                format!("k_min ({}) exceeds k_max ({})", self.k_min, self.k_max),
            ));
        }
        if !self.coord_sigma.is_finite() || self.coord_sigma < 0.0 {
            return Err(ConfigError::invalid(
                "generator.coord_sigma",
                format!("must be a finite non-negative number, got {}", self.coord_sigma),
            ));
        }
        Ok(())
    }
}

/// Largest accepted voxels per axis. The density grid and its spectrum hold
/// `grid_size³` cells each.
pub const MAX_GRID_SIZE: usize = 512;

/// Parameters for the voxel smoothing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Voxels per axis `G`.
    pub grid_size: usize,
    /// Coordinate domain mapped onto the grid.
    pub domain: Domain,
    /// Segment rasterization strategy.
    pub raster: RasterStrategy,
    /// Sample count for the sampled strategy, endpoints included.
    pub raster_samples: usize,
    /// Run the Gaussian and spectral filter over the density grid.
    pub spectral: bool,
    /// Gaussian pre-blur width in voxels.
    pub blur_sigma: f64,
    /// Gaussian kernel radius in multiples of `blur_sigma`.
    pub blur_truncate: f64,
    /// Magnitude percentile at or below which spectral components are dropped.
    pub percentile: f64,
    /// Interior points emitted per edge.
    pub path_points: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            grid_size: 128,
            domain: Domain::default(),
            raster: RasterStrategy::Sampled,
            raster_samples: 10,
            spectral: true,
            blur_sigma: 2.0,
            blur_truncate: 4.0,
            percentile: 90.0,
            path_points: 8,
        }
    }
}

impl SmoothingConfig {
    /// Checks parameter ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_domain("smoothing.domain", &self.domain)?;
        if !(2..=MAX_GRID_SIZE).contains(&self.grid_size) {
            return Err(ConfigError::invalid(
                "smoothing.grid_size",
                format!("must lie in [2, {MAX_GRID_SIZE}], got {}", self.grid_size),
            ));
        }
        if self.raster_samples < 2 {
            return Err(ConfigError::invalid(
                "smoothing.raster_samples",
                format!("must be at least 2, got {}", self.raster_samples),
            ));
        }
        if !self.blur_sigma.is_finite() || self.blur_sigma < 0.0 {
            return Err(ConfigError::invalid(
                "smoothing.blur_sigma",
                format!("must be a finite non-negative number, got {}", self.blur_sigma),
            ));
        }
        if !self.blur_truncate.is_finite() || self.blur_truncate <= 0.0 {
            return Err(ConfigError::invalid(
                "smoothing.blur_truncate",
                format!("must be positive, got {}", self.blur_truncate),
            ));
        }
        if !(0.0..=100.0).contains(&self.percentile) {
            return Err(ConfigError::invalid(
                "smoothing.percentile",
                format!("must lie in [0, 100], got {}", self.percentile),
            ));
        }
        if self.path_points == 0 {
            return Err(ConfigError::invalid(
                "smoothing.path_points",
                "must be positive",
            ));
        }
        Ok(())
    }
}

/// Configuration file contents: one section per stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Generator stage section.
    pub generator: GeneratorConfig,
    /// Smoothing stage section.
    pub smoothing: SmoothingConfig,
}

impl PipelineConfig {
    /// Loads the config from `explicit`, or from [`default_config_path`] when that file
    /// exists. Returns defaults when neither is present. An explicit path must exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => read_file(path),
            None => match default_config_path() {
                Some(path) if path.exists() => read_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parses a config from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Serializes the config as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })
    }

    /// Validates both sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.smoothing.validate()
    }
}

fn read_file(path: &Path) -> Result<PipelineConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn validate_domain(field: &'static str, domain: &Domain) -> Result<(), ConfigError> {
    if !domain.min.is_finite() || !domain.max.is_finite() || domain.min >= domain.max {
        return Err(ConfigError::invalid(
            field,
            format!("expected finite min < max, got [{}, {}]", domain.min, domain.max),
        ));
    }
    Ok(())
}

/// Location of the per-user config file, `<config dir>/voxgraph/pipeline.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("voxgraph").join("pipeline.toml"))
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that failed.
        path: PathBuf,
        /// Underlying parse error.
        source: toml::de::Error,
    },
    /// The config could not be rendered as TOML.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: toml::ser::Error,
    },
    /// A parameter is out of range.
    #[error("invalid {field}: {reason}")]
    Invalid {
        /// Dotted name of the offending key.
        field: &'static str,
        /// Human-readable constraint that failed.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
