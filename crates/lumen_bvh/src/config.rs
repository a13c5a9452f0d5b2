//! BVH build configuration and errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest bin count accepted by the builder.
pub const MAX_BINS: usize = 64;

/// Errors surfaced by BVH construction and refit.
#[derive(Error, Debug)]
pub enum BvhError {
    #[error("Bin count {0} out of range (expected 2..={})", MAX_BINS)]
    InvalidBinCount(usize),

    #[error("Leaf size must be at least 1")]
    InvalidLeafSize,

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("Topology mismatch: BVH holds {expected} triangles, mesh has {found}")]
    TopologyMismatch { expected: usize, found: usize },

    #[error("Instance transform is not invertible")]
    SingularTransform,

    #[error("Instance index {index} out of range (set holds {len})")]
    InstanceOutOfRange { index: usize, len: usize },

    #[error("Mesh error: {0}")]
    Mesh(#[from] lumen_core::MeshError),
}

/// Result type for BVH operations.
pub type BvhResult<T> = Result<T, BvhError>;

/// Build configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Number of equal-width centroid bins per axis for the SAH split search
    pub bins: usize,
    /// Nodes holding this many triangles or fewer are never split
    pub leaf_size: usize,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            bins: 8,
            leaf_size: 2,
        }
    }
}

impl BvhConfig {
    /// Config with a specific bin count and the default leaf size.
    pub fn with_bins(bins: usize) -> Self {
        Self {
            bins,
            ..Self::default()
        }
    }

    /// Parse a JSON config. Missing fields take their defaults.
    ///
    /// ```ignore
    /// let config = BvhConfig::from_json(r#"{ "bins": 12 }"#)?;
    /// ```
    pub fn from_json(json: &str) -> BvhResult<Self> {
        let config: BvhConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> BvhResult<()> {
        if !(2..=MAX_BINS).contains(&self.bins) {
            return Err(BvhError::InvalidBinCount(self.bins));
        }
        if self.leaf_size == 0 {
            return Err(BvhError::InvalidLeafSize);
        }
        Ok(())
    }
}
