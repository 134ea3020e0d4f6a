//! Quota configuration.
//!
//! ```toml
//! max_space = 1048576   # bytes, omit for unbounded
//! max_nodes = 1024      # inodes, omit for unbounded
//! strict = true         # reject operations that exceed a maximum
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{VfsError, VfsResult};

/// Limits applied by [`StatsAccounting`](crate::StatsAccounting).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaConfig {
    /// Maximum bytes, `None` for unbounded.
    pub max_space: Option<u64>,
    /// Maximum inodes, `None` for unbounded.
    pub max_nodes: Option<u64>,
    /// When set, `adjust` fails once a maximum is exceeded.
    pub strict: bool,
}

impl QuotaConfig {
    /// No limits, lenient.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Strict limits on both space and nodes.
    pub fn strict(max_space: u64, max_nodes: u64) -> Self {
        Self {
            max_space: Some(max_space),
            max_nodes: Some(max_nodes),
            strict: true,
        }
    }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> VfsResult<Self> {
        toml::from_str(s).map_err(|e| VfsError::InvalidConfig(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> VfsResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded quota config");
        Ok(config)
    }
}
