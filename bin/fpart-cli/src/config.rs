// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Planner configuration loaded from TOML files or assembled from flags.
//!
//! # TOML Format
//! ```toml
//! graph_path = "service.json"
//! memory_capacity = "512M"
//! deployment_size_cap = 250
//! latency_limit = 800
//! critical_path_end = "10"
//! strategy = "tree"
//! delegate_chains = true
//!
//! [cost_model]
//! compute_price = 1
//! invocation_price = 100
//! transfer_price = 1
//! invocation_delay = 10
//! transfer_delay = 0
//! ```

use partition_planner::{
    strategy_by_name, LatencyLimit, LinearCostModel, MemoryCapacity, PartitionStrategy,
    PlatformLimits,
};
use std::path::{Path, PathBuf};

/// Errors raised while loading or interpreting a [`PlannerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialise error: {0}")]
    Serialise(#[from] toml::ser::Error),

    #[error("invalid memory capacity: {0}")]
    Capacity(String),

    #[error("{0}")]
    Strategy(String),

    #[error("critical path end '{0}' given without a latency limit")]
    DanglingPathEnd(String),
}

/// Configuration for a planning run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Path to the JSON service description.
    pub graph_path: Option<PathBuf>,
    /// Per-unit memory capacity (human-readable, e.g., `"512M"`).
    pub memory_capacity: String,
    /// Optional per-unit deployment package cap in MB.
    pub deployment_size_cap: Option<u64>,
    /// Optional latency bound in ms.
    pub latency_limit: Option<u64>,
    /// Restricts the latency bound to the path ending at this function.
    pub critical_path_end: Option<String>,
    /// Strategy name: `"tree"` or `"chain"`.
    pub strategy: String,
    /// Whether the tree strategy hands path-shaped subtrees to the chain recurrence.
    pub delegate_chains: bool,
    /// Prices and delays used to score partitions.
    pub cost_model: LinearCostModel,
}

impl PlannerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds the platform limits from the capacity and package cap.
    pub fn parse_limits(&self) -> Result<PlatformLimits, ConfigError> {
        let memory = MemoryCapacity::parse(&self.memory_capacity)
            .map_err(|e| ConfigError::Capacity(e.to_string()))?;
        let limits = PlatformLimits::new(memory);
        Ok(match self.deployment_size_cap {
            Some(cap) => limits.with_deployment_size_cap(cap),
            None => limits,
        })
    }

    /// Returns the latency limit, if one is configured.
    pub fn latency_limit(&self) -> Result<Option<LatencyLimit>, ConfigError> {
        match (self.latency_limit, &self.critical_path_end) {
            (Some(bound), Some(end)) => Ok(Some(LatencyLimit::along_path(bound, end.clone()))),
            (Some(bound), None) => Ok(Some(LatencyLimit::every_path(bound))),
            (None, Some(end)) => Err(ConfigError::DanglingPathEnd(end.clone())),
            (None, None) => Ok(None),
        }
    }

    /// Creates the partition strategy specified by this config.
    pub fn create_strategy(&self) -> Result<Box<dyn PartitionStrategy>, ConfigError> {
        strategy_by_name(
            &self.strategy.to_lowercase(),
            self.cost_model.clone(),
            self.delegate_chains,
        )
        .map_err(|e| ConfigError::Strategy(e.to_string()))
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            graph_path: None,
            memory_capacity: "512M".to_string(),
            deployment_size_cap: None,
            latency_limit: None,
            critical_path_end: None,
            strategy: "tree".to_string(),
            delegate_chains: true,
            cost_model: LinearCostModel::default(),
        }
    }
}
