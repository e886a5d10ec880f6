// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Platform and latency limits.
//!
//! A [`MemoryCapacity`] is the hard memory ceiling of one deployed unit. It
//! supports human-readable string parsing for CLI and config ergonomics;
//! the vCPU share of a unit follows from its memory and is not configurable
//! on its own.

use crate::PlannerError;
use std::fmt;

/// Memory granted to one vCPU by the platform, in MB.
pub const MB_PER_VCPU: u64 = 1769;

/// Per-unit memory ceiling in megabytes.
///
/// # Parsing
/// - `"512M"` or `"512MB"` → 512 MB
/// - `"10G"` or `"10GB"` → 10 × 1024 MB
/// - `"3008"` → plain megabyte count
///
/// # Examples
/// ```
/// use partition_planner::MemoryCapacity;
///
/// let c = MemoryCapacity::parse("2G").unwrap();
/// assert_eq!(c.as_mb(), 2048);
/// assert_eq!(c.to_string(), "2 GB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct MemoryCapacity {
    megabytes: u64,
}

impl MemoryCapacity {
    /// Creates a capacity from megabytes.
    pub fn from_mb(mb: u64) -> Self {
        Self { megabytes: mb }
    }

    /// Creates a capacity from gigabytes.
    pub fn from_gb(gb: u64) -> Result<Self, PlannerError> {
        let megabytes = gb.checked_mul(1024).ok_or_else(|| {
            PlannerError::InvalidLimit(format!("memory capacity overflow: {gb} GB"))
        })?;
        Ok(Self { megabytes })
    }

    /// Returns the capacity in megabytes.
    pub fn as_mb(&self) -> u64 {
        self.megabytes
    }

    /// Parses a human-readable capacity string (case-insensitive).
    pub fn parse(s: &str) -> Result<Self, PlannerError> {
        let s = s.trim();
        let upper = s.to_uppercase();

        let (num_str, gigabytes) = if upper.ends_with("GB") {
            (&s[..s.len() - 2], true)
        } else if upper.ends_with('G') {
            (&s[..s.len() - 1], true)
        } else if upper.ends_with("MB") {
            (&s[..s.len() - 2], false)
        } else if upper.ends_with('M') {
            (&s[..s.len() - 1], false)
        } else {
            (s, false)
        };

        let value: u64 = num_str.trim().parse().map_err(|_| {
            PlannerError::InvalidLimit(format!(
                "invalid memory capacity '{s}': expected a number followed by an optional suffix (M, G)"
            ))
        })?;
        let megabytes = if gigabytes {
            Self::from_gb(value)?.megabytes
        } else {
            value
        };

        if megabytes == 0 {
            return Err(PlannerError::InvalidLimit(
                "memory capacity must be positive".into(),
            ));
        }

        Ok(Self { megabytes })
    }
}

impl fmt::Display for MemoryCapacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.megabytes >= 1024 && self.megabytes % 1024 == 0 {
            write!(f, "{} GB", self.megabytes / 1024)
        } else {
            write!(f, "{} MB", self.megabytes)
        }
    }
}

/// Resource caps applied to every deployed unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlatformLimits {
    /// Memory available to one unit.
    pub memory: MemoryCapacity,
    /// Cap on the summed deployment package size of one unit, in MB.
    #[serde(default)]
    pub deployment_size_cap: Option<u64>,
}

impl PlatformLimits {
    /// Limits with only a memory cap.
    pub fn new(memory: MemoryCapacity) -> Self {
        Self {
            memory,
            deployment_size_cap: None,
        }
    }

    /// Adds a per-unit deployment size cap.
    pub fn with_deployment_size_cap(mut self, cap: u64) -> Self {
        self.deployment_size_cap = Some(cap);
        self
    }

    /// Returns the memory capacity in MB.
    pub fn capacity_mb(&self) -> u64 {
        self.memory.as_mb()
    }

    /// Number of vCPUs granted to a unit with this memory.
    pub fn vcpus(&self) -> u64 {
        self.memory.as_mb().div_ceil(MB_PER_VCPU).max(1)
    }
}

impl fmt::Display for PlatformLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} per unit ({} vCPU)", self.memory, self.vcpus())?;
        if let Some(cap) = self.deployment_size_cap {
            write!(f, ", packages up to {cap} MB")?;
        }
        Ok(())
    }
}

/// Upper bound on invocation-path latency.
///
/// By default the bound applies to every root-to-leaf path. When
/// `critical_path_end` names a function, only the path from the root down
/// to that function is checked.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LatencyLimit {
    /// Bound in ms.
    pub bound: u64,
    #[serde(default)]
    pub critical_path_end: Option<String>,
}

impl LatencyLimit {
    /// Bound applied to all root-to-leaf paths.
    pub fn every_path(bound: u64) -> Self {
        Self {
            bound,
            critical_path_end: None,
        }
    }

    /// Bound applied to the path from the root to `end` only.
    pub fn along_path(bound: u64, end: impl Into<String>) -> Self {
        Self {
            bound,
            critical_path_end: Some(end.into()),
        }
    }

    /// Returns a copy with a different bound.
    pub fn with_bound(&self, bound: u64) -> Self {
        Self {
            bound,
            critical_path_end: self.critical_path_end.clone(),
        }
    }
}

impl fmt::Display for LatencyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.critical_path_end {
            Some(end) => write!(f, "{} ms on path to '{end}'", self.bound),
            None => write!(f, "{} ms on every path", self.bound),
        }
    }
}
