// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Function and invocation records.
//!
//! Quantities are integral: execution time in milliseconds, memory and
//! deployment size in megabytes, invocation rate as calls per request and
//! data volume in abstract transfer units.

/// A single serverless function of the application.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Node {
    /// Unique identifier (e.g., `"3"` or `"car_detection"`).
    pub id: String,
    /// Execution time of one invocation in ms.
    pub execution_time: u64,
    /// Memory requirement in MB.
    pub memory: u64,
    /// Size of the function's deployment package in MB, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment_size: Option<u64>,
}

impl Node {
    /// Creates a node without a deployment size.
    pub fn new(id: impl Into<String>, execution_time: u64, memory: u64) -> Self {
        Self {
            id: id.into(),
            execution_time,
            memory,
            deployment_size: None,
        }
    }

    /// Sets the deployment package size.
    pub fn with_deployment_size(mut self, size: u64) -> Self {
        self.deployment_size = Some(size);
        self
    }

    /// Returns a one-line description.
    pub fn summary(&self) -> String {
        match self.deployment_size {
            Some(size) => format!(
                "{}: {} ms, {} MB, package {} MB",
                self.id, self.execution_time, self.memory, size
            ),
            None => format!("{}: {} ms, {} MB", self.id, self.execution_time, self.memory),
        }
    }
}

/// A caller → callee invocation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Edge {
    pub caller: String,
    pub callee: String,
    /// Average number of callee invocations per caller invocation.
    pub invocation_rate: u64,
    /// Data passed along with each invocation.
    pub data_volume: u64,
}

impl Edge {
    pub fn new(
        caller: impl Into<String>,
        callee: impl Into<String>,
        invocation_rate: u64,
        data_volume: u64,
    ) -> Self {
        Self {
            caller: caller.into(),
            callee: callee.into(),
            invocation_rate,
            data_volume,
        }
    }
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} -> {} (rate {}, data {})",
            self.caller, self.callee, self.invocation_rate, self.data_volume
        )
    }
}
