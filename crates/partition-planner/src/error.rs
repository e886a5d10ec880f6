// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the partition planner.

/// Errors that can occur during partition planning.
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// No assignment of functions to units satisfies the limits.
    #[error("infeasible input: {0}")]
    Infeasible(#[from] Infeasibility),

    /// The input tree is malformed (propagated from the parser/validator).
    #[error("invalid call tree: {0}")]
    Graph(#[from] call_graph::GraphError),

    /// A chain-only operation was given a branching tree.
    #[error("call tree '{0}' is not a simple chain")]
    NotAChain(String),

    /// No strategy is registered under this name.
    #[error("unknown strategy '{0}' (expected 'tree' or 'chain')")]
    UnknownStrategy(String),

    /// A limit refers to a function that does not exist.
    #[error("unknown node '{0}'")]
    UnknownNode(String),

    /// A limit could not be parsed or is out of range.
    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    /// The frontier store or the search bookkeeping is corrupted.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(String),

    /// Node or edge attributes are too large to price without overflowing.
    #[error("attributes of node '{node}' overflow the {quantity} totals")]
    Overflow { node: String, quantity: &'static str },

    /// A produced partition failed validation.
    #[error("strategy '{strategy}' produced an invalid partition: {detail}")]
    InvalidPartition { strategy: String, detail: String },
}

/// The constraint that makes a partitioning problem unsolvable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Infeasibility {
    /// A single function does not fit into a unit on its own.
    #[error("node '{node}' requires {required} MB but the unit capacity is {capacity} MB")]
    MemoryExceeded {
        node: String,
        required: u64,
        capacity: u64,
    },

    /// A single function's package exceeds the per-unit deployment size cap.
    #[error("node '{node}' has a {size} MB package but the deployment size cap is {cap} MB")]
    DeploymentSizeExceeded { node: String, size: u64, cap: u64 },

    /// Even with every function co-located, the critical path is too slow.
    #[error(
        "latency limit {bound} ms is below the minimum achievable critical-path latency {minimum} ms"
    )]
    LatencyUnreachable { bound: u64, minimum: u64 },

    /// The cuts forced by the memory capacity push the critical path over the limit.
    #[error("latency limit {bound} ms cannot be met with units of at most {capacity} MB")]
    LatencyConflictsWithCapacity { bound: u64, capacity: u64 },

    /// The cuts forced by the deployment size cap push the critical path over
    /// the limit, although the memory capacity alone would allow it.
    #[error("latency limit {bound} ms cannot be met with unit packages of at most {cap} MB")]
    LatencyConflictsWithDeploymentCap { bound: u64, cap: u64 },
}
