// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Cost oracle: prices for executing functions and crossing unit boundaries.
//!
//! The planners only ever ask the oracle three questions, so any pricing
//! scheme can be plugged in. Implementations must be pure: the same
//! arguments always produce the same answer, and a co-located edge
//! (`cut == false`) never costs more than a cut one. Prices that do not fit
//! a `u64` should saturate at `u64::MAX`; the planners reject such inputs
//! before searching.

use call_graph::{Edge, Node};

/// Supplies costs and latencies to the planners.
pub trait CostOracle: Send + Sync {
    /// Cost of executing `node` once per request.
    fn node_cost(&self, node: &Node) -> u64;

    /// Cost of the invocations along `edge`, given whether the edge crosses
    /// a unit boundary.
    fn edge_cost(&self, edge: &Edge, cut: bool) -> u64;

    /// Latency added to the invocation path by `edge`. Zero when the two
    /// functions share a unit.
    fn edge_latency(&self, edge: &Edge, cut: bool) -> u64;
}

/// Pay-per-use pricing with linear terms.
///
/// ```text
/// node_cost          = execution_time × memory × compute_price
/// edge_cost(cut)     = invocation_rate × (invocation_price + transfer_price × data_volume)
/// edge_latency(cut)  = invocation_delay + transfer_delay × data_volume
/// ```
///
/// Co-located edges cost nothing and add no latency.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LinearCostModel {
    /// Price per ms·MB of execution.
    pub compute_price: u64,
    /// Price per remote invocation.
    pub invocation_price: u64,
    /// Price per unit of data shipped with a remote invocation.
    pub transfer_price: u64,
    /// Added latency per remote invocation (ms).
    pub invocation_delay: u64,
    /// Added latency per unit of data shipped (ms).
    pub transfer_delay: u64,
}

impl Default for LinearCostModel {
    fn default() -> Self {
        Self {
            compute_price: 1,
            invocation_price: 100,
            transfer_price: 1,
            invocation_delay: 10,
            transfer_delay: 0,
        }
    }
}

impl CostOracle for LinearCostModel {
    fn node_cost(&self, node: &Node) -> u64 {
        node.execution_time
            .saturating_mul(node.memory)
            .saturating_mul(self.compute_price)
    }

    fn edge_cost(&self, edge: &Edge, cut: bool) -> u64 {
        if !cut {
            return 0;
        }
        let per_call = self
            .transfer_price
            .saturating_mul(edge.data_volume)
            .saturating_add(self.invocation_price);
        edge.invocation_rate.saturating_mul(per_call)
    }

    fn edge_latency(&self, edge: &Edge, cut: bool) -> u64 {
        if !cut {
            return 0;
        }
        self.transfer_delay
            .saturating_mul(edge.data_volume)
            .saturating_add(self.invocation_delay)
    }
}
