// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # partition-planner
//!
//! Groups the functions of a serverless call tree into deployment units so
//! that the cost per request is minimal, every unit fits the platform's
//! memory capacity and, optionally, invocation paths stay under a latency
//! limit.
//!
//! Co-locating a caller and its callee turns a remote invocation into a
//! local call, which saves the invocation price and the hop latency but
//! adds the callee's memory to the caller's unit. The planners search this
//! trade-off exactly with dynamic programming over Pareto frontiers of
//! (cost, memory, latency) states.
//!
//! # Strategies
//!
//! | Strategy | Input | Method |
//! |---|---|---|
//! | [`ChainPartitioner`] | simple paths | prefix recurrence |
//! | [`TreePartitioner`] | any call tree | post-order recurrence, paths delegated to the chain recurrence |
//!
//! Both implement [`PartitionStrategy`] and produce identical costs on a
//! path. Prices come from a [`CostOracle`]; [`LinearCostModel`] is the
//! default.
//!
//! # Example
//! ```
//! use call_graph::ServiceDescription;
//! use partition_planner::{partition, LatencyLimit, MemoryCapacity, PlatformLimits};
//!
//! let json = r#"{
//!     "nodes": [
//!         { "id": "1", "execution_time": 50, "memory": 128 },
//!         { "id": "2", "execution_time": 80, "memory": 256 },
//!         { "id": "3", "execution_time": 20, "memory": 512 }
//!     ],
//!     "edges": [
//!         { "caller": "P", "callee": "1", "invocation_rate": 1, "data_volume": 4 },
//!         { "caller": "1", "callee": "2", "invocation_rate": 2, "data_volume": 8 },
//!         { "caller": "1", "callee": "3", "invocation_rate": 1, "data_volume": 1 }
//!     ]
//! }"#;
//! let tree = ServiceDescription::from_json(json).unwrap().into_tree().validate().unwrap();
//! let limits = PlatformLimits::new(MemoryCapacity::parse("512M").unwrap());
//!
//! let p = partition(&tree, &limits, Some(&LatencyLimit::every_path(200))).unwrap();
//! assert_eq!(p.blocks(), vec![vec!["1", "2"], vec!["3"]]);
//! println!("{}", p.summary());
//! ```

mod error;
mod evaluate;
pub mod frontier;
mod limits;
mod oracle;
mod partition;
mod search;
mod stats;
pub mod strategy;

pub use error::{Infeasibility, PlannerError};
pub use evaluate::{evaluate, CutSet, Evaluation};
pub use frontier::{Frontier, Objectives, State};
pub use limits::{LatencyLimit, MemoryCapacity, PlatformLimits, MB_PER_VCPU};
pub use oracle::{CostOracle, LinearCostModel};
pub use partition::{Partition, Unit};
pub use stats::SearchStats;
pub use strategy::chain::{Chain, ChainPartitioner};
pub use strategy::tree::TreePartitioner;
pub use strategy::{strategy_by_name, PartitionStrategy, Solution};

use call_graph::{graph::Validated, CallTree, ServiceDescription};

/// Partitions `tree` with the default cost model.
///
/// Path-shaped trees go to the [`ChainPartitioner`], everything else to the
/// [`TreePartitioner`]; both return the same cost on a path.
pub fn partition(
    tree: &CallTree<Validated>,
    limits: &PlatformLimits,
    latency: Option<&LatencyLimit>,
) -> Result<Partition, PlannerError> {
    partition_with(tree, limits, latency, LinearCostModel::default())
}

/// Partitions `tree`, pricing with `oracle`.
pub fn partition_with<O: CostOracle>(
    tree: &CallTree<Validated>,
    limits: &PlatformLimits,
    latency: Option<&LatencyLimit>,
    oracle: O,
) -> Result<Partition, PlannerError> {
    if tree.is_chain() {
        tracing::info!(tree = %tree.name, "call tree is a simple path → using chain strategy");
        ChainPartitioner::with_oracle(oracle).plan(tree, limits, latency)
    } else {
        tracing::info!(tree = %tree.name, "call tree branches → using tree strategy");
        TreePartitioner::with_oracle(oracle).plan(tree, limits, latency)
    }
}

/// Validates a parsed service description and partitions it.
///
/// Shape errors in the description surface as [`PlannerError::Graph`].
pub fn partition_description(
    description: ServiceDescription,
    limits: &PlatformLimits,
    latency: Option<&LatencyLimit>,
) -> Result<Partition, PlannerError> {
    let tree = description.into_tree().validate()?;
    partition(&tree, limits, latency)
}
