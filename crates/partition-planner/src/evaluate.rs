// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Direct evaluation of a partition given as a set of cut edges.
//!
//! Every edge of a call tree enters exactly one function, so a partition is
//! fully described by one flag per function: whether the edge into it
//! crosses a unit boundary. Edges leaving the platform ingress always do.
//! The units are then the connected pieces left after removing the cut
//! edges, each headed by a function whose incoming edge is cut.

use crate::search::{check_magnitudes, tracked_nodes};
use crate::{CostOracle, LatencyLimit, PlannerError};
use call_graph::{graph::Validated, CallTree};

/// Cut flags, one per function, indexed like the tree's nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CutSet {
    cut: Vec<bool>,
}

impl CutSet {
    /// Builds a cut set from per-function flags. Entry functions are always
    /// cut regardless of their flag.
    ///
    /// # Panics
    /// If `flags` does not have one entry per function.
    pub fn from_flags(tree: &CallTree<Validated>, mut flags: Vec<bool>) -> Self {
        assert_eq!(flags.len(), tree.num_nodes(), "one cut flag per function");
        for &e in tree.entries() {
            flags[e] = true;
        }
        Self { cut: flags }
    }

    /// Every function in a unit of its own.
    pub fn all_cut(tree: &CallTree<Validated>) -> Self {
        Self::from_flags(tree, vec![true; tree.num_nodes()])
    }

    /// One unit per entry function.
    pub fn uncut(tree: &CallTree<Validated>) -> Self {
        Self::from_flags(tree, vec![false; tree.num_nodes()])
    }

    /// `true` if the edge into `index` crosses a unit boundary.
    pub fn is_cut(&self, index: usize) -> bool {
        self.cut[index]
    }

    /// Number of cut edges, ingress edges included.
    pub fn num_cuts(&self) -> usize {
        self.cut.iter().filter(|&&c| c).count()
    }

    /// Unit membership in pre-order: units are ordered by their head, and
    /// functions within a unit follow the tree's pre-order.
    pub fn units(&self, tree: &CallTree<Validated>) -> Vec<Vec<usize>> {
        let n = tree.num_nodes();
        let mut unit_of = vec![usize::MAX; n];
        let mut units: Vec<Vec<usize>> = Vec::new();
        for v in tree.pre_order() {
            let u = match tree.parent(v) {
                Some(p) if !self.cut[v] => unit_of[p],
                _ => {
                    units.push(Vec::new());
                    units.len() - 1
                }
            };
            unit_of[v] = u;
            units[u].push(v);
        }
        units
    }
}

/// Metrics of one partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Evaluation {
    /// Total cost per request.
    pub cost: u64,
    /// Latency of the constrained path(s); every path when no limit is given.
    pub critical_latency: u64,
    /// Memory of the largest unit.
    pub peak_memory: u64,
    /// Deployment size of the largest unit.
    pub peak_deployment_size: u64,
    /// Number of units.
    pub units: usize,
}

/// Evaluates a partition.
///
/// The cost counts every function once plus every edge with its cut flag,
/// ingress edges as cut. The latency follows the same path selection the
/// planners use for `latency`.
pub fn evaluate<O: CostOracle + ?Sized>(
    tree: &CallTree<Validated>,
    oracle: &O,
    cuts: &CutSet,
    latency: Option<&LatencyLimit>,
) -> Result<Evaluation, PlannerError> {
    check_magnitudes(tree, oracle)?;
    let n = tree.num_nodes();

    let mut cost = 0u64;
    for v in 0..n {
        cost += oracle.node_cost(tree.node(v)) + oracle.edge_cost(tree.incoming(v), cuts.is_cut(v));
    }

    let units = cuts.units(tree);
    let mut peak_memory = 0;
    let mut peak_deployment_size = 0;
    for unit in &units {
        let memory: u64 = unit.iter().map(|&v| tree.node(v).memory).sum();
        let package: u64 = unit
            .iter()
            .map(|&v| tree.node(v).deployment_size.unwrap_or(0))
            .sum();
        peak_memory = peak_memory.max(memory);
        peak_deployment_size = peak_deployment_size.max(package);
    }

    let tracked = match latency {
        Some(_) => tracked_nodes(tree, latency)?,
        None => vec![true; n],
    };
    let critical_latency = path_latency(tree, oracle, cuts, &tracked);

    Ok(Evaluation {
        cost,
        critical_latency,
        peak_memory,
        peak_deployment_size,
        units: units.len(),
    })
}

/// Slowest tracked path from an entry down through tracked functions.
/// Ingress edges contribute no latency.
fn path_latency<O: CostOracle + ?Sized>(
    tree: &CallTree<Validated>,
    oracle: &O,
    cuts: &CutSet,
    tracked: &[bool],
) -> u64 {
    let mut below = vec![0u64; tree.num_nodes()];
    for v in tree.post_order() {
        if !tracked[v] {
            continue;
        }
        let deepest = tree
            .children(v)
            .iter()
            .filter(|&&c| tracked[c])
            .map(|&c| oracle.edge_latency(tree.incoming(c), cuts.is_cut(c)) + below[c])
            .max()
            .unwrap_or(0);
        below[v] = tree.node(v).execution_time + deepest;
    }
    tree.entries().iter().map(|&e| below[e]).max().unwrap_or(0)
}
