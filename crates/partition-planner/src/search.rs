// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! State transitions shared by the chain and tree partitioners.
//!
//! # Latency tracking
//!
//! Only functions on a constrained path contribute to a state's latency.
//! Without a latency limit nothing is tracked and every latency stays zero,
//! which collapses the frontier to cost and memory. With an every-path
//! limit all functions are tracked; with a designated critical path only
//! the functions from the entry down to its end are. An edge is tracked
//! when its callee is.
//!
//! # Package sizes
//!
//! Deployment sizes are accumulated only when a cap is configured, for the
//! same reason.
//!
//! # Magnitudes
//!
//! Every sum a transition forms is bounded by the tree's totals with all
//! edges cut. `check_magnitudes` verifies once that those totals fit a
//! `u64`, after which the transitions add without checks.

use crate::evaluate::CutSet;
use crate::frontier::{Objectives, State, Trace};
use crate::{CostOracle, Infeasibility, LatencyLimit, PlannerError, PlatformLimits};
use call_graph::{graph::Validated, CallTree};
use std::sync::Arc;

/// Everything a partitioner needs to extend states for one problem.
pub(crate) struct SearchContext<'a, O: CostOracle + ?Sized> {
    pub tree: &'a CallTree<Validated>,
    pub oracle: &'a O,
    capacity: u64,
    package_cap: Option<u64>,
    latency_bound: Option<u64>,
    tracked: Vec<bool>,
}

impl<'a, O: CostOracle + ?Sized> SearchContext<'a, O> {
    /// Prepares a search and rejects inputs that are infeasible on their face.
    pub fn new(
        tree: &'a CallTree<Validated>,
        oracle: &'a O,
        limits: &PlatformLimits,
        latency: Option<&LatencyLimit>,
    ) -> Result<Self, PlannerError> {
        let capacity = limits.capacity_mb();

        for node in tree.nodes() {
            if node.memory > capacity {
                return Err(Infeasibility::MemoryExceeded {
                    node: node.id.clone(),
                    required: node.memory,
                    capacity,
                }
                .into());
            }
            if let (Some(cap), Some(size)) = (limits.deployment_size_cap, node.deployment_size) {
                if size > cap {
                    return Err(Infeasibility::DeploymentSizeExceeded {
                        node: node.id.clone(),
                        size,
                        cap,
                    }
                    .into());
                }
            }
        }

        check_magnitudes(tree, oracle)?;

        let tracked = tracked_nodes(tree, latency)?;
        let ctx = Self {
            tree,
            oracle,
            capacity,
            package_cap: limits.deployment_size_cap,
            latency_bound: latency.map(|l| l.bound),
            tracked,
        };

        if let Some(bound) = ctx.latency_bound {
            let minimum = ctx.uncut_latency();
            if minimum > bound {
                return Err(Infeasibility::LatencyUnreachable { bound, minimum }.into());
            }
        }

        Ok(ctx)
    }

    fn own_latency(&self, index: usize) -> u64 {
        if self.tracked[index] {
            self.tree.node(index).execution_time
        } else {
            0
        }
    }

    fn package_of(&self, index: usize) -> u64 {
        match self.package_cap {
            Some(_) => self.tree.node(index).deployment_size.unwrap_or(0),
            None => 0,
        }
    }

    fn admit(&self, objectives: Objectives, trace: Trace) -> Option<State> {
        let fits = objectives.memory <= self.capacity
            && self.package_cap.map_or(true, |cap| objectives.package <= cap)
            && self.latency_bound.map_or(true, |b| objectives.latency <= b);
        fits.then(|| State::new(objectives, Arc::new(trace)))
    }

    // ── Transitions ────────────────────────────────────────────────

    /// A function alone in a fresh unit.
    pub fn open(&self, index: usize) -> State {
        let node = self.tree.node(index);
        State::new(
            Objectives {
                cost: self.oracle.node_cost(node),
                memory: node.memory,
                package: self.package_of(index),
                latency: self.own_latency(index),
            },
            Arc::new(Trace::Open(index)),
        )
    }

    /// Hangs `lower`, a solution for the subtree of `callee`, under `upper`,
    /// a partial solution rooted at `caller` whose open unit contains
    /// `caller`. The open unit of the result is `upper`'s.
    ///
    /// Returns `None` if the result breaks a limit.
    pub fn attach_below(
        &self,
        upper: &State,
        caller: usize,
        lower: &State,
        callee: usize,
        cut: bool,
    ) -> Option<State> {
        let edge = self.tree.incoming(callee);
        let (u, l) = (upper.objectives(), lower.objectives());

        let cost = u.cost + l.cost + self.oracle.edge_cost(edge, cut);
        let (memory, package) = if cut {
            (u.memory, u.package)
        } else {
            (u.memory + l.memory, u.package + l.package)
        };
        let latency = if self.tracked[callee] {
            let through = self.own_latency(caller) + self.oracle.edge_latency(edge, cut) + l.latency;
            u.latency.max(through)
        } else {
            u.latency
        };

        self.admit(
            Objectives {
                cost,
                memory,
                package,
                latency,
            },
            Trace::Join {
                upper: Arc::clone(&upper.trace),
                lower: Arc::clone(&lower.trace),
                callee,
                cut,
            },
        )
    }

    /// Extends a chain prefix ending at the parent of `callee` by `callee`.
    /// The open unit of the result is the one containing `callee`.
    ///
    /// Returns `None` if the result breaks a limit.
    pub fn attach_after(&self, prefix: &State, callee: usize, cut: bool) -> Option<State> {
        let edge = self.tree.incoming(callee);
        let node = self.tree.node(callee);
        let p = prefix.objectives();

        let cost = p.cost + self.oracle.node_cost(node) + self.oracle.edge_cost(edge, cut);
        let (memory, package) = if cut {
            (node.memory, self.package_of(callee))
        } else {
            (p.memory + node.memory, p.package + self.package_of(callee))
        };
        let latency = if self.tracked[callee] {
            p.latency + self.oracle.edge_latency(edge, cut) + node.execution_time
        } else {
            p.latency
        };

        self.admit(
            Objectives {
                cost,
                memory,
                package,
                latency,
            },
            Trace::Join {
                upper: Arc::clone(&prefix.trace),
                lower: Arc::new(Trace::Open(callee)),
                callee,
                cut,
            },
        )
    }

    /// Cost of invoking entry function `entry` from the platform ingress.
    pub fn ingress_cost(&self, entry: usize) -> u64 {
        self.oracle.edge_cost(self.tree.incoming(entry), true)
    }

    // ── Diagnostics ────────────────────────────────────────────────

    /// Tracked-path latency with every function in one unit.
    fn uncut_latency(&self) -> u64 {
        let mut below = vec![0u64; self.tree.num_nodes()];
        for v in self.tree.post_order() {
            if !self.tracked[v] {
                continue;
            }
            let deepest = self
                .tree
                .children(v)
                .iter()
                .filter(|&&c| self.tracked[c])
                .map(|&c| self.oracle.edge_latency(self.tree.incoming(c), false) + below[c])
                .max()
                .unwrap_or(0);
            below[v] = self.tree.node(v).execution_time + deepest;
        }
        self.tree
            .entries()
            .iter()
            .map(|&e| below[e])
            .max()
            .unwrap_or(0)
    }

    /// The error to report when the search runs out of states. Blames the
    /// memory capacity; the strategies narrow this down to the deployment
    /// size cap when lifting it makes the search succeed.
    pub fn exhausted(&self) -> PlannerError {
        match self.latency_bound {
            Some(bound) => Infeasibility::LatencyConflictsWithCapacity {
                bound,
                capacity: self.capacity,
            }
            .into(),
            None => PlannerError::InvariantViolation(
                "search exhausted without a latency limit".into(),
            ),
        }
    }

    // ── Reconstruction ─────────────────────────────────────────────

    /// Rebuilds the cut set from the traces of the selected per-entry states.
    ///
    /// Every non-entry function must be decided exactly once across all
    /// traces.
    pub fn cut_set<'t>(
        &self,
        traces: impl IntoIterator<Item = &'t Trace>,
    ) -> Result<CutSet, PlannerError> {
        let n = self.tree.num_nodes();
        let mut decided: Vec<Option<bool>> = vec![None; n];
        let mut conflict = None;

        for trace in traces {
            trace.for_each_decision(|callee, cut| {
                if decided[callee].replace(cut).is_some() {
                    conflict.get_or_insert(callee);
                }
            });
        }
        if let Some(v) = conflict {
            return Err(PlannerError::InvariantViolation(format!(
                "edge into '{}' decided twice",
                self.tree.node(v).id
            )));
        }

        let mut flags = Vec::with_capacity(n);
        for (v, d) in decided.into_iter().enumerate() {
            match (self.tree.is_entry(v), d) {
                (true, None) => flags.push(true),
                (false, Some(cut)) => flags.push(cut),
                (true, Some(_)) => {
                    return Err(PlannerError::InvariantViolation(format!(
                        "ingress edge into '{}' has a recorded decision",
                        self.tree.node(v).id
                    )))
                }
                (false, None) => {
                    return Err(PlannerError::InvariantViolation(format!(
                        "edge into '{}' was never decided",
                        self.tree.node(v).id
                    )))
                }
            }
        }
        Ok(CutSet::from_flags(self.tree, flags))
    }
}

/// Rejects trees whose worst-case cost, latency, memory or package totals
/// do not fit a `u64`. A saturated oracle answer counts as overflowing.
pub(crate) fn check_magnitudes<O: CostOracle + ?Sized>(
    tree: &CallTree<Validated>,
    oracle: &O,
) -> Result<(), PlannerError> {
    const QUANTITIES: [&str; 4] = ["cost", "latency", "memory", "package"];

    let mut totals = [0u64; 4];
    for v in 0..tree.num_nodes() {
        let node = tree.node(v);
        let edge = tree.incoming(v);
        let terms = [
            [oracle.node_cost(node), oracle.edge_cost(edge, true)],
            [node.execution_time, oracle.edge_latency(edge, true)],
            [node.memory, 0],
            [node.deployment_size.unwrap_or(0), 0],
        ];
        for (q, pair) in terms.iter().enumerate() {
            for &term in pair {
                totals[q] = totals[q]
                    .checked_add(term)
                    .filter(|&total| total < u64::MAX)
                    .ok_or_else(|| PlannerError::Overflow {
                        node: node.id.clone(),
                        quantity: QUANTITIES[q],
                    })?;
            }
        }
    }
    Ok(())
}

/// Marks the functions whose execution counts toward the latency limit.
pub(crate) fn tracked_nodes(
    tree: &CallTree<Validated>,
    latency: Option<&LatencyLimit>,
) -> Result<Vec<bool>, PlannerError> {
    let n = tree.num_nodes();
    let Some(limit) = latency else {
        return Ok(vec![false; n]);
    };
    match &limit.critical_path_end {
        None => Ok(vec![true; n]),
        Some(end) => {
            let target = tree
                .index_of(end)
                .ok_or_else(|| PlannerError::UnknownNode(end.clone()))?;
            let mut tracked = vec![false; n];
            for v in tree.path_from_root(target) {
                tracked[v] = true;
            }
            Ok(tracked)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LinearCostModel, MemoryCapacity};
    use call_graph::{Edge, Node};

    /// P -> a -> b, a -> c.
    fn small() -> CallTree<Validated> {
        CallTree::new(
            "small".into(),
            "P".into(),
            vec![
                Node::new("a", 10, 2),
                Node::new("b", 20, 3).with_deployment_size(40),
                Node::new("c", 30, 1),
            ],
            vec![
                Edge::new("P", "a", 1, 0),
                Edge::new("a", "b", 2, 5),
                Edge::new("a", "c", 1, 1),
            ],
        )
        .validate()
        .unwrap()
    }

    fn limits(mb: u64) -> PlatformLimits {
        PlatformLimits::new(MemoryCapacity::from_mb(mb))
    }

    #[test]
    fn test_oversized_node_is_infeasible() {
        let tree = small();
        let m = LinearCostModel::default();
        let err = SearchContext::new(&tree, &m, &limits(2), None).err().unwrap();
        assert!(matches!(
            err,
            PlannerError::Infeasible(Infeasibility::MemoryExceeded { ref node, required: 3, capacity: 2 }) if node == "b"
        ));
    }

    #[test]
    fn test_oversized_package_is_infeasible() {
        let tree = small();
        let m = LinearCostModel::default();
        let err = SearchContext::new(&tree, &m, &limits(10).with_deployment_size_cap(30), None)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PlannerError::Infeasible(Infeasibility::DeploymentSizeExceeded { size: 40, cap: 30, .. })
        ));
    }

    #[test]
    fn test_unreachable_latency() {
        let tree = small();
        let m = LinearCostModel::default();
        // Uncut critical path: a (10) + c (30) = 40.
        let err = SearchContext::new(&tree, &m, &limits(10), Some(&LatencyLimit::every_path(39)))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            PlannerError::Infeasible(Infeasibility::LatencyUnreachable { bound: 39, minimum: 40 })
        ));
        assert!(
            SearchContext::new(&tree, &m, &limits(10), Some(&LatencyLimit::every_path(40))).is_ok()
        );
    }

    #[test]
    fn test_designated_path_tracking() {
        let tree = small();
        let t = tracked_nodes(&tree, Some(&LatencyLimit::along_path(100, "b"))).unwrap();
        assert_eq!(t, vec![true, true, false]);
        assert!(matches!(
            tracked_nodes(&tree, Some(&LatencyLimit::along_path(100, "zz"))),
            Err(PlannerError::UnknownNode(_))
        ));
        assert_eq!(tracked_nodes(&tree, None).unwrap(), vec![false; 3]);
    }

    #[test]
    fn test_attach_below_merge_and_cut() {
        let tree = small();
        let m = LinearCostModel::default();
        let ctx = SearchContext::new(&tree, &m, &limits(10), Some(&LatencyLimit::every_path(1000)))
            .unwrap();
        let a = ctx.open(0);
        let b = ctx.open(1);

        let merged = ctx.attach_below(&a, 0, &b, 1, false).unwrap();
        assert_eq!(merged.cost(), 10 * 2 + 20 * 3);
        assert_eq!(merged.memory(), 5);
        assert_eq!(merged.latency(), 30);

        let cut = ctx.attach_below(&a, 0, &b, 1, true).unwrap();
        assert_eq!(cut.cost(), 20 + 60 + 2 * (100 + 5));
        assert_eq!(cut.memory(), 2);
        assert_eq!(cut.latency(), 10 + 10 + 20);
    }

    #[test]
    fn test_attach_below_respects_capacity() {
        let tree = small();
        let m = LinearCostModel::default();
        let ctx = SearchContext::new(&tree, &m, &limits(4), None).unwrap();
        let a = ctx.open(0);
        let b = ctx.open(1);
        assert!(ctx.attach_below(&a, 0, &b, 1, false).is_none());
        assert!(ctx.attach_below(&a, 0, &b, 1, true).is_some());
    }

    #[test]
    fn test_attach_after_moves_open_unit() {
        let tree = small();
        let m = LinearCostModel::default();
        let ctx = SearchContext::new(&tree, &m, &limits(10), Some(&LatencyLimit::every_path(1000)))
            .unwrap();
        let a = ctx.open(0);
        let cut = ctx.attach_after(&a, 1, true).unwrap();
        assert_eq!(cut.memory(), 3);
        assert_eq!(cut.latency(), 10 + 10 + 20);
        let merged = ctx.attach_after(&a, 1, false).unwrap();
        assert_eq!(merged.memory(), 5);
        assert_eq!(merged.latency(), 30);
    }

    #[test]
    fn test_package_tracked_only_with_cap() {
        let tree = small();
        let m = LinearCostModel::default();
        let plain = SearchContext::new(&tree, &m, &limits(10), None).unwrap();
        assert_eq!(plain.open(1).package(), 0);
        let capped =
            SearchContext::new(&tree, &m, &limits(10).with_deployment_size_cap(50), None).unwrap();
        assert_eq!(capped.open(1).package(), 40);
    }

    #[test]
    fn test_cut_set_reconstruction() {
        let tree = small();
        let m = LinearCostModel::default();
        let ctx = SearchContext::new(&tree, &m, &limits(10), None).unwrap();
        let ab = ctx.attach_below(&ctx.open(0), 0, &ctx.open(1), 1, true).unwrap();
        let abc = ctx.attach_below(&ab, 0, &ctx.open(2), 2, false).unwrap();
        let cuts = ctx.cut_set([abc.trace.as_ref()]).unwrap();
        assert!(cuts.is_cut(0));
        assert!(cuts.is_cut(1));
        assert!(!cuts.is_cut(2));

        assert!(ctx.cut_set([ab.trace.as_ref()]).is_err());
    }

    #[test]
    fn test_huge_node_cost_overflows() {
        // 2^33 ms × 2^31 MB does not fit a u64.
        let tree = CallTree::new(
            "huge".into(),
            "P".into(),
            vec![Node::new("a", 1 << 33, 1 << 31)],
            vec![Edge::new("P", "a", 1, 0)],
        )
        .validate()
        .unwrap();
        let m = LinearCostModel::default();
        let err = SearchContext::new(&tree, &m, &limits(1 << 32), None).err().unwrap();
        assert!(matches!(
            err,
            PlannerError::Overflow { ref node, quantity: "cost" } if node == "a"
        ));
    }

    #[test]
    fn test_cost_total_overflows() {
        // Each node costs 2^63 on its own; together they overflow.
        let tree = CallTree::new(
            "huge".into(),
            "P".into(),
            vec![Node::new("a", 1 << 31, 1 << 32), Node::new("b", 1 << 31, 1 << 32)],
            vec![Edge::new("P", "a", 0, 0), Edge::new("a", "b", 0, 0)],
        )
        .validate()
        .unwrap();
        let m = LinearCostModel::default();
        assert!(check_magnitudes(&tree, &m).is_err());
        let err = SearchContext::new(&tree, &m, &limits(1 << 33), None).err().unwrap();
        assert!(matches!(err, PlannerError::Overflow { ref node, .. } if node == "b"));
    }

    #[test]
    fn test_large_values_within_range() {
        let tree = CallTree::new(
            "large".into(),
            "P".into(),
            vec![Node::new("a", 1 << 20, 1 << 20), Node::new("b", 1 << 20, 1 << 20)],
            vec![Edge::new("P", "a", 1, 0), Edge::new("a", "b", 1, 0)],
        )
        .validate()
        .unwrap();
        assert!(check_magnitudes(&tree, &LinearCostModel::default()).is_ok());
    }
}
