// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tree partitioning strategy.
//!
//! Bottom-up dynamic program over the call tree. Every function `v` ends up
//! with a [`Frontier`] describing all non-dominated ways to partition its
//! subtree, where the unit holding `v` is still open so that `v`'s caller
//! may join it.
//!
//! # Combining a child
//!
//! Starting from `v` alone, children are folded in one at a time. For a
//! child `c` with frontier `F(c)`, every pair of a partial state of `v` and
//! a state of `c` yields two candidates:
//!
//! ```text
//! merge:    memory = m(v-unit) + m(c-unit)    latency = max(lat(v), t(v) + lat(c))
//! separate: memory = m(v-unit)                latency = max(lat(v), t(v) + hop + lat(c))
//! ```
//!
//! `separate` candidates are built from `closed(F(c))`, since a sealed
//! child unit only matters through its cost and latency. Candidates are
//! inserted into the new frontier as soon as they are produced.
//!
//! # Path-shaped subtrees
//!
//! A subtree that is a simple path can be solved by the chain recurrence
//! instead (see [`super::chain`]). This is on by default and produces the
//! same frontier objectives as the node-by-node method.
//!
//! # Parallelism
//!
//! With the `parallel` cargo feature, sibling subtrees are solved on the
//! rayon pool. Children are still folded into their parent one at a time in
//! call order, so the result is identical to the sequential run.

use crate::frontier::Frontier;
use crate::search::SearchContext;
use crate::strategy::chain::{suffix_frontier, Chain};
use crate::strategy::{assemble, attribute_latency_conflict, PartitionStrategy, Solution};
use crate::{
    CostOracle, LatencyLimit, LinearCostModel, Partition, PlannerError, PlatformLimits,
    SearchStats,
};
use call_graph::{graph::Validated, CallTree};
use std::time::Instant;

/// Tree strategy: post-order dynamic program with Pareto pruning.
#[derive(Debug, Clone)]
pub struct TreePartitioner<O = LinearCostModel> {
    oracle: O,
    delegate_chains: bool,
    parallel: bool,
}

impl TreePartitioner {
    /// Tree partitioner with the default linear cost model.
    pub fn new() -> Self {
        Self::with_oracle(LinearCostModel::default())
    }
}

impl Default for TreePartitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: CostOracle> TreePartitioner<O> {
    /// Tree partitioner pricing with `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self {
            oracle,
            delegate_chains: true,
            parallel: cfg!(feature = "parallel"),
        }
    }

    /// Enables or disables solving path-shaped subtrees with the chain
    /// recurrence.
    pub fn with_chain_delegation(mut self, enabled: bool) -> Self {
        self.delegate_chains = enabled;
        self
    }

    /// Enables or disables parallel evaluation of sibling subtrees. Has no
    /// effect unless the crate is built with the `parallel` feature.
    pub fn with_parallelism(mut self, enabled: bool) -> Self {
        if enabled && !cfg!(feature = "parallel") {
            tracing::warn!("parallel evaluation requested but the `parallel` feature is disabled");
        }
        self.parallel = enabled && cfg!(feature = "parallel");
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Solves `tree` and returns the partition with statistics.
    pub fn solve(
        &self,
        tree: &CallTree<Validated>,
        limits: &PlatformLimits,
        latency: Option<&LatencyLimit>,
    ) -> Result<Solution, PlannerError> {
        attribute_latency_conflict(limits, |limits| self.search(tree, limits, latency))
    }

    fn search(
        &self,
        tree: &CallTree<Validated>,
        limits: &PlatformLimits,
        latency: Option<&LatencyLimit>,
    ) -> Result<Solution, PlannerError> {
        let started = Instant::now();
        tracing::debug!(
            tree = %tree.name,
            delegate_chains = self.delegate_chains,
            parallel = self.parallel,
            "starting tree search"
        );
        let ctx = SearchContext::new(tree, &self.oracle, limits, latency)?;
        let mut stats = SearchStats::default();
        let frontiers = self.entry_frontiers(&ctx, &mut stats)?;
        assemble("tree", &ctx, limits, latency, &frontiers, stats, started)
    }

    /// Frontier of every entry subtree, in entry order.
    fn entry_frontiers(
        &self,
        ctx: &SearchContext<'_, O>,
        stats: &mut SearchStats,
    ) -> Result<Vec<(usize, Frontier)>, PlannerError> {
        let shape = path_shaped(ctx.tree);

        #[cfg(feature = "parallel")]
        if self.parallel {
            use rayon::prelude::*;
            let solved = ctx
                .tree
                .entries()
                .par_iter()
                .map(|&e| self.solve_subtree(ctx, &shape, e).map(|(f, s)| (e, f, s)))
                .collect::<Result<Vec<_>, _>>()?;
            let mut frontiers = Vec::with_capacity(solved.len());
            for (e, f, s) in solved {
                *stats += s;
                frontiers.push((e, f));
            }
            return Ok(frontiers);
        }

        self.solve_in_post_order(ctx, &shape, stats)
    }

    fn delegates(&self, tree: &CallTree<Validated>, shape: &[bool], v: usize) -> bool {
        self.delegate_chains && shape[v] && !tree.is_leaf(v)
    }

    /// Functions in the order their frontiers are computed. Functions below
    /// a delegated chain head are skipped.
    fn schedule(&self, tree: &CallTree<Validated>, shape: &[bool]) -> Vec<usize> {
        let mut order = Vec::with_capacity(tree.num_nodes());
        for &entry in tree.entries() {
            let mut stack = vec![(entry, false)];
            while let Some((v, expanded)) = stack.pop() {
                if expanded || tree.is_leaf(v) || self.delegates(tree, shape, v) {
                    order.push(v);
                    continue;
                }
                stack.push((v, true));
                for &c in tree.children(v).iter().rev() {
                    stack.push((c, false));
                }
            }
        }
        order
    }

    fn solve_in_post_order(
        &self,
        ctx: &SearchContext<'_, O>,
        shape: &[bool],
        stats: &mut SearchStats,
    ) -> Result<Vec<(usize, Frontier)>, PlannerError> {
        let tree = ctx.tree;
        let mut solved: Vec<Option<Frontier>> = vec![None; tree.num_nodes()];
        let take = |solved: &mut Vec<Option<Frontier>>, v: usize| {
            solved[v].take().ok_or_else(|| {
                PlannerError::InvariantViolation(format!(
                    "frontier of '{}' requested before it was computed",
                    tree.node(v).id
                ))
            })
        };

        for v in self.schedule(tree, shape) {
            let frontier = if self.delegates(tree, shape, v) {
                self.delegate(ctx, v, stats)?
            } else {
                let children = tree
                    .children(v)
                    .iter()
                    .map(|&c| take(&mut solved, c))
                    .collect::<Result<Vec<_>, _>>()?;
                combine(ctx, v, children, stats)?
            };
            solved[v] = Some(frontier);
        }

        tree.entries()
            .iter()
            .map(|&e| take(&mut solved, e).map(|f| (e, f)))
            .collect()
    }

    fn delegate(
        &self,
        ctx: &SearchContext<'_, O>,
        head: usize,
        stats: &mut SearchStats,
    ) -> Result<Frontier, PlannerError> {
        let chain = Chain::below(ctx.tree, head)?;
        stats.chains_delegated += 1;
        tracing::trace!(
            head = %ctx.tree.node(head).id,
            len = chain.len(),
            "delegating path to chain recurrence"
        );
        suffix_frontier(ctx, chain.nodes(), stats)
    }

    /// Solves the subtree of `v`, children in parallel. Recursion depth is
    /// bounded by the depth of the tree above its path-shaped parts.
    #[cfg(feature = "parallel")]
    fn solve_subtree(
        &self,
        ctx: &SearchContext<'_, O>,
        shape: &[bool],
        v: usize,
    ) -> Result<(Frontier, SearchStats), PlannerError> {
        use rayon::prelude::*;

        let mut stats = SearchStats::default();
        if self.delegates(ctx.tree, shape, v) {
            let frontier = self.delegate(ctx, v, &mut stats)?;
            return Ok((frontier, stats));
        }

        let solved = ctx
            .tree
            .children(v)
            .par_iter()
            .map(|&c| self.solve_subtree(ctx, shape, c))
            .collect::<Result<Vec<_>, _>>()?;
        let mut children = Vec::with_capacity(solved.len());
        for (frontier, s) in solved {
            stats += s;
            children.push(frontier);
        }
        let frontier = combine(ctx, v, children, &mut stats)?;
        Ok((frontier, stats))
    }
}

impl<O: CostOracle> PartitionStrategy for TreePartitioner<O> {
    fn name(&self) -> &str {
        "tree"
    }

    fn plan(
        &self,
        tree: &CallTree<Validated>,
        limits: &PlatformLimits,
        latency: Option<&LatencyLimit>,
    ) -> Result<Partition, PlannerError> {
        self.solve(tree, limits, latency).map(|s| s.partition)
    }
}

/// Builds the frontier of `v` from its children's frontiers, given in call
/// order.
fn combine<O: CostOracle + ?Sized>(
    ctx: &SearchContext<'_, O>,
    v: usize,
    children: Vec<Frontier>,
    stats: &mut SearchStats,
) -> Result<Frontier, PlannerError> {
    stats.nodes_processed += 1;
    let mut acc = Frontier::singleton(ctx.open(v));

    for (&c, below) in ctx.tree.children(v).iter().zip(children) {
        let sealed = below.closed();
        let mut next = Frontier::merge(&acc, &below, |up, low| {
            ctx.attach_below(up, v, low, c, false)
        });
        next.merge_into(&acc, &sealed, |up, low| {
            ctx.attach_below(up, v, low, c, true)
        });
        stats.record(&sealed);
        stats.record(&next);

        if next.is_empty() {
            return Err(ctx.exhausted());
        }
        if cfg!(debug_assertions) {
            next.check_invariants()?;
        }
        acc = next;
    }

    tracing::trace!(node = %ctx.tree.node(v).id, states = acc.len(), "frontier computed");
    Ok(acc)
}

/// `true` for every function whose subtree is a simple path.
fn path_shaped(tree: &CallTree<Validated>) -> Vec<bool> {
    let mut shape = vec![false; tree.num_nodes()];
    for v in tree.post_order() {
        shape[v] = match tree.children(v) {
            [] => true,
            [c] => shape[*c],
            _ => false,
        };
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Infeasibility, MemoryCapacity};
    use call_graph::{Edge, Node};

    /// P -> 1 -> {2 -> 4 -> 5, 3}; memories 1..=5.
    fn branching() -> CallTree<Validated> {
        CallTree::new(
            "branching".into(),
            "P".into(),
            (1..=5).map(|i| Node::new(i.to_string(), 10, i)).collect(),
            vec![
                Edge::new("P", "1", 1, 0),
                Edge::new("1", "2", 1, 0),
                Edge::new("1", "3", 2, 0),
                Edge::new("2", "4", 1, 0),
                Edge::new("4", "5", 3, 0),
            ],
        )
        .validate()
        .unwrap()
    }

    fn limits(mb: u64) -> PlatformLimits {
        PlatformLimits::new(MemoryCapacity::from_mb(mb))
    }

    #[test]
    fn test_path_shape() {
        let tree = branching();
        assert_eq!(path_shaped(&tree), vec![false, true, true, true, true]);
    }

    #[test]
    fn test_schedule_skips_delegated_paths() {
        let tree = branching();
        let shape = path_shaped(&tree);
        let delegating = TreePartitioner::new();
        assert_eq!(delegating.schedule(&tree, &shape), vec![1, 2, 0]);
        let plain = TreePartitioner::new().with_chain_delegation(false);
        assert_eq!(plain.schedule(&tree, &shape), vec![4, 3, 1, 2, 0]);
    }

    #[test]
    fn test_single_unit_when_everything_fits() {
        let tree = branching();
        let p = TreePartitioner::new().plan(&tree, &limits(15), None).unwrap();
        assert_eq!(p.num_units(), 1);
        assert_eq!(p.blocks()[0], vec!["1", "2", "4", "5", "3"]);
        p.validate(&tree).unwrap();
    }

    #[test]
    fn test_cheapest_cut_is_chosen() {
        let tree = branching();
        // Cutting "2" or "4" costs one invocation either way; cutting "2"
        // leaves the smaller unit at the root.
        let p = TreePartitioner::new().plan(&tree, &limits(11), None).unwrap();
        assert_eq!(p.blocks(), vec![vec!["1", "3"], vec!["2", "4", "5"]]);
        assert_eq!(p.cost, 10 * 15 + 100 + 100);
    }

    #[test]
    fn test_delegation_preserves_frontiers() {
        let tree = branching();
        let m = LinearCostModel::default();
        for cap in [5, 7, 9, 11, 15] {
            for latency in [None, Some(LatencyLimit::every_path(80))] {
                let ctx = SearchContext::new(&tree, &m, &limits(cap), latency.as_ref()).unwrap();
                let on = TreePartitioner::new();
                let off = TreePartitioner::new().with_chain_delegation(false);
                let a = on
                    .entry_frontiers(&ctx, &mut SearchStats::default())
                    .unwrap();
                let b = off
                    .entry_frontiers(&ctx, &mut SearchStats::default())
                    .unwrap();
                assert_eq!(a[0].1.objectives(), b[0].1.objectives(), "cap {cap}");
            }
        }
    }

    #[test]
    fn test_memory_infeasible() {
        let tree = branching();
        let err = TreePartitioner::new().plan(&tree, &limits(4), None).unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Infeasible(Infeasibility::MemoryExceeded { required: 5, capacity: 4, .. })
        ));
    }

    #[test]
    fn test_designated_path_ignores_other_branches() {
        let tree = branching();
        // Path 1 -> 3 takes 20 ms uncut; the longer 1 -> 2 -> 4 -> 5 path is
        // not checked.
        let p = TreePartitioner::new()
            .plan(&tree, &limits(15), Some(&LatencyLimit::along_path(20, "3")))
            .unwrap();
        assert_eq!(p.critical_latency, 20);
        assert_eq!(p.num_units(), 1);
    }

    #[test]
    fn test_latency_forces_merge() {
        let tree = branching();
        // With 11 MB the cheapest split cuts "2"; a 40 ms bound on every
        // path allows no hop on 1 -> 2 -> 4 -> 5 (40 ms uncut), so the
        // capacity cannot be met.
        let err = TreePartitioner::new()
            .plan(&tree, &limits(11), Some(&LatencyLimit::every_path(40)))
            .unwrap_err();
        assert!(matches!(
            err,
            PlannerError::Infeasible(Infeasibility::LatencyConflictsWithCapacity { .. })
        ));
        let p = TreePartitioner::new()
            .plan(&tree, &limits(15), Some(&LatencyLimit::every_path(40)))
            .unwrap();
        assert_eq!(p.critical_latency, 40);
    }

    #[test]
    fn test_latency_conflict_blames_package_cap() {
        let tree = CallTree::new(
            "packaged".into(),
            "P".into(),
            vec![
                Node::new("a", 10, 1).with_deployment_size(10),
                Node::new("b", 10, 1).with_deployment_size(10),
                Node::new("c", 10, 1).with_deployment_size(10),
            ],
            vec![
                Edge::new("P", "a", 1, 0),
                Edge::new("a", "b", 1, 0),
                Edge::new("a", "c", 1, 0),
            ],
        )
        .validate()
        .unwrap();
        let latency = LatencyLimit::every_path(20);
        for delegate in [true, false] {
            let planner = TreePartitioner::new().with_chain_delegation(delegate);
            let err = planner
                .plan(&tree, &limits(100).with_deployment_size_cap(15), Some(&latency))
                .unwrap_err();
            assert!(matches!(
                err,
                PlannerError::Infeasible(Infeasibility::LatencyConflictsWithDeploymentCap { bound: 20, cap: 15 })
            ));
            let p = planner.plan(&tree, &limits(100), Some(&latency)).unwrap();
            assert_eq!(p.num_units(), 1);
        }
    }

    #[test]
    fn test_multiple_entries() {
        let tree = CallTree::new(
            "fan-in".into(),
            "P".into(),
            vec![Node::new("a", 10, 2), Node::new("b", 10, 2), Node::new("c", 10, 2)],
            vec![
                Edge::new("P", "a", 1, 0),
                Edge::new("P", "b", 1, 0),
                Edge::new("b", "c", 1, 0),
            ],
        )
        .validate()
        .unwrap();
        let s = TreePartitioner::new().solve(&tree, &limits(4), None).unwrap();
        assert_eq!(s.partition.blocks(), vec![vec!["a"], vec!["b", "c"]]);
        assert_eq!(s.partition.cost, 60 + 200);
        assert_eq!(s.stats.chains_delegated, 1);
    }
}
