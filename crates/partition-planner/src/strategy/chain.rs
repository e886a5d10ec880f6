// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Chain partitioning strategy.
//!
//! Dynamic program over a simple path of functions. After step `i` the
//! frontier holds every non-dominated way to partition the first `i + 1`
//! functions, each state remembering the memory of its last (still open)
//! unit. Step `i + 1` either extends that unit with the next function or
//! cuts the edge and opens a fresh unit.
//!
//! ```text
//! extend: cost += node_cost          memory += m(i+1)   latency += t(i+1)
//! cut:    cost += node_cost + edge   memory  = m(i+1)   latency += t(i+1) + edge_latency
//! ```
//!
//! The same recurrence run from the tail towards the head, keeping the
//! *head's* unit open, is what the tree strategy uses for path-shaped
//! subtrees; see [`suffix_frontier`].
//!
//! # When to use
//! - The service is a pipeline (every function calls at most one other).

use crate::frontier::Frontier;
use crate::search::SearchContext;
use crate::strategy::{assemble, attribute_latency_conflict, PartitionStrategy, Solution};
use crate::{
    CostOracle, LatencyLimit, LinearCostModel, Partition, PlannerError, PlatformLimits,
    SearchStats,
};
use call_graph::{graph::Validated, CallTree};
use std::time::Instant;

/// A simple path of functions inside a call tree, head first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    nodes: Vec<usize>,
}

impl Chain {
    /// The whole tree as a chain.
    ///
    /// Fails with [`PlannerError::NotAChain`] if the root calls more than one
    /// function or any function calls more than one other.
    pub fn from_tree(tree: &CallTree<Validated>) -> Result<Self, PlannerError> {
        if !tree.is_chain() {
            return Err(PlannerError::NotAChain(tree.name.clone()));
        }
        Self::below(tree, tree.entries()[0])
    }

    /// The path-shaped subtree starting at `head`.
    pub fn below(tree: &CallTree<Validated>, head: usize) -> Result<Self, PlannerError> {
        let mut nodes = vec![head];
        let mut v = head;
        loop {
            match tree.children(v) {
                [] => break,
                [next] => {
                    nodes.push(*next);
                    v = *next;
                }
                _ => {
                    return Err(PlannerError::NotAChain(format!(
                        "{} below '{}'",
                        tree.name,
                        tree.node(head).id
                    )))
                }
            }
        }
        Ok(Self { nodes })
    }

    /// Node indices, head first.
    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn head(&self) -> usize {
        self.nodes[0]
    }
}

/// Chain strategy: forward dynamic program over a path-shaped tree.
#[derive(Debug, Clone, Default)]
pub struct ChainPartitioner<O = LinearCostModel> {
    oracle: O,
}

impl ChainPartitioner {
    /// Chain partitioner with the default linear cost model.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: CostOracle> ChainPartitioner<O> {
    /// Chain partitioner pricing with `oracle`.
    pub fn with_oracle(oracle: O) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Solves a path-shaped tree and returns the partition with statistics.
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
        let chain = Chain::from_tree(tree)?;
        let ctx = SearchContext::new(tree, &self.oracle, limits, latency)?;

        let mut stats = SearchStats::default();
        let frontier = prefix_frontier(&ctx, chain.nodes(), &mut stats)?;
        assemble(
            "chain",
            &ctx,
            limits,
            latency,
            &[(chain.head(), frontier)],
            stats,
            started,
        )
    }
}

impl<O: CostOracle> PartitionStrategy for ChainPartitioner<O> {
    fn name(&self) -> &str {
        "chain"
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

/// Head-to-tail recurrence. The open unit of every resulting state is the
/// one holding the tail.
pub(crate) fn prefix_frontier<O: CostOracle + ?Sized>(
    ctx: &SearchContext<'_, O>,
    nodes: &[usize],
    stats: &mut SearchStats,
) -> Result<Frontier, PlannerError> {
    let Some((&head, rest)) = nodes.split_first() else {
        return Ok(Frontier::new());
    };
    let mut frontier = Frontier::singleton(ctx.open(head));
    stats.nodes_processed += 1;

    for &next in rest {
        frontier = frontier.advance(|s| {
            [
                ctx.attach_after(s, next, false),
                ctx.attach_after(s, next, true),
            ]
            .into_iter()
            .flatten()
        });
        stats.nodes_processed += 1;
        stats.record(&frontier);
        if frontier.is_empty() {
            return Err(ctx.exhausted());
        }
        if cfg!(debug_assertions) {
            frontier.check_invariants()?;
        }
    }
    Ok(frontier)
}

/// Tail-to-head recurrence. The open unit of every resulting state is the
/// one holding the head, so the result can be attached under the head's
/// caller exactly like a frontier built node by node.
pub(crate) fn suffix_frontier<O: CostOracle + ?Sized>(
    ctx: &SearchContext<'_, O>,
    nodes: &[usize],
    stats: &mut SearchStats,
) -> Result<Frontier, PlannerError> {
    let Some((&tail, rest)) = nodes.split_last() else {
        return Ok(Frontier::new());
    };
    let mut frontier = Frontier::singleton(ctx.open(tail));
    let mut callee = tail;
    stats.nodes_processed += 1;

    for &caller in rest.iter().rev() {
        let upper = ctx.open(caller);
        frontier = frontier.advance(|lower| {
            [
                ctx.attach_below(&upper, caller, lower, callee, false),
                ctx.attach_below(&upper, caller, lower, callee, true),
            ]
            .into_iter()
            .flatten()
        });
        callee = caller;
        stats.nodes_processed += 1;
        stats.record(&frontier);
        if frontier.is_empty() {
            return Err(ctx.exhausted());
        }
        if cfg!(debug_assertions) {
            frontier.check_invariants()?;
        }
    }
    Ok(frontier)
}
