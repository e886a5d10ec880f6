// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`PartitionStrategy`] trait and strategy implementations.

pub mod chain;
pub mod tree;

use crate::evaluate::{evaluate, CutSet};
use crate::frontier::Frontier;
use crate::search::SearchContext;
use crate::{
    CostOracle, Infeasibility, LatencyLimit, LinearCostModel, Partition, PlannerError,
    PlatformLimits, SearchStats,
};
use call_graph::{graph::Validated, CallTree};
use chain::ChainPartitioner;
use std::time::Instant;
use tree::TreePartitioner;

/// Trait for partition strategies.
///
/// Each strategy takes a validated call tree, the platform limits and an
/// optional latency limit, and produces a minimum-cost [`Partition`] that
/// respects them.
///
/// Strategies are purely algorithmic (no I/O, no system calls), so they are
/// unit-testable and amenable to property-based testing.
pub trait PartitionStrategy: Send + Sync {
    /// Human-readable name of this strategy.
    fn name(&self) -> &str;

    /// Produces a partition for the given tree and limits.
    fn plan(
        &self,
        tree: &CallTree<Validated>,
        limits: &PlatformLimits,
        latency: Option<&LatencyLimit>,
    ) -> Result<Partition, PlannerError>;
}

/// A partition together with the decisions and bookkeeping behind it.
#[derive(Debug, Clone)]
pub struct Solution {
    pub partition: Partition,
    pub cuts: CutSet,
    pub stats: SearchStats,
}

/// Looks up a strategy by name, pricing with `cost_model`.
pub fn strategy_by_name(
    name: &str,
    cost_model: LinearCostModel,
    delegate_chains: bool,
) -> Result<Box<dyn PartitionStrategy>, PlannerError> {
    match name {
        "tree" => Ok(Box::new(
            TreePartitioner::with_oracle(cost_model).with_chain_delegation(delegate_chains),
        )),
        "chain" => {
            if !delegate_chains {
                tracing::warn!("chain delegation setting has no effect on the chain strategy");
            }
            Ok(Box::new(ChainPartitioner::with_oracle(cost_model)))
        }
        other => Err(PlannerError::UnknownStrategy(other.to_string())),
    }
}

/// Runs `search` and, when it fails with a latency conflict under a
/// deployment size cap, reruns it without the cap to find out which limit
/// the latency bound actually conflicts with.
pub(crate) fn attribute_latency_conflict<F>(
    limits: &PlatformLimits,
    search: F,
) -> Result<Solution, PlannerError>
where
    F: Fn(&PlatformLimits) -> Result<Solution, PlannerError>,
{
    match search(limits) {
        Err(PlannerError::Infeasible(Infeasibility::LatencyConflictsWithCapacity {
            bound,
            capacity,
        })) => {
            let Some(cap) = limits.deployment_size_cap else {
                return Err(Infeasibility::LatencyConflictsWithCapacity { bound, capacity }.into());
            };
            match search(&PlatformLimits::new(limits.memory)) {
                Ok(_) => {
                    tracing::debug!(cap, "latency limit met once the package cap is lifted");
                    Err(Infeasibility::LatencyConflictsWithDeploymentCap { bound, cap }.into())
                }
                Err(PlannerError::Infeasible(_)) => {
                    Err(Infeasibility::LatencyConflictsWithCapacity { bound, capacity }.into())
                }
                Err(e) => Err(e),
            }
        }
        other => other,
    }
}

/// Turns the per-entry frontiers of a finished search into a checked solution.
///
/// Picks the cheapest state of every entry subtree, rebuilds the cut set
/// from their traces and re-evaluates it from scratch. Any disagreement
/// between the search and the evaluation is an invariant violation.
pub(crate) fn assemble<O: CostOracle + ?Sized>(
    strategy_name: &str,
    ctx: &SearchContext<'_, O>,
    limits: &PlatformLimits,
    latency: Option<&LatencyLimit>,
    frontiers: &[(usize, Frontier)],
    mut stats: SearchStats,
    started: Instant,
) -> Result<Solution, PlannerError> {
    let mut cost = 0;
    let mut traces = Vec::with_capacity(frontiers.len());
    for (entry, frontier) in frontiers {
        let best = frontier.cheapest().ok_or_else(|| ctx.exhausted())?;
        cost += best.cost() + ctx.ingress_cost(*entry);
        traces.push(best.trace.as_ref());
    }

    let cuts = ctx.cut_set(traces)?;
    let evaluation = evaluate(ctx.tree, ctx.oracle, &cuts, latency)?;
    if evaluation.cost != cost {
        return Err(PlannerError::InvariantViolation(format!(
            "search cost {cost} disagrees with evaluated cost {}",
            evaluation.cost
        )));
    }
    if let Some(limit) = latency {
        if evaluation.critical_latency > limit.bound {
            return Err(PlannerError::InvariantViolation(format!(
                "selected partition has latency {} ms over the {} ms limit",
                evaluation.critical_latency, limit.bound
            )));
        }
    }
    if let Some(cap) = limits.deployment_size_cap {
        if evaluation.peak_deployment_size > cap {
            return Err(PlannerError::InvariantViolation(format!(
                "selected partition has a {} MB unit package over the {cap} MB cap",
                evaluation.peak_deployment_size
            )));
        }
    }

    let partition = Partition::from_cuts(
        strategy_name,
        ctx.tree,
        &cuts,
        &evaluation,
        limits.capacity_mb(),
    );
    partition.validate(ctx.tree)?;

    stats.elapsed = started.elapsed();
    tracing::debug!("search stats: {}", stats.summary());
    tracing::info!(
        strategy = strategy_name,
        units = partition.num_units(),
        cost = partition.cost,
        latency_ms = partition.critical_latency,
        "partition found"
    );

    Ok(Solution {
        partition,
        cuts,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_by_name() {
        let tree = strategy_by_name("tree", LinearCostModel::default(), true).unwrap();
        assert_eq!(tree.name(), "tree");
        let chain = strategy_by_name("chain", LinearCostModel::default(), true).unwrap();
        assert_eq!(chain.name(), "chain");
        assert!(matches!(
            strategy_by_name("greedy", LinearCostModel::default(), true),
            Err(PlannerError::UnknownStrategy(_))
        ));
    }
}
