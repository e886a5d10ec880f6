// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shared helpers for the integration tests: the 10-node fixture, random
//! inputs and a brute-force reference solver.

#![allow(dead_code)]

use call_graph::generator::{random_chain, random_tree, GeneratorParams};
use call_graph::{graph::Validated, CallTree, ServiceDescription};
use partition_planner::{
    evaluate, CostOracle, CutSet, Infeasibility, LatencyLimit, MemoryCapacity, Partition,
    PlannerError, PlatformLimits,
};
use std::collections::HashSet;

/// The 10-node fixture tree rooted at "P".
pub fn fixture() -> CallTree<Validated> {
    ServiceDescription::from_json(include_str!("../../fixtures/fixture_tree.json"))
        .unwrap()
        .into_tree()
        .validate()
        .unwrap()
}

/// The 14-function parking-lot camera service (daytime profile).
pub fn parking() -> CallTree<Validated> {
    ServiceDescription::from_json(include_str!("../../fixtures/parking_daytime.json"))
        .unwrap()
        .into_tree()
        .validate()
        .unwrap()
}

pub fn limits(mb: u64) -> PlatformLimits {
    PlatformLimits::new(MemoryCapacity::from_mb(mb))
}

/// Generator ranges where small capacities force interesting cuts.
pub fn params(nodes: usize) -> GeneratorParams {
    GeneratorParams {
        nodes,
        execution_time: (1, 100),
        memory: (1, 8),
        invocation_rate: (1, 4),
        data_volume: (0, 20),
    }
}

pub fn chain(nodes: usize, seed: u64) -> CallTree<Validated> {
    random_chain(&params(nodes), seed).validate().unwrap()
}

pub fn tree(nodes: usize, seed: u64) -> CallTree<Validated> {
    random_tree(&params(nodes), seed).validate().unwrap()
}

/// Critical-path latency with every function of an entry in one unit.
pub fn uncut_latency<O: CostOracle>(tree: &CallTree<Validated>, oracle: &O) -> u64 {
    evaluate(tree, oracle, &CutSet::uncut(tree), None)
        .unwrap()
        .critical_latency
}

/// Minimum cost over every cut pattern that satisfies the limits, or `None`
/// if no pattern does.
pub fn exhaustive_min<O: CostOracle>(
    tree: &CallTree<Validated>,
    oracle: &O,
    limits: &PlatformLimits,
    latency: Option<&LatencyLimit>,
) -> Option<u64> {
    let n = tree.num_nodes();
    let free: Vec<usize> = (0..n).filter(|&v| !tree.is_entry(v)).collect();
    assert!(free.len() <= 16, "too many edges for exhaustive search");

    let mut best: Option<u64> = None;
    for mask in 0u32..(1 << free.len()) {
        let mut flags = vec![false; n];
        for (bit, &v) in free.iter().enumerate() {
            flags[v] = mask & (1 << bit) != 0;
        }
        let cuts = CutSet::from_flags(tree, flags);
        let e = evaluate(tree, oracle, &cuts, latency).unwrap();

        if e.peak_memory > limits.capacity_mb() {
            continue;
        }
        if limits
            .deployment_size_cap
            .is_some_and(|cap| e.peak_deployment_size > cap)
        {
            continue;
        }
        if latency.is_some_and(|l| e.critical_latency > l.bound) {
            continue;
        }
        best = Some(best.map_or(e.cost, |b| b.min(e.cost)));
    }
    best
}

/// Asserts that a planner result agrees with the brute-force optimum.
pub fn assert_optimal(
    result: Result<Partition, PlannerError>,
    expected: Option<u64>,
    context: &str,
) {
    match (result, expected) {
        (Ok(p), Some(cost)) => assert_eq!(p.cost, cost, "{context}"),
        (Err(PlannerError::Infeasible(_)), None) => {}
        (Ok(p), None) => panic!("{context}: planner found cost {} but no pattern is feasible", p.cost),
        (Err(e), Some(cost)) => panic!("{context}: planner failed ({e}) but optimum is {cost}"),
        (Err(e), None) => panic!("{context}: expected an infeasibility error, got {e}"),
    }
}

/// Checks completeness, disjointness and connectivity without relying on
/// `Partition::validate`.
pub fn assert_well_formed(tree: &CallTree<Validated>, partition: &Partition) {
    let mut seen = HashSet::new();
    for block in partition.blocks() {
        assert!(!block.is_empty(), "empty block");
        let members: HashSet<usize> = block
            .iter()
            .map(|id| tree.index_of(id).expect("known function"))
            .collect();
        assert_eq!(members.len(), block.len(), "duplicate inside block");
        for &v in &members {
            assert!(seen.insert(v), "function '{}' in two blocks", tree.node(v).id);
        }

        let heads = members
            .iter()
            .filter(|&&v| tree.parent(v).map_or(true, |p| !members.contains(&p)))
            .count();
        assert_eq!(heads, 1, "block {block:?} is not connected");
    }
    assert_eq!(seen.len(), tree.num_nodes(), "not every function is assigned");
}

pub fn is_memory_infeasible(err: &PlannerError) -> bool {
    matches!(
        err,
        PlannerError::Infeasible(Infeasibility::MemoryExceeded { .. })
    )
}
