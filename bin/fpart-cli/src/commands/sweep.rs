// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `fpart sweep` command: solve one tree across capacities and strategies.
//!
//! Prints units, cost, critical latency and solve time for each
//! combination, then the cheapest configuration found.

use super::load_tree;
use crate::config::PlannerConfig;
use partition_planner::MemoryCapacity;
use std::time::Instant;

pub fn execute(config: &PlannerConfig, sweep_memory: &str, strategies: &str) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║                 fpart · Capacity Sweep               ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // Parse comma-separated capacities.
    let capacities: Vec<MemoryCapacity> = sweep_memory
        .split(',')
        .map(|s| {
            MemoryCapacity::parse(s.trim())
                .map_err(|e| anyhow::anyhow!("invalid capacity '{}': {e}", s.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let strategy_names: Vec<&str> = strategies.split(',').map(|s| s.trim()).collect();

    let tree = load_tree(config)?;
    let latency = config.latency_limit()?;

    println!("  Tree:       {}", tree.summary());
    println!(
        "  Capacities: {:?}",
        capacities.iter().map(|c| format!("{c}")).collect::<Vec<_>>(),
    );
    println!("  Strategies: {strategy_names:?}");
    match &latency {
        Some(l) => println!("  Latency:    {l}"),
        None => println!("  Latency:    unconstrained"),
    }
    println!();

    // ── Results Table ──────────────────────────────────────────
    println!(
        "  {:<8} {:>10} {:>6} {:>12} {:>10} {:>10}",
        "Strategy", "Capacity", "Units", "Cost", "Latency", "Time",
    );
    println!("  {}", "-".repeat(62));

    let mut results: Vec<SweepResult> = Vec::new();

    for &capacity in &capacities {
        for &name in &strategy_names {
            let run = PlannerConfig {
                memory_capacity: format!("{}M", capacity.as_mb()),
                strategy: name.to_string(),
                ..config.clone()
            };
            match run_single(&run, &tree, latency.as_ref()) {
                Ok(r) => {
                    println!(
                        "  {:<8} {:>10} {:>6} {:>12} {:>7} ms {:>7.2}ms",
                        r.strategy,
                        format!("{capacity}"),
                        r.units,
                        r.cost,
                        r.latency,
                        r.elapsed_ms,
                    );
                    results.push(r);
                }
                Err(e) => {
                    println!(
                        "  {:<8} {:>10} {:>6}     FAILED: {e}",
                        name,
                        format!("{capacity}"),
                        "-",
                    );
                }
            }
        }
    }
    println!();

    // ── Summary ────────────────────────────────────────────────
    let Some(cheapest) = results.iter().min_by_key(|r| (r.cost, r.capacity.as_mb())) else {
        println!("  No feasible configuration.");
        return Ok(());
    };
    println!("  Summary:");
    println!(
        "   Cheapest:  {} @ {} (cost {}, {} units)",
        cheapest.strategy, cheapest.capacity, cheapest.cost, cheapest.units,
    );
    println!();

    Ok(())
}

#[derive(Debug)]
struct SweepResult {
    strategy: String,
    capacity: MemoryCapacity,
    units: usize,
    cost: u64,
    latency: u64,
    elapsed_ms: f64,
}

/// Solves a single capacity/strategy combination.
fn run_single(
    config: &PlannerConfig,
    tree: &call_graph::CallTree<call_graph::graph::Validated>,
    latency: Option<&partition_planner::LatencyLimit>,
) -> anyhow::Result<SweepResult> {
    let limits = config.parse_limits()?;
    let strategy = config.create_strategy()?;

    let started = Instant::now();
    let partition = strategy.plan(tree, &limits, latency)?;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    Ok(SweepResult {
        strategy: strategy.name().to_string(),
        capacity: limits.memory,
        units: partition.num_units(),
        cost: partition.cost,
        latency: partition.critical_latency,
        elapsed_ms,
    })
}
