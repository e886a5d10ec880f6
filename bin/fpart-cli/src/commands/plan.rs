// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `fpart plan` command: partition one call tree and print the units.

use super::{load_tree, truncate};
use crate::config::PlannerConfig;
use anyhow::Context;

pub fn execute(config: &PlannerConfig, json: bool) -> anyhow::Result<()> {
    let tree = load_tree(config)?;
    let limits = config.parse_limits()?;
    let latency = config.latency_limit()?;
    let strategy = config.create_strategy()?;

    let partition = strategy
        .plan(&tree, &limits, latency.as_ref())
        .with_context(|| format!("strategy '{}' failed on '{}'", strategy.name(), tree.name))?;
    partition.validate(&tree)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&partition)?);
        return Ok(());
    }

    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               fpart · Partition Planner              ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    // ── Summary ────────────────────────────────────────────────
    println!("  Tree:      {} ({} functions)", tree.name, tree.num_nodes());
    println!("  Limits:    {limits}");
    match &latency {
        Some(l) => println!("  Latency:   {l}"),
        None => println!("  Latency:   unconstrained"),
    }
    println!("  Strategy:  {}", strategy.name());
    println!();
    println!("  Cost per request:  {}", partition.cost);
    println!("  Critical latency:  {} ms", partition.critical_latency);
    println!(
        "  Peak unit memory:  {} / {} MB",
        partition.peak_memory, partition.memory_capacity
    );
    println!();

    // ── Units ──────────────────────────────────────────────────
    println!(
        "  {:<4} {:<12} {:>10} {:>10}  {}",
        "Unit", "Head", "Memory", "Package", "Functions",
    );
    println!("  {}", "-".repeat(72));
    for unit in &partition.units {
        println!(
            "  {:<4} {:<12} {:>7} MB {:>7} MB  {}",
            unit.unit_index,
            truncate(unit.head(), 12),
            unit.memory,
            unit.deployment_size,
            unit.functions.join(", "),
        );
    }
    println!();

    Ok(())
}
