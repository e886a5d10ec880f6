// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `fpart inspect` command: display a call tree and capacity recommendations.
//!
//! Prints every function with its caller and invocation attributes, then
//! the smallest capacity that admits any partition and the capacity at
//! which the whole tree fits one unit.

use super::{load_tree, truncate};
use crate::config::PlannerConfig;
use partition_planner::{MemoryCapacity, PlatformLimits};

pub fn execute(config: &PlannerConfig) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║               fpart · Call Tree Inspector            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let tree = load_tree(config)?;

    // ── Summary ────────────────────────────────────────────────
    println!("  Tree: {}", tree.name);
    println!("  Root: {}", tree.root());
    println!("  Functions: {}", tree.num_nodes());
    println!("  Entry points: {}", tree.entries().len());
    println!("  Leaves: {}", tree.leaves().len());
    println!("  Shape: {}", if tree.is_chain() { "simple path" } else { "branching" });
    println!("  Longest path: {} ms", tree.longest_path_time());
    println!();

    // ── Per-Function Detail ────────────────────────────────────
    println!(
        "  {:<16} {:<16} {:>8} {:>8} {:>8} {:>6} {:>6}",
        "Function", "Caller", "Time", "Memory", "Package", "Rate", "Data",
    );
    println!("  {}", "-".repeat(76));

    for v in tree.pre_order() {
        let node = tree.node(v);
        let edge = tree.incoming(v);
        let package = node
            .deployment_size
            .map_or_else(|| "-".to_string(), |s| format!("{s} MB"));
        println!(
            "  {:<16} {:<16} {:>5} ms {:>5} MB {:>8} {:>6} {:>6}",
            truncate(&node.id, 16),
            truncate(&edge.caller, 16),
            node.execution_time,
            node.memory,
            package,
            edge.invocation_rate,
            edge.data_volume,
        );
    }
    println!();

    // ── Capacity Recommendations ───────────────────────────────
    let min_mb = tree.max_node_memory().max(1);
    let ideal_mb = tree.total_memory().max(1);
    let min = PlatformLimits::new(MemoryCapacity::from_mb(min_mb));
    let ideal = PlatformLimits::new(MemoryCapacity::from_mb(ideal_mb));

    println!("  Capacity Recommendations:");
    println!("   Minimum (one function per unit): {min}");
    println!("   Single unit (whole tree):        {ideal}");
    println!();

    Ok(())
}
