// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # fpart
//!
//! Command-line interface for the serverless call-tree partitioner.
//!
//! ## Usage
//! ```bash
//! # Partition a service under a 512 MB unit capacity and an 800 ms limit
//! fpart plan --graph service.json --memory-capacity 512M --latency 800
//!
//! # Compare capacities
//! fpart sweep --graph service.json --sweep-memory 256M,512M,1G
//!
//! # Inspect a service description
//! fpart inspect --graph service.json
//!
//! # Write a random 20-function tree
//! fpart generate --nodes 20 --seed 7 -o service.json
//! ```
//!
//! Flags given on the command line take precedence over values from the
//! `--config` file.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::PlannerConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "fpart",
    about = "Cost-optimal partitioning of serverless call trees",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition a call tree into deployment units.
    Plan {
        /// Path to the JSON service description.
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Memory capacity per unit (e.g., "512M", "3G").
        #[arg(short, long)]
        memory_capacity: Option<String>,

        /// Latency limit in ms.
        #[arg(short, long)]
        latency: Option<u64>,

        /// Apply the latency limit only to the path ending at this function.
        #[arg(long)]
        critical_end: Option<String>,

        /// Cap on the summed deployment package size of a unit, in MB.
        #[arg(long)]
        deployment_cap: Option<u64>,

        /// Partition strategy: tree, chain.
        #[arg(short, long)]
        strategy: Option<String>,

        /// Solve path-shaped subtrees node by node instead of delegating them.
        #[arg(long)]
        no_chain_delegation: bool,

        /// Print the partition as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print a call tree's structure and capacity recommendations.
    Inspect {
        /// Path to the JSON service description.
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Solve across several memory capacities.
    Sweep {
        /// Path to the JSON service description.
        #[arg(short, long)]
        graph: Option<PathBuf>,

        /// Comma-separated capacities to sweep (e.g., "256M,512M,1G").
        #[arg(long)]
        sweep_memory: String,

        /// Latency limit in ms.
        #[arg(short, long)]
        latency: Option<u64>,

        /// Strategies to compare (comma-separated).
        #[arg(long, default_value = "tree")]
        strategies: String,
    },

    /// Write a random service description as JSON.
    Generate {
        /// Number of functions.
        #[arg(short, long, default_value_t = 10)]
        nodes: usize,

        /// Random seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Generate a simple path instead of a branching tree.
        #[arg(long)]
        chain: bool,

        /// Output file (stdout if omitted).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::default(),
    };

    match cli.command {
        Commands::Plan {
            graph,
            memory_capacity,
            latency,
            critical_end,
            deployment_cap,
            strategy,
            no_chain_delegation,
            json,
        } => {
            config.graph_path = graph.or(config.graph_path);
            if let Some(capacity) = memory_capacity {
                config.memory_capacity = capacity;
            }
            config.latency_limit = latency.or(config.latency_limit);
            config.critical_path_end = critical_end.or(config.critical_path_end);
            config.deployment_size_cap = deployment_cap.or(config.deployment_size_cap);
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if no_chain_delegation {
                config.delegate_chains = false;
            }
            commands::plan::execute(&config, json)
        }
        Commands::Inspect { graph } => {
            config.graph_path = graph.or(config.graph_path);
            commands::inspect::execute(&config)
        }
        Commands::Sweep {
            graph,
            sweep_memory,
            latency,
            strategies,
        } => {
            config.graph_path = graph.or(config.graph_path);
            config.latency_limit = latency.or(config.latency_limit);
            commands::sweep::execute(&config, &sweep_memory, &strategies)
        }
        Commands::Generate {
            nodes,
            seed,
            chain,
            output,
        } => commands::generate::execute(nodes, seed, chain, output),
    }
}
