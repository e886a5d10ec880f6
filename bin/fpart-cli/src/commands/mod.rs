// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared helpers.

pub mod generate;
pub mod inspect;
pub mod plan;
pub mod sweep;

use crate::config::PlannerConfig;
use anyhow::Context;
use call_graph::{graph::Validated, CallTree, ServiceDescription};
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads and validates the service description named by the config.
pub fn load_tree(config: &PlannerConfig) -> anyhow::Result<CallTree<Validated>> {
    let path = config
        .graph_path
        .as_deref()
        .context("no service description given; pass --graph or set graph_path")?;
    let description = ServiceDescription::from_file(path)
        .with_context(|| format!("failed to load service description '{}'", path.display()))?;
    let tree = description
        .into_tree()
        .validate()
        .with_context(|| format!("malformed call tree in '{}'", path.display()))?;
    tracing::info!("{}", tree.summary());
    Ok(tree)
}

/// Shortens `s` to at most `max` characters.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("resize", 10), "resize");
        assert_eq!(truncate("car_detection_stage", 10), "car_det...");
    }

    #[test]
    fn test_load_tree_without_path() {
        let err = load_tree(&PlannerConfig::default()).unwrap_err();
        assert!(err.to_string().contains("--graph"));
    }
}
