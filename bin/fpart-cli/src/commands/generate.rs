// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `fpart generate` command: write a seeded random service description.

use anyhow::Context;
use call_graph::generator::{random_chain, random_tree, GeneratorParams};
use call_graph::ServiceDescription;
use std::path::PathBuf;

pub fn execute(nodes: usize, seed: u64, chain: bool, output: Option<PathBuf>) -> anyhow::Result<()> {
    anyhow::ensure!(nodes > 0, "a service needs at least one function");

    let params = GeneratorParams::with_nodes(nodes);
    let tree = if chain {
        random_chain(&params, seed)
    } else {
        random_tree(&params, seed)
    };
    let json = ServiceDescription::from(&tree).to_json()?;

    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("cannot write '{}'", path.display()))?;
            tracing::info!(path = %path.display(), nodes, seed, "wrote service description");
        }
        None => println!("{json}"),
    }
    Ok(())
}
