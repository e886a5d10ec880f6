// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Seeded random call trees.
//!
//! Functions are named `"1"`..`"n"` below the root `"P"`; function `"1"` is
//! the single entry point. Attribute values are drawn uniformly from the
//! inclusive ranges in [`GeneratorParams`], so the same seed always yields
//! the same tree.

use crate::graph::Loaded;
use crate::{CallTree, Edge, Node, DEFAULT_ROOT};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Attribute ranges for generated trees (inclusive bounds).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct GeneratorParams {
    /// Number of functions.
    pub nodes: usize,
    pub execution_time: (u64, u64),
    pub memory: (u64, u64),
    pub invocation_rate: (u64, u64),
    pub data_volume: (u64, u64),
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            nodes: 10,
            execution_time: (1, 100),
            memory: (1, 3),
            invocation_rate: (1, 3),
            data_volume: (1, 20),
        }
    }
}

impl GeneratorParams {
    /// Default ranges with `nodes` functions.
    pub fn with_nodes(nodes: usize) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }
}

/// Generates a simple path `P -> 1 -> 2 -> ... -> n`.
pub fn random_chain(params: &GeneratorParams, seed: u64) -> CallTree<Loaded> {
    generate(params, seed, "random_chain", |_, i| i - 1)
}

/// Generates a random tree where each function `i > 1` is invoked by a
/// uniformly chosen function among `1..i`.
pub fn random_tree(params: &GeneratorParams, seed: u64) -> CallTree<Loaded> {
    generate(params, seed, "random_tree", |rng, i| rng.random_range(1..i))
}

fn generate<F>(params: &GeneratorParams, seed: u64, kind: &str, mut pick_parent: F) -> CallTree<Loaded>
where
    F: FnMut(&mut StdRng, usize) -> usize,
{
    let mut rng = StdRng::seed_from_u64(seed);
    let mut nodes = Vec::with_capacity(params.nodes);
    let mut edges = Vec::with_capacity(params.nodes);

    for i in 1..=params.nodes {
        nodes.push(Node::new(
            i.to_string(),
            draw(&mut rng, params.execution_time),
            draw(&mut rng, params.memory),
        ));
        let caller = if i == 1 {
            DEFAULT_ROOT.to_string()
        } else {
            pick_parent(&mut rng, i).to_string()
        };
        edges.push(Edge::new(
            caller,
            i.to_string(),
            draw(&mut rng, params.invocation_rate),
            draw(&mut rng, params.data_volume),
        ));
    }

    CallTree::new(
        format!("{kind}_{}_{seed}", params.nodes),
        DEFAULT_ROOT.to_string(),
        nodes,
        edges,
    )
}

fn draw(rng: &mut StdRng, (lo, hi): (u64, u64)) -> u64 {
    if lo >= hi {
        lo
    } else {
        rng.random_range(lo..=hi)
    }
}
