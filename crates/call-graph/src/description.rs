// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON service description parsing.
//!
//! # Format
//! ```json
//! {
//!   "name": "parking-daytime",
//!   "root": "P",
//!   "nodes": [
//!     { "id": "1", "execution_time": 288, "memory": 226 },
//!     { "id": "2", "execution_time": 434, "memory": 349, "deployment_size": 40 }
//!   ],
//!   "edges": [
//!     { "caller": "P", "callee": "1", "invocation_rate": 1, "data_volume": 2 },
//!     { "caller": "1", "callee": "2", "invocation_rate": 1, "data_volume": 5 }
//!   ]
//! }
//! ```
//!
//! `root` defaults to `"P"`. Every numeric attribute except
//! `deployment_size` is required; a missing one is a parse error.

use crate::graph::Loaded;
use crate::{CallTree, Edge, GraphError, Node};
use std::path::Path;

/// Identifier used for the platform ingress when a description omits `root`.
pub const DEFAULT_ROOT: &str = "P";

/// Top-level service description, deserialized from JSON.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ServiceDescription {
    /// Application name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Identifier of the platform ingress node.
    #[serde(default = "default_root")]
    pub root: String,
    /// Function definitions.
    pub nodes: Vec<Node>,
    /// Invocation edges, including the ones leaving the root.
    pub edges: Vec<Edge>,
}

fn default_name() -> String {
    "service".to_string()
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

impl ServiceDescription {
    /// Loads a description from a JSON file path.
    pub fn from_file(path: &Path) -> Result<Self, GraphError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parses a description from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialises the description as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, GraphError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Builds an unvalidated tree from this description.
    pub fn into_tree(self) -> CallTree<Loaded> {
        CallTree::new(self.name, self.root, self.nodes, self.edges)
    }
}

impl<S: crate::graph::GraphState> From<&CallTree<S>> for ServiceDescription {
    fn from(tree: &CallTree<S>) -> Self {
        Self {
            name: tree.name.clone(),
            root: tree.root().to_string(),
            nodes: tree.nodes().to_vec(),
            edges: tree.edges().to_vec(),
        }
    }
}
