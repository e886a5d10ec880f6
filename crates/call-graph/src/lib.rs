// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # call-graph
//!
//! The input model for serverless call-tree partitioning.
//!
//! A serverless application is described as a tree of functions hanging off
//! a distinguished **platform ingress** root. This crate captures exactly
//! what the partitioner needs from that description:
//!
//! - [`Node`]: a function with its execution time, memory requirement and
//!   optional deployment package size.
//! - [`Edge`]: a caller → callee invocation with its rate and data volume.
//! - [`CallTree`]: the rooted tree, with a **type-state pattern**
//!   (`Loaded` → `Validated`) so the planner never sees a malformed shape.
//! - [`ServiceDescription`]: the JSON document a tree is read from.
//! - [`generator`]: seeded random chains and trees for tests and sweeps.
//!
//! # Example
//! ```
//! use call_graph::ServiceDescription;
//!
//! let json = r#"{
//!   "name": "pipeline",
//!   "nodes": [
//!     { "id": "1", "execution_time": 20, "memory": 128 },
//!     { "id": "2", "execution_time": 35, "memory": 256 }
//!   ],
//!   "edges": [
//!     { "caller": "P", "callee": "1", "invocation_rate": 1, "data_volume": 4 },
//!     { "caller": "1", "callee": "2", "invocation_rate": 2, "data_volume": 8 }
//!   ]
//! }"#;
//! let tree = ServiceDescription::from_json(json).unwrap().into_tree().validate().unwrap();
//! assert_eq!(tree.num_nodes(), 2);
//! assert!(tree.is_chain());
//! ```

mod description;
mod error;
pub mod generator;
pub mod graph;
mod node;

pub use description::{ServiceDescription, DEFAULT_ROOT};
pub use error::GraphError;
pub use graph::CallTree;
pub use node::{Edge, Node};
