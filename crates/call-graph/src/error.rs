// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for service description parsing and tree validation.

/// Errors raised while reading or validating a call tree.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    /// The description file could not be read.
    #[error("failed to read service description: {0}")]
    Io(#[from] std::io::Error),

    /// The description JSON is malformed or misses a required attribute.
    #[error("failed to parse service description: {0}")]
    Parse(#[from] serde_json::Error),

    /// The tree contains no function besides the root.
    #[error("call tree '{0}' contains no functions")]
    Empty(String),

    /// Two functions share the same identifier (or a function reuses the root's).
    #[error("duplicate node identifier '{0}'")]
    DuplicateNode(String),

    /// An edge references a node that is not declared.
    #[error("edge {caller} -> {callee} references unknown node '{missing}'")]
    UnknownNode {
        caller: String,
        callee: String,
        missing: String,
    },

    /// An edge that can never appear in a call tree (self-loop, call into the root).
    #[error("invalid edge {caller} -> {callee}: {detail}")]
    InvalidEdge {
        caller: String,
        callee: String,
        detail: String,
    },

    /// A function is invoked by more than one caller.
    #[error("node '{node}' has multiple callers ('{first}' and '{second}')")]
    MultipleParents {
        node: String,
        first: String,
        second: String,
    },

    /// A function is never invoked.
    #[error("node '{0}' has no incoming edge")]
    Orphan(String),

    /// A function is part of a call cycle and cannot be reached from the root.
    #[error("node '{0}' is part of a cycle unreachable from the root")]
    Cycle(String),

    /// The platform root does not invoke any function.
    #[error("root '{0}' has no outgoing edge")]
    RootNotCalled(String),
}
