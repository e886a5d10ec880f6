// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Call tree: serverless functions rooted at the platform ingress.
//!
//! # Type-State Pattern
//!
//! ```text
//! CallTree<Loaded>     : nodes and edges parsed, shape not yet checked.
//!       │  .validate()
//!       ▼
//! CallTree<Validated>  : a proper rooted tree, indexed for traversal.
//! ```
//!
//! Only a validated tree exposes the topology accessors the partitioner
//! relies on, so a malformed shape (cycle, multi-parent node, orphan) can
//! never reach the search. Functions are addressed by their position in the
//! node list; the root is not a function and has no index.

use crate::{Edge, GraphError, Node};
use std::collections::{HashMap, VecDeque};
use std::fmt;

// ── Type-state markers ─────────────────────────────────────────────

/// Marker: tree has been loaded but not validated.
#[derive(Debug, Clone)]
pub struct Loaded;

/// Marker: tree has been validated and indexed.
#[derive(Debug, Clone)]
pub struct Validated;

/// Sealed trait for tree states.
pub trait GraphState: fmt::Debug + Clone {}
impl GraphState for Loaded {}
impl GraphState for Validated {}

/// Parent/child index built during validation.
#[derive(Debug, Clone, Default)]
struct Topology {
    index: HashMap<String, usize>,
    parent: Vec<Option<usize>>,
    incoming: Vec<usize>,
    children: Vec<Vec<usize>>,
    entries: Vec<usize>,
}

// ── CallTree ───────────────────────────────────────────────────────

/// A serverless application as a tree of functions below an ingress root.
#[derive(Debug, Clone)]
pub struct CallTree<S: GraphState = Loaded> {
    /// Human-readable application name.
    pub name: String,
    root: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    topology: Topology,
    _state: std::marker::PhantomData<S>,
}

impl<S: GraphState> CallTree<S> {
    /// Identifier of the platform ingress root.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// All functions in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All invocation edges in declaration order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Returns the number of functions (the root is not counted).
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }
}

// ── Loaded state ───────────────────────────────────────────────────

impl CallTree<Loaded> {
    /// Creates a new tree in the `Loaded` state.
    pub fn new(name: String, root: String, nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            name,
            root,
            nodes,
            edges,
            topology: Topology::default(),
            _state: std::marker::PhantomData,
        }
    }

    /// Validates the shape and transitions to the `Validated` state.
    ///
    /// # Checks
    /// - At least one function is declared and identifiers are unique.
    /// - Every edge connects declared nodes, is not a self-loop and does not
    ///   invoke the root.
    /// - Every function has exactly one caller.
    /// - The root invokes at least one function and every function is
    ///   reachable from it (no cycles, no detached components).
    pub fn validate(self) -> Result<CallTree<Validated>, GraphError> {
        if self.nodes.is_empty() {
            return Err(GraphError::Empty(self.name));
        }

        let n = self.nodes.len();
        let mut index = HashMap::with_capacity(n);
        for (i, node) in self.nodes.iter().enumerate() {
            if node.id == self.root || index.insert(node.id.clone(), i).is_some() {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }

        let mut parent = vec![None; n];
        let mut incoming: Vec<Option<usize>> = vec![None; n];
        let mut children = vec![Vec::new(); n];
        let mut entries = Vec::new();

        for (ei, edge) in self.edges.iter().enumerate() {
            let caller = if edge.caller == self.root {
                None
            } else {
                match index.get(&edge.caller) {
                    Some(&i) => Some(i),
                    None => {
                        return Err(GraphError::UnknownNode {
                            caller: edge.caller.clone(),
                            callee: edge.callee.clone(),
                            missing: edge.caller.clone(),
                        })
                    }
                }
            };
            if edge.callee == self.root {
                return Err(GraphError::InvalidEdge {
                    caller: edge.caller.clone(),
                    callee: edge.callee.clone(),
                    detail: "the platform root cannot be invoked".into(),
                });
            }
            let callee = *index.get(&edge.callee).ok_or_else(|| GraphError::UnknownNode {
                caller: edge.caller.clone(),
                callee: edge.callee.clone(),
                missing: edge.callee.clone(),
            })?;
            if caller == Some(callee) {
                return Err(GraphError::InvalidEdge {
                    caller: edge.caller.clone(),
                    callee: edge.callee.clone(),
                    detail: "self-invocation".into(),
                });
            }
            if let Some(previous) = incoming[callee] {
                return Err(GraphError::MultipleParents {
                    node: edge.callee.clone(),
                    first: self.edges[previous].caller.clone(),
                    second: edge.caller.clone(),
                });
            }

            incoming[callee] = Some(ei);
            parent[callee] = caller;
            match caller {
                Some(c) => children[c].push(callee),
                None => entries.push(callee),
            }
        }

        let incoming = incoming
            .into_iter()
            .enumerate()
            .map(|(i, e)| e.ok_or_else(|| GraphError::Orphan(self.nodes[i].id.clone())))
            .collect::<Result<Vec<_>, _>>()?;

        if entries.is_empty() {
            return Err(GraphError::RootNotCalled(self.root));
        }

        // Every node has exactly one caller at this point, so a node the
        // root cannot reach must sit on a cycle.
        let mut reached = vec![false; n];
        let mut queue: VecDeque<usize> = entries.iter().copied().collect();
        while let Some(v) = queue.pop_front() {
            reached[v] = true;
            queue.extend(children[v].iter().copied());
        }
        if let Some(v) = reached.iter().position(|&r| !r) {
            return Err(GraphError::Cycle(self.nodes[v].id.clone()));
        }

        tracing::debug!(
            "validated call tree '{}': {} functions, {} entry point(s)",
            self.name,
            n,
            entries.len(),
        );

        Ok(CallTree {
            name: self.name,
            root: self.root,
            nodes: self.nodes,
            edges: self.edges,
            topology: Topology {
                index,
                parent,
                incoming,
                children,
                entries,
            },
            _state: std::marker::PhantomData,
        })
    }
}

// ── Validated state ────────────────────────────────────────────────

impl CallTree<Validated> {
    /// Returns the function at `index`.
    ///
    /// # Panics
    /// Panics if `index >= num_nodes()`.
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// Looks up a function index by identifier.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.topology.index.get(id).copied()
    }

    /// Returns the caller of `index`, or `None` when the root invokes it.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.topology.parent[index]
    }

    /// Returns the callees of `index` in edge declaration order.
    pub fn children(&self, index: usize) -> &[usize] {
        &self.topology.children[index]
    }

    /// Returns the functions invoked directly by the root.
    pub fn entries(&self) -> &[usize] {
        &self.topology.entries
    }

    /// Returns the edge invoking `index`.
    pub fn incoming(&self, index: usize) -> &Edge {
        &self.edges[self.topology.incoming[index]]
    }

    /// Returns `true` if `index` is invoked directly by the root.
    pub fn is_entry(&self, index: usize) -> bool {
        self.topology.parent[index].is_none()
    }

    /// Returns `true` if `index` invokes nothing.
    pub fn is_leaf(&self, index: usize) -> bool {
        self.topology.children[index].is_empty()
    }

    /// Returns all leaf functions in pre-order.
    pub fn leaves(&self) -> Vec<usize> {
        self.pre_order()
            .into_iter()
            .filter(|&v| self.is_leaf(v))
            .collect()
    }

    /// Returns the functions in depth-first pre-order, entries in declaration order.
    pub fn pre_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.topology.entries.iter().rev().copied().collect();
        while let Some(v) = stack.pop() {
            order.push(v);
            stack.extend(self.topology.children[v].iter().rev().copied());
        }
        order
    }

    /// Returns the functions in depth-first post-order (callees before callers).
    pub fn post_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.nodes.len());
        for &entry in &self.topology.entries {
            let mut stack = vec![(entry, 0usize)];
            while let Some((v, next)) = stack.last_mut() {
                let v = *v;
                if let Some(&c) = self.topology.children[v].get(*next) {
                    *next += 1;
                    stack.push((c, 0));
                } else {
                    order.push(v);
                    stack.pop();
                }
            }
        }
        order
    }

    /// Returns the functions on the path from the root down to `index`,
    /// starting with the entry function.
    pub fn path_from_root(&self, index: usize) -> Vec<usize> {
        let mut path = vec![index];
        let mut v = index;
        while let Some(p) = self.topology.parent[v] {
            path.push(p);
            v = p;
        }
        path.reverse();
        path
    }

    /// Returns `true` if the tree is a single simple path below the root.
    pub fn is_chain(&self) -> bool {
        self.topology.entries.len() == 1 && self.topology.children.iter().all(|c| c.len() <= 1)
    }

    /// Returns the total memory requirement of all functions in MB,
    /// saturating at `u64::MAX`.
    pub fn total_memory(&self) -> u64 {
        self.nodes.iter().fold(0, |total, n| total.saturating_add(n.memory))
    }

    /// Returns the largest single-function memory requirement in MB.
    pub fn max_node_memory(&self) -> u64 {
        self.nodes.iter().map(|n| n.memory).max().unwrap_or(0)
    }

    /// Returns the largest execution-time sum over root-to-leaf paths.
    pub fn longest_path_time(&self) -> u64 {
        let mut below = vec![0u64; self.nodes.len()];
        for v in self.post_order() {
            let deepest = self.children(v).iter().map(|&c| below[c]).max().unwrap_or(0);
            below[v] = self.nodes[v].execution_time.saturating_add(deepest);
        }
        self.topology.entries.iter().map(|&e| below[e]).max().unwrap_or(0)
    }

    /// Returns a summary string describing the tree.
    pub fn summary(&self) -> String {
        format!(
            "Call tree '{}': {} functions, {} entry point(s), {} leaves, {} MB total memory, \
             largest function {} MB, longest path {} ms",
            self.name,
            self.num_nodes(),
            self.entries().len(),
            self.leaves().len(),
            self.total_memory(),
            self.max_node_memory(),
            self.longest_path_time(),
        )
    }
}

// ── Shared implementations ─────────────────────────────────────────

impl<S: GraphState> fmt::Display for CallTree<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "CallTree '{}' (root '{}', {} functions):",
            self.name,
            self.root,
            self.nodes.len()
        )?;
        for node in &self.nodes {
            writeln!(f, "  {}", node.summary())?;
        }
        for edge in &self.edges {
            writeln!(f, "  {edge}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(edges: &[(&str, &str)], n: usize) -> CallTree<Loaded> {
        let nodes = (1..=n)
            .map(|i| Node::new(i.to_string(), 10 * i as u64, i as u64))
            .collect();
        let edges = edges
            .iter()
            .map(|&(a, b)| Edge::new(a, b, 1, 1))
            .collect();
        CallTree::new("test".into(), "P".into(), nodes, edges)
    }

    fn branching() -> CallTree<Validated> {
        // P -> 1 -> {2 -> {4, 5}, 3}
        tree(&[("P", "1"), ("1", "2"), ("1", "3"), ("2", "4"), ("2", "5")], 5)
            .validate()
            .unwrap()
    }

    #[test]
    fn test_validate_ok() {
        let t = branching();
        assert_eq!(t.num_nodes(), 5);
        assert_eq!(t.entries(), &[0]);
        assert_eq!(t.children(1), &[3, 4]);
        assert_eq!(t.parent(3), Some(1));
        assert_eq!(t.parent(0), None);
        assert_eq!(t.incoming(2).caller, "1");
    }

    #[test]
    fn test_validate_empty() {
        let t = CallTree::new("empty".into(), "P".into(), vec![], vec![]);
        assert!(matches!(t.validate(), Err(GraphError::Empty(_))));
    }

    #[test]
    fn test_validate_duplicate() {
        let mut t = tree(&[("P", "1")], 1);
        t.nodes.push(Node::new("1", 1, 1));
        assert!(matches!(t.validate(), Err(GraphError::DuplicateNode(id)) if id == "1"));
    }

    #[test]
    fn test_validate_node_named_like_root() {
        let mut t = tree(&[("P", "1")], 1);
        t.nodes.push(Node::new("P", 1, 1));
        assert!(matches!(t.validate(), Err(GraphError::DuplicateNode(_))));
    }

    #[test]
    fn test_validate_multiple_parents() {
        let t = tree(&[("P", "1"), ("1", "2"), ("1", "3"), ("2", "3")], 3);
        assert!(matches!(
            t.validate(),
            Err(GraphError::MultipleParents { node, .. }) if node == "3"
        ));
    }

    #[test]
    fn test_validate_cycle() {
        let t = tree(&[("P", "1"), ("2", "3"), ("3", "2")], 3);
        assert!(matches!(t.validate(), Err(GraphError::Cycle(_))));
    }

    #[test]
    fn test_validate_orphan() {
        let t = tree(&[("P", "1"), ("1", "2")], 3);
        assert!(matches!(t.validate(), Err(GraphError::Orphan(id)) if id == "3"));
    }

    #[test]
    fn test_validate_unknown_endpoint() {
        let t = tree(&[("P", "1"), ("1", "9")], 1);
        assert!(matches!(
            t.validate(),
            Err(GraphError::UnknownNode { missing, .. }) if missing == "9"
        ));
    }

    #[test]
    fn test_validate_edge_into_root() {
        let t = tree(&[("P", "1"), ("1", "P")], 1);
        assert!(matches!(t.validate(), Err(GraphError::InvalidEdge { .. })));
    }

    #[test]
    fn test_validate_self_loop() {
        let t = tree(&[("P", "1"), ("1", "1")], 1);
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_root_not_called() {
        let t = tree(&[("1", "2"), ("2", "1")], 2);
        assert!(matches!(t.validate(), Err(GraphError::RootNotCalled(_))));
    }

    #[test]
    fn test_orders() {
        let t = branching();
        assert_eq!(t.pre_order(), vec![0, 1, 3, 4, 2]);
        assert_eq!(t.post_order(), vec![3, 4, 1, 2, 0]);
        assert_eq!(t.leaves(), vec![3, 4, 2]);
    }

    #[test]
    fn test_path_from_root() {
        let t = branching();
        assert_eq!(t.path_from_root(4), vec![0, 1, 4]);
        assert_eq!(t.path_from_root(0), vec![0]);
    }

    #[test]
    fn test_is_chain() {
        assert!(!branching().is_chain());
        let chain = tree(&[("P", "1"), ("1", "2"), ("2", "3")], 3)
            .validate()
            .unwrap();
        assert!(chain.is_chain());
        let forest = tree(&[("P", "1"), ("P", "2")], 2).validate().unwrap();
        assert!(!forest.is_chain());
    }

    #[test]
    fn test_totals() {
        let t = branching();
        assert_eq!(t.total_memory(), 15);
        assert_eq!(t.max_node_memory(), 5);
        // 1 -> 2 -> 5: 10 + 20 + 50
        assert_eq!(t.longest_path_time(), 80);
        assert!(t.summary().contains("5 functions"));
    }

    #[test]
    fn test_totals_saturate() {
        let t = CallTree::new(
            "huge".into(),
            "P".into(),
            vec![Node::new("1", u64::MAX, u64::MAX), Node::new("2", 1, 1)],
            vec![Edge::new("P", "1", 1, 0), Edge::new("1", "2", 1, 0)],
        )
        .validate()
        .unwrap();
        assert_eq!(t.total_memory(), u64::MAX);
        assert_eq!(t.longest_path_time(), u64::MAX);
    }

    #[test]
    fn test_display() {
        let display = format!("{}", branching());
        assert!(display.contains("root 'P'"));
        assert!(display.contains("2 -> 5"));
    }
}
