// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Partition: the output of the planners.
//!
//! A partition is a list of [`Unit`]s. Each unit is deployed as one
//! serverless function; calls between functions in the same unit become
//! local calls, calls across units stay remote invocations. The partition
//! is the contract between the planner and whatever deploys it.

use crate::evaluate::{CutSet, Evaluation};
use crate::PlannerError;
use call_graph::{graph::Validated, CallTree};
use std::collections::HashMap;

/// A connected group of functions deployed together.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Unit {
    /// Index of this unit in the partition.
    pub unit_index: usize,
    /// Function identifiers, head first, in call-tree pre-order.
    pub functions: Vec<String>,
    /// Summed memory of the functions in MB.
    pub memory: u64,
    /// Summed deployment package size in MB.
    pub deployment_size: u64,
}

impl Unit {
    /// Returns the number of functions in this unit.
    pub fn num_functions(&self) -> usize {
        self.functions.len()
    }

    /// Returns `true` if this unit holds a single function.
    pub fn is_single_function(&self) -> bool {
        self.functions.len() == 1
    }

    /// The function invoked from outside the unit.
    pub fn head(&self) -> &str {
        &self.functions[0]
    }
}

/// The complete partition produced by a [`crate::PartitionStrategy`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct Partition {
    /// Strategy name that produced this partition.
    pub strategy_name: String,
    /// Units, ordered by the pre-order position of their head.
    pub units: Vec<Unit>,
    /// Total cost per request.
    pub cost: u64,
    /// Latency of the constrained path(s).
    pub critical_latency: u64,
    /// The unit memory capacity used for planning (MB).
    pub memory_capacity: u64,
    /// Memory of the largest unit (MB).
    pub peak_memory: u64,
}

impl Partition {
    /// Builds a partition from a cut set and its evaluation.
    pub(crate) fn from_cuts(
        strategy_name: &str,
        tree: &CallTree<Validated>,
        cuts: &CutSet,
        evaluation: &Evaluation,
        memory_capacity: u64,
    ) -> Self {
        let mut builder = PartitionBuilder::new(strategy_name, memory_capacity);
        for unit in cuts.units(tree) {
            let memory = unit.iter().map(|&v| tree.node(v).memory).sum();
            let deployment_size = unit
                .iter()
                .map(|&v| tree.node(v).deployment_size.unwrap_or(0))
                .sum();
            let functions = unit.iter().map(|&v| tree.node(v).id.clone()).collect();
            builder.add_unit(functions, memory, deployment_size);
        }
        builder.build(evaluation.cost, evaluation.critical_latency)
    }

    /// Returns the total number of units.
    pub fn num_units(&self) -> usize {
        self.units.len()
    }

    /// Returns the total number of functions across all units.
    pub fn total_functions(&self) -> usize {
        self.units.iter().map(|u| u.num_functions()).sum()
    }

    /// Unit membership as plain identifier lists.
    pub fn blocks(&self) -> Vec<Vec<String>> {
        self.units.iter().map(|u| u.functions.clone()).collect()
    }

    /// Index of the unit holding function `id`.
    pub fn unit_of(&self, id: &str) -> Option<usize> {
        self.units
            .iter()
            .position(|u| u.functions.iter().any(|f| f == id))
    }

    /// Validates the partition against the tree it was planned for.
    ///
    /// Checks:
    /// - Partition is non-empty.
    /// - Unit indices are consecutive starting from 0.
    /// - No empty units.
    /// - Every function appears in exactly one unit.
    /// - Every unit is connected: exactly one function is not called from
    ///   within the unit.
    /// - No unit exceeds the memory capacity.
    pub fn validate(&self, tree: &CallTree<Validated>) -> Result<(), PlannerError> {
        let fail = |detail: String| PlannerError::InvalidPartition {
            strategy: self.strategy_name.clone(),
            detail,
        };

        if self.units.is_empty() {
            return Err(fail("partition has no units".into()));
        }

        let mut owner: HashMap<usize, usize> = HashMap::with_capacity(tree.num_nodes());
        for (expected, unit) in self.units.iter().enumerate() {
            if unit.unit_index != expected {
                return Err(fail(format!(
                    "expected unit index {expected}, got {}",
                    unit.unit_index
                )));
            }
            if unit.functions.is_empty() {
                return Err(fail(format!("unit {expected} is empty")));
            }
            for id in &unit.functions {
                let v = tree
                    .index_of(id)
                    .ok_or_else(|| fail(format!("unit {expected} holds unknown function '{id}'")))?;
                if let Some(prev) = owner.insert(v, expected) {
                    return Err(fail(format!(
                        "function '{id}' appears in units {prev} and {expected}"
                    )));
                }
            }
        }
        if owner.len() != tree.num_nodes() {
            let missing = (0..tree.num_nodes())
                .find(|v| !owner.contains_key(v))
                .map(|v| tree.node(v).id.clone())
                .unwrap_or_default();
            return Err(fail(format!("function '{missing}' is not assigned")));
        }

        for unit in &self.units {
            let heads = unit
                .functions
                .iter()
                .filter_map(|id| tree.index_of(id))
                .filter(|&v| {
                    tree.parent(v)
                        .map_or(true, |p| owner.get(&p) != Some(&unit.unit_index))
                })
                .count();
            if heads != 1 {
                return Err(fail(format!(
                    "unit {} is not connected ({heads} functions called from outside)",
                    unit.unit_index
                )));
            }

            let memory: u64 = unit
                .functions
                .iter()
                .filter_map(|id| tree.index_of(id))
                .map(|v| tree.node(v).memory)
                .sum();
            if memory > self.memory_capacity {
                return Err(fail(format!(
                    "unit {} requires {memory} MB but capacity is {} MB",
                    unit.unit_index, self.memory_capacity
                )));
            }
        }

        Ok(())
    }

    /// Returns a human-readable summary of the partition.
    pub fn summary(&self) -> String {
        let sizes: Vec<usize> = self.units.iter().map(|u| u.num_functions()).collect();
        let utilisation = if self.memory_capacity == 0 {
            0.0
        } else {
            self.peak_memory as f64 / self.memory_capacity as f64 * 100.0
        };
        format!(
            "Partition '{}': {} units, {} functions, cost {}, critical latency {} ms, \
             peak {}/{} MB ({:.0}% capacity), unit sizes: {:?}",
            self.strategy_name,
            self.num_units(),
            self.total_functions(),
            self.cost,
            self.critical_latency,
            self.peak_memory,
            self.memory_capacity,
            utilisation,
            sizes,
        )
    }
}

/// Builder helper for constructing a `Partition` incrementally.
pub(crate) struct PartitionBuilder {
    strategy_name: String,
    memory_capacity: u64,
    units: Vec<Unit>,
    peak_memory: u64,
}

impl PartitionBuilder {
    /// Creates a new builder.
    pub fn new(strategy_name: &str, memory_capacity: u64) -> Self {
        Self {
            strategy_name: strategy_name.to_string(),
            memory_capacity,
            units: Vec::new(),
            peak_memory: 0,
        }
    }

    /// Adds a unit with its precomputed footprint.
    pub fn add_unit(&mut self, functions: Vec<String>, memory: u64, deployment_size: u64) {
        let unit_index = self.units.len();
        self.peak_memory = self.peak_memory.max(memory);
        self.units.push(Unit {
            unit_index,
            functions,
            memory,
            deployment_size,
        });
    }

    /// Consumes the builder and returns the finished partition.
    pub fn build(self, cost: u64, critical_latency: u64) -> Partition {
        Partition {
            strategy_name: self.strategy_name,
            units: self.units,
            cost,
            critical_latency,
            memory_capacity: self.memory_capacity,
            peak_memory: self.peak_memory,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use call_graph::{Edge, Node};

    /// P -> 1 -> {2, 3}, 2 -> 4.
    fn tree() -> CallTree<Validated> {
        CallTree::new(
            "t".into(),
            "P".into(),
            (1..=4).map(|i| Node::new(i.to_string(), 10, i)).collect(),
            vec![
                Edge::new("P", "1", 1, 0),
                Edge::new("1", "2", 1, 0),
                Edge::new("1", "3", 1, 0),
                Edge::new("2", "4", 1, 0),
            ],
        )
        .validate()
        .unwrap()
    }

    fn partition(blocks: &[&[&str]], capacity: u64) -> Partition {
        let t = tree();
        let mut b = PartitionBuilder::new("test", capacity);
        for block in blocks {
            let memory = block
                .iter()
                .map(|id| t.node(t.index_of(id).unwrap()).memory)
                .sum();
            b.add_unit(block.iter().map(|s| s.to_string()).collect(), memory, 0);
        }
        b.build(0, 0)
    }

    #[test]
    fn test_validate_ok() {
        let p = partition(&[&["1", "3"], &["2", "4"]], 6);
        p.validate(&tree()).unwrap();
        assert_eq!(p.peak_memory, 6);
        assert_eq!(p.unit_of("4"), Some(1));
        assert_eq!(p.blocks()[0], vec!["1", "3"]);
    }

    #[test]
    fn test_validate_missing_function() {
        let p = partition(&[&["1", "2", "3"]], 100);
        assert!(matches!(
            p.validate(&tree()),
            Err(PlannerError::InvalidPartition { .. })
        ));
    }

    #[test]
    fn test_validate_duplicate_function() {
        let p = partition(&[&["1", "2", "3"], &["3", "4"]], 100);
        assert!(p.validate(&tree()).is_err());
    }

    #[test]
    fn test_validate_disconnected_unit() {
        // 3 and 4 are not adjacent.
        let p = partition(&[&["1", "2"], &["3", "4"]], 100);
        let err = p.validate(&tree()).unwrap_err();
        assert!(err.to_string().contains("not connected"));
    }

    #[test]
    fn test_validate_over_capacity() {
        let p = partition(&[&["1", "2", "3", "4"]], 9);
        assert!(p.validate(&tree()).is_err());
    }

    #[test]
    fn test_validate_empty() {
        let p = partition(&[], 10);
        assert!(p.validate(&tree()).is_err());
    }

    #[test]
    fn test_from_cuts() {
        let t = tree();
        let cuts = CutSet::from_flags(&t, vec![false, true, false, false]);
        let eval = Evaluation {
            cost: 42,
            critical_latency: 7,
            peak_memory: 6,
            peak_deployment_size: 0,
            units: 2,
        };
        let p = Partition::from_cuts("tree", &t, &cuts, &eval, 10);
        assert_eq!(p.blocks(), vec![vec!["1", "3"], vec!["2", "4"]]);
        assert_eq!(p.cost, 42);
        assert_eq!(p.peak_memory, 6);
        p.validate(&t).unwrap();
    }

    #[test]
    fn test_summary() {
        let p = partition(&[&["1", "3"], &["2", "4"]], 12);
        let s = p.summary();
        assert!(s.contains("2 units"));
        assert!(s.contains("4 functions"));
        assert!(s.contains("peak 6/12 MB (50% capacity)"));
    }
}
