// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Pareto frontier of partial solutions.
//!
//! A [`State`] summarises one way of partitioning a subtree (or a chain
//! prefix) by four objectives: accumulated cost, memory of the unit that is
//! still open for extension, deployment size of that unit and the latency
//! of the tracked invocation path. A [`Frontier`] keeps only the states no
//! other state beats on every objective, ordered by the key
//! `(cost, memory, package, latency)`.
//!
//! Each state carries a [`Trace`] of the decisions that produced it. Traces
//! are shared between states through `Arc`, so extending a state costs one
//! allocation regardless of how large the subtree is.

use crate::PlannerError;
use std::cmp::Ordering;
use std::sync::Arc;

// ── Objectives ─────────────────────────────────────────────────────

/// The comparable part of a [`State`].
///
/// The derived ordering is lexicographic in field order, which is the
/// frontier's sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
pub struct Objectives {
    pub cost: u64,
    pub memory: u64,
    pub package: u64,
    pub latency: u64,
}

impl Objectives {
    /// `true` if `self` is no worse than `other` on every objective.
    pub fn weakly_dominates(&self, other: &Objectives) -> bool {
        self.cost <= other.cost
            && self.memory <= other.memory
            && self.package <= other.package
            && self.latency <= other.latency
    }

    /// `true` if `self` weakly dominates `other` and differs from it.
    pub fn dominates(&self, other: &Objectives) -> bool {
        self.weakly_dominates(other) && self != other
    }
}

// ── Decision trace ─────────────────────────────────────────────────

/// How a state was assembled.
#[derive(Debug)]
pub(crate) enum Trace {
    /// A function placed in a fresh unit of its own.
    Open(usize),
    /// `lower` attached under `upper` through the edge into `callee`.
    Join {
        upper: Arc<Trace>,
        lower: Arc<Trace>,
        callee: usize,
        cut: bool,
    },
}

impl Trace {
    /// Calls `visit(callee, cut)` for every edge decision in this trace.
    pub(crate) fn for_each_decision(&self, mut visit: impl FnMut(usize, bool)) {
        let mut stack = vec![self];
        while let Some(t) = stack.pop() {
            if let Trace::Join {
                upper,
                lower,
                callee,
                cut,
            } = t
            {
                visit(*callee, *cut);
                stack.push(lower);
                stack.push(upper);
            }
        }
    }
}

// ── State ──────────────────────────────────────────────────────────

/// One partial solution.
#[derive(Debug, Clone)]
pub struct State {
    objectives: Objectives,
    pub(crate) trace: Arc<Trace>,
}

impl State {
    pub(crate) fn new(objectives: Objectives, trace: Arc<Trace>) -> Self {
        Self { objectives, trace }
    }

    pub fn objectives(&self) -> Objectives {
        self.objectives
    }

    pub fn cost(&self) -> u64 {
        self.objectives.cost
    }

    /// Memory of the unit still open for extension.
    pub fn memory(&self) -> u64 {
        self.objectives.memory
    }

    /// Deployment size of the open unit (zero when no cap is enforced).
    pub fn package(&self) -> u64 {
        self.objectives.package
    }

    /// Latency of the tracked invocation path (zero when untracked).
    pub fn latency(&self) -> u64 {
        self.objectives.latency
    }

    /// Same state with the open unit sealed: nothing more can join it.
    fn sealed(&self) -> Self {
        Self {
            objectives: Objectives {
                memory: 0,
                package: 0,
                ..self.objectives
            },
            trace: Arc::clone(&self.trace),
        }
    }
}

// ── Frontier ───────────────────────────────────────────────────────

/// Insertion counters, folded into [`crate::SearchStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct FrontierCounters {
    pub offered: usize,
    pub rejected: usize,
    pub evicted: usize,
}

/// A set of mutually non-dominated states, sorted by [`Objectives`].
///
/// Among states with identical objectives only the first one inserted is
/// kept, so the contents depend only on the insertion sequence.
#[derive(Debug, Clone, Default)]
pub struct Frontier {
    states: Vec<State>,
    counters: FrontierCounters,
}

impl Frontier {
    /// Creates an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn singleton(state: State) -> Self {
        Self {
            states: vec![state],
            counters: FrontierCounters::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// States in key order.
    pub fn iter(&self) -> impl Iterator<Item = &State> {
        self.states.iter()
    }

    /// Objective vectors in key order.
    pub fn objectives(&self) -> Vec<Objectives> {
        self.states.iter().map(State::objectives).collect()
    }

    /// The state with the lowest cost; ties go to the smallest remaining key.
    pub fn cheapest(&self) -> Option<&State> {
        self.states.first()
    }

    pub(crate) fn counters(&self) -> FrontierCounters {
        self.counters
    }

    /// Offers a state to the frontier.
    ///
    /// Returns `false` (and leaves the frontier untouched) if an existing
    /// member weakly dominates `state`. Otherwise `state` is inserted at its
    /// key position and every member it dominates is evicted.
    pub fn insert(&mut self, state: State) -> bool {
        self.counters.offered += 1;
        let key = state.objectives;
        let pos = self.states.partition_point(|m| m.objectives < key);

        // Members past `pos` have a larger key and cannot dominate `state`
        // unless they are equal to it.
        let dominated = self.states[..pos]
            .iter()
            .any(|m| m.objectives.weakly_dominates(&key))
            || self.states.get(pos).is_some_and(|m| m.objectives == key);
        if dominated {
            self.counters.rejected += 1;
            return false;
        }

        let mut tail = self.states.split_off(pos);
        let before = tail.len();
        tail.retain(|m| !key.dominates(&m.objectives));
        self.counters.evicted += before - tail.len();

        self.states.push(state);
        self.states.append(&mut tail);
        true
    }

    /// Builds a new frontier from every state `step` derives from a member.
    pub(crate) fn advance<F, I>(&self, mut step: F) -> Frontier
    where
        F: FnMut(&State) -> I,
        I: IntoIterator<Item = State>,
    {
        let mut out = Frontier::new();
        for s in &self.states {
            for candidate in step(s) {
                out.insert(candidate);
            }
        }
        out
    }

    /// Builds a new frontier from every candidate `combine` derives from a
    /// pair of states, one from each input.
    pub fn merge<F, I>(a: &Frontier, b: &Frontier, combine: F) -> Frontier
    where
        F: FnMut(&State, &State) -> I,
        I: IntoIterator<Item = State>,
    {
        let mut out = Frontier::new();
        out.merge_into(a, b, combine);
        out
    }

    /// Like [`Frontier::merge`], but inserts into `self`.
    pub fn merge_into<F, I>(&mut self, a: &Frontier, b: &Frontier, mut combine: F)
    where
        F: FnMut(&State, &State) -> I,
        I: IntoIterator<Item = State>,
    {
        for x in &a.states {
            for y in &b.states {
                for candidate in combine(x, y) {
                    self.insert(candidate);
                }
            }
        }
    }

    /// Projection with every open unit sealed.
    ///
    /// Sealed states differ only in cost and latency, so this is usually
    /// much smaller than `self`.
    pub fn closed(&self) -> Frontier {
        let mut out = Frontier::new();
        for s in &self.states {
            out.insert(s.sealed());
        }
        out
    }

    /// Checks ordering and mutual non-domination.
    pub fn check_invariants(&self) -> Result<(), PlannerError> {
        for (i, pair) in self.states.windows(2).enumerate() {
            if pair[0].objectives.cmp(&pair[1].objectives) != Ordering::Less {
                return Err(PlannerError::InvariantViolation(format!(
                    "frontier out of order at position {i}: {:?} before {:?}",
                    pair[0].objectives, pair[1].objectives,
                )));
            }
        }
        for (i, a) in self.states.iter().enumerate() {
            for b in &self.states[i + 1..] {
                if a.objectives.weakly_dominates(&b.objectives) {
                    return Err(PlannerError::InvariantViolation(format!(
                        "frontier member {:?} dominates {:?}",
                        a.objectives, b.objectives,
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn st(cost: u64, memory: u64, latency: u64) -> State {
        State::new(
            Objectives {
                cost,
                memory,
                package: 0,
                latency,
            },
            Arc::new(Trace::Open(0)),
        )
    }

    fn keys(f: &Frontier) -> Vec<(u64, u64, u64)> {
        f.iter()
            .map(|s| (s.cost(), s.memory(), s.latency()))
            .collect()
    }

    #[test]
    fn test_insert_keeps_sorted() {
        let mut f = Frontier::new();
        assert!(f.insert(st(5, 1, 0)));
        assert!(f.insert(st(3, 4, 0)));
        assert!(f.insert(st(4, 2, 0)));
        assert_eq!(keys(&f), vec![(3, 4, 0), (4, 2, 0), (5, 1, 0)]);
        f.check_invariants().unwrap();
    }

    #[test]
    fn test_insert_rejects_dominated() {
        let mut f = Frontier::new();
        f.insert(st(3, 3, 3));
        assert!(!f.insert(st(4, 3, 3)));
        assert!(!f.insert(st(3, 3, 3)));
        assert_eq!(f.len(), 1);
        assert_eq!(f.counters().rejected, 2);
    }

    #[test]
    fn test_insert_evicts_dominated() {
        let mut f = Frontier::new();
        f.insert(st(5, 5, 1));
        f.insert(st(6, 2, 1));
        f.insert(st(2, 9, 9));
        assert!(f.insert(st(4, 2, 1)));
        assert_eq!(keys(&f), vec![(2, 9, 9), (4, 2, 1)]);
        assert_eq!(f.counters().evicted, 2);
        f.check_invariants().unwrap();
    }

    #[test]
    fn test_equal_key_keeps_first() {
        let mut f = Frontier::new();
        let first = State::new(st(1, 1, 1).objectives(), Arc::new(Trace::Open(7)));
        f.insert(first);
        f.insert(State::new(st(1, 1, 1).objectives(), Arc::new(Trace::Open(8))));
        assert!(matches!(*f.cheapest().unwrap().trace, Trace::Open(7)));
    }

    #[test]
    fn test_merge_pairs_every_state() {
        let mut a = Frontier::new();
        a.insert(st(1, 2, 0));
        a.insert(st(2, 1, 0));
        let mut b = Frontier::new();
        b.insert(st(10, 1, 0));
        b.insert(st(5, 3, 0));

        let mut calls = 0;
        let merged = Frontier::merge(&a, &b, |x, y| {
            calls += 1;
            Some(st(x.cost() + y.cost(), x.memory() + y.memory(), 0))
        });
        assert_eq!(calls, 4);
        // (11,3) (12,2) (6,5) (7,4): none dominates another.
        assert_eq!(keys(&merged), vec![(6, 5, 0), (7, 4, 0), (11, 3, 0), (12, 2, 0)]);
    }

    #[test]
    fn test_merge_skips_rejected_candidates() {
        let a = Frontier::singleton(st(1, 1, 0));
        let b = Frontier::singleton(st(1, 1, 0));
        let merged = Frontier::merge(&a, &b, |_, _| None);
        assert!(merged.is_empty());
    }

    #[test]
    fn test_closed_projection() {
        let mut f = Frontier::new();
        f.insert(st(1, 9, 5));
        f.insert(st(2, 3, 5));
        f.insert(st(3, 1, 2));
        let c = f.closed();
        assert_eq!(keys(&c), vec![(1, 0, 5), (3, 0, 2)]);
    }

    #[test]
    fn test_check_invariants_detects_domination() {
        let f = Frontier {
            states: vec![st(1, 1, 1), st(2, 2, 2)],
            counters: FrontierCounters::default(),
        };
        assert!(matches!(
            f.check_invariants(),
            Err(PlannerError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_check_invariants_detects_disorder() {
        let f = Frontier {
            states: vec![st(2, 1, 1), st(1, 2, 2)],
            counters: FrontierCounters::default(),
        };
        assert!(f.check_invariants().is_err());
    }

    #[test]
    fn test_trace_decisions() {
        let leaf = Arc::new(Trace::Open(2));
        let mid = Arc::new(Trace::Join {
            upper: Arc::new(Trace::Open(1)),
            lower: leaf,
            callee: 2,
            cut: true,
        });
        let top = Trace::Join {
            upper: Arc::new(Trace::Open(0)),
            lower: mid,
            callee: 1,
            cut: false,
        };
        let mut seen = Vec::new();
        top.for_each_decision(|c, cut| seen.push((c, cut)));
        seen.sort();
        assert_eq!(seen, vec![(1, false), (2, true)]);
    }
}
