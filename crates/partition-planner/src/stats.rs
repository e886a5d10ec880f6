// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Search statistics.
//!
//! [`SearchStats`] counts how much work a planner did and how effective
//! dominance pruning was. Useful for comparing the chain and tree planners
//! and for spotting inputs whose frontiers blow up.

use crate::frontier::Frontier;
use std::ops::AddAssign;
use std::time::Duration;

/// Aggregate statistics for one planning run.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct SearchStats {
    /// Functions whose frontier was computed node by node.
    pub nodes_processed: usize,
    /// Path-shaped subtrees handed to the chain recurrence.
    pub chains_delegated: usize,
    /// Candidate states offered to any frontier.
    pub candidates: usize,
    /// Candidates rejected on arrival as dominated.
    pub rejected: usize,
    /// Members evicted by a dominating newcomer.
    pub evicted: usize,
    /// Largest frontier seen.
    pub peak_frontier: usize,
    /// Wall-clock time of the search.
    pub elapsed: Duration,
}

impl SearchStats {
    /// Folds a finished frontier's counters into the totals.
    pub(crate) fn record(&mut self, frontier: &Frontier) {
        let c = frontier.counters();
        self.candidates += c.offered;
        self.rejected += c.rejected;
        self.evicted += c.evicted;
        self.peak_frontier = self.peak_frontier.max(frontier.len());
    }

    /// Fraction of offered candidates that did not survive.
    pub fn pruning_ratio(&self) -> f64 {
        if self.candidates == 0 {
            0.0
        } else {
            (self.rejected + self.evicted) as f64 / self.candidates as f64
        }
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "{} nodes, {} chains delegated, {} candidates ({:.0}% pruned), \
             peak frontier {}, {:.2} ms",
            self.nodes_processed,
            self.chains_delegated,
            self.candidates,
            self.pruning_ratio() * 100.0,
            self.peak_frontier,
            self.elapsed.as_secs_f64() * 1000.0,
        )
    }
}

impl AddAssign for SearchStats {
    fn add_assign(&mut self, rhs: Self) {
        self.nodes_processed += rhs.nodes_processed;
        self.chains_delegated += rhs.chains_delegated;
        self.candidates += rhs.candidates;
        self.rejected += rhs.rejected;
        self.evicted += rhs.evicted;
        self.peak_frontier = self.peak_frontier.max(rhs.peak_frontier);
        self.elapsed += rhs.elapsed;
    }
}
