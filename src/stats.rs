//! Statistics collection for solver runs
//!
//! This module provides the counters reported after a call to
//! [`TreeSearchSolver::solve`](crate::solver::TreeSearchSolver::solve).

use std::time::Duration;

/// Statistics collected during one solve
#[derive(Debug, Clone, PartialEq)]
pub struct SearchStatistics {
    /// Number of simulations performed
    pub simulations: usize,

    /// Total time spent searching
    pub total_time: Duration,

    /// Number of states in the tree
    pub tree_size: usize,

    /// Longest selection walk
    pub max_depth: usize,

    /// Network evaluations requested, including the root
    pub evaluations: usize,

    /// Length of the returned move sequence, if one was found
    pub solution_length: Option<usize>,

    /// Whether the solve stopped because a budget ran out
    pub budget_exhausted: bool,
}

impl SearchStatistics {
    /// Creates a new, empty statistics object
    pub fn new() -> Self {
        SearchStatistics {
            simulations: 0,
            total_time: Duration::from_secs(0),
            tree_size: 0,
            max_depth: 0,
            evaluations: 0,
            solution_length: None,
            budget_exhausted: false,
        }
    }

    /// Returns the number of simulations per second
    pub fn simulations_per_second(&self) -> f64 {
        if self.total_time.as_secs_f64() <= 0.0 {
            return 0.0;
        }
        self.simulations as f64 / self.total_time.as_secs_f64()
    }

    /// Returns a summary of the statistics as a string
    pub fn summary(&self) -> String {
        let solution = match self.solution_length {
            Some(len) => format!("{} moves", len),
            None => "none".to_string(),
        };
        format!(
            "Solver Statistics:\n\
             - Simulations: {}\n\
             - Total time: {:.3} seconds\n\
             - Tree size: {} states\n\
             - Max depth: {}\n\
             - Evaluations: {}\n\
             - Simulations per second: {:.1}\n\
             - Solution: {}\n\
             - Budget exhausted: {}",
            self.simulations,
            self.total_time.as_secs_f64(),
            self.tree_size,
            self.max_depth,
            self.evaluations,
            self.simulations_per_second(),
            solution,
            self.budget_exhausted
        )
    }
}

impl Default for SearchStatistics {
    fn default() -> Self {
        Self::new()
    }
}
