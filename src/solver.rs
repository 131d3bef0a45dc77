//! Network-guided tree search solver
//!
//! This module orchestrates the simulations of a solve:
//!
//! 1. **Selection**: from the root, follow the move with the best selection
//!    score until reaching a solved state or a state not yet in the tree
//! 2. **Expansion**: evaluate the new state and store its policy as prior
//! 3. **Backup**: fold the new state's value into every edge of the walk
//!
//! The first simulation that reaches a solved state ends the loop, and the
//! shortest move sequence through the explored states is returned.

use std::time::Instant;

use log::{debug, info, trace, warn};

use crate::{
    config::SolverConfig,
    evaluator::{Evaluator, ValuePolicyPair},
    policy::{
        backup::{BackupPolicy, MeanValuePolicy},
        selection::{PuctPolicy, SelectionPolicy},
    },
    puzzle::PuzzleState,
    stats::SearchStatistics,
    tree::{NodeId, NodeInfo, SearchTree},
    Result, SolverError,
};

/// How a single simulation ended
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationOutcome {
    /// The walk reached a solved state after `depth` moves
    Solved {
        /// Length of the walk
        depth: usize,
    },

    /// The walk reached a new state, which was added to the tree
    Expanded {
        /// Length of the walk
        depth: usize,
        /// Network value of the new state, as backed up
        value: f64,
    },

    /// The walk hit the depth cap inside the tree
    DepthLimited {
        /// Length of the walk
        depth: usize,
        /// Stored value of the state where the walk stopped
        value: f64,
    },
}

/// Tree search guided by an [`Evaluator`]
///
/// The tree lives for one solve. Calling [`solve`](Self::solve) again
/// discards it and starts over.
pub struct TreeSearchSolver<S: PuzzleState, E: Evaluator<S>> {
    evaluator: E,

    /// Configuration for the search
    config: SolverConfig,

    /// Policy for choosing moves during selection
    selection_policy: Box<dyn SelectionPolicy>,

    /// Policy for updating edges during backup
    backup_policy: Box<dyn BackupPolicy>,

    tree: SearchTree<S>,
    root: Option<S>,

    /// Edges of the walk in progress, root first
    path: Vec<(NodeId, usize)>,

    statistics: SearchStatistics,
}

impl<S: PuzzleState, E: Evaluator<S>> TreeSearchSolver<S, E> {
    /// Creates a solver with PUCT selection and mean-value backup
    pub fn new(evaluator: E, config: SolverConfig) -> Self {
        let selection_policy: Box<dyn SelectionPolicy> =
            Box::new(PuctPolicy::new(config.exploration_factor));
        let backup_policy: Box<dyn BackupPolicy> = Box::new(MeanValuePolicy::new());

        TreeSearchSolver {
            evaluator,
            config,
            selection_policy,
            backup_policy,
            tree: SearchTree::new(),
            root: None,
            path: Vec::new(),
            statistics: SearchStatistics::new(),
        }
    }

    /// Sets the selection policy to use
    pub fn with_selection_policy<P: SelectionPolicy + 'static>(mut self, policy: P) -> Self {
        self.selection_policy = Box::new(policy);
        self
    }

    /// Sets the backup policy to use
    pub fn with_backup_policy<P: BackupPolicy + 'static>(mut self, policy: P) -> Self {
        self.backup_policy = Box::new(policy);
        self
    }

    /// The configuration in use
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// The tree explored so far
    pub fn tree(&self) -> &SearchTree<S> {
        &self.tree
    }

    /// Mutable access to the tree explored so far
    pub fn tree_mut(&mut self) -> &mut SearchTree<S> {
        &mut self.tree
    }

    /// Statistics of the last solve
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Finds a move sequence from `root` to a solved state
    ///
    /// Fails with [`SolverError::NoSolutionFound`] once `max_simulations`
    /// or `max_time` is used up.
    pub fn solve(&mut self, root: &S) -> Result<Vec<usize>> {
        let start_time = Instant::now();
        self.initialize(root)?;

        if root.is_solved() {
            debug!("Root is already solved");
            return self.finish(root, start_time);
        }

        for i in 0..self.config.max_simulations {
            if let Some(max_duration) = self.config.max_time {
                if start_time.elapsed() >= max_duration {
                    debug!("Stopping after {} simulations: time limit reached", i);
                    break;
                }
            }

            let outcome = self.run_simulation()?;
            self.statistics.simulations = i + 1;
            trace!("Simulation {}: {:?}", i + 1, outcome);

            if let SimulationOutcome::Solved { .. } = outcome {
                return self.finish(root, start_time);
            }
        }

        self.statistics.total_time = start_time.elapsed();
        self.statistics.tree_size = self.tree.len();
        self.statistics.budget_exhausted = true;
        warn!(
            "No solution after {} simulations ({} states explored)",
            self.statistics.simulations,
            self.tree.len()
        );
        Err(SolverError::NoSolutionFound {
            simulations: self.statistics.simulations,
        })
    }

    /// Resets the tree to hold only `root`, evaluated by the network
    pub fn initialize(&mut self, root: &S) -> Result<()> {
        self.config.validate()?;

        self.statistics = SearchStatistics::new();
        self.path.clear();

        let pair = self.evaluate_one(root)?;
        self.tree = SearchTree::with_root(root.clone(), NodeInfo::from_evaluation(pair));
        self.root = Some(root.clone());
        self.statistics.tree_size = 1;

        debug!("Initialized search tree, root value {:.4}", self.tree.info(NodeId::root()).value());
        Ok(())
    }

    /// Runs one selection, expansion and backup from the root
    pub fn run_simulation(&mut self) -> Result<SimulationOutcome> {
        let root = self.root.as_ref().ok_or_else(|| {
            SolverError::InvalidInput("run_simulation called before initialize".to_string())
        })?;
        if root.is_solved() {
            return Ok(SimulationOutcome::Solved { depth: 0 });
        }

        // A walk longer than the tree has revisited some state
        let max_depth = self.config.max_depth.unwrap_or_else(|| self.tree.len());
        let loss_step = self.config.loss_step;

        self.path.clear();
        let mut current = NodeId::root();

        loop {
            let move_id = self.selection_policy.select_move(self.tree.info(current));
            self.tree.info_mut(current).add_virtual_loss(move_id, loss_step);
            self.path.push((current, move_id));

            let depth = self.path.len();
            self.statistics.max_depth = self.statistics.max_depth.max(depth);

            let next = self.tree.state(current).apply_move(move_id);

            if next.is_solved() {
                self.release_virtual_losses();
                return Ok(SimulationOutcome::Solved { depth });
            }

            match self.tree.id_of(&next) {
                Some(next_id) => {
                    current = next_id;
                    if depth >= max_depth {
                        let value = self.tree.info(current).value();
                        self.backup(value);
                        return Ok(SimulationOutcome::DepthLimited { depth, value });
                    }
                }
                None => {
                    let pair = match self.evaluate_one(&next) {
                        Ok(pair) => pair,
                        Err(e) => {
                            self.release_virtual_losses();
                            return Err(e);
                        }
                    };
                    let value = pair.value;
                    self.tree.insert(next, NodeInfo::from_evaluation(pair));
                    self.statistics.tree_size = self.tree.len();
                    self.backup(value);
                    return Ok(SimulationOutcome::Expanded { depth, value });
                }
            }
        }
    }

    /// Shortest move sequence from `root` through the explored states
    pub fn extract_sequence(&self, root: &S) -> Result<Vec<usize>> {
        self.tree
            .shortest_path(root)
            .ok_or(SolverError::NoSolutionFound {
                simulations: self.statistics.simulations,
            })
    }

    fn finish(&mut self, root: &S, start_time: Instant) -> Result<Vec<usize>> {
        let moves = self.extract_sequence(root)?;

        self.statistics.total_time = start_time.elapsed();
        self.statistics.tree_size = self.tree.len();
        self.statistics.solution_length = Some(moves.len());

        info!(
            "Solved in {} simulations: {} moves, {} states explored",
            self.statistics.simulations,
            moves.len(),
            self.tree.len()
        );
        Ok(moves)
    }

    /// Walks the path leaf to root, refunding virtual loss and recording
    /// `leaf_value` on every edge
    fn backup(&mut self, leaf_value: f64) {
        let loss_step = self.config.loss_step;
        let mut path = std::mem::take(&mut self.path);

        for (distance, &(id, move_id)) in path.iter().rev().enumerate() {
            let info = self.tree.info_mut(id);
            info.remove_virtual_loss(move_id, loss_step);
            self.backup_policy
                .update_stats(info, move_id, leaf_value, distance);
        }

        path.clear();
        self.path = path;
    }

    fn release_virtual_losses(&mut self) {
        let loss_step = self.config.loss_step;
        for &(id, move_id) in &self.path {
            self.tree.info_mut(id).remove_virtual_loss(move_id, loss_step);
        }
        self.path.clear();
    }

    fn evaluate_one(&mut self, state: &S) -> Result<ValuePolicyPair> {
        self.statistics.evaluations += 1;
        let pair = self
            .evaluator
            .evaluate(std::slice::from_ref(state))?
            .into_iter()
            .next()
            .ok_or_else(|| SolverError::InvalidInput("evaluator returned no result".to_string()))?;

        if pair.policy.len() != S::MOVE_COUNT {
            return Err(SolverError::Configuration(format!(
                "evaluator policy has {} entries but the puzzle has {} moves",
                pair.policy.len(),
                S::MOVE_COUNT
            )));
        }
        Ok(pair)
    }
}
