//! # adi-solver
//!
//! Autodidactic Iteration (ADI) for permutation puzzles: a dual-head neural
//! network predicts a value and a move policy for every puzzle state, and a
//! Monte Carlo Tree Search guided by those predictions finds a concrete
//! solving move sequence.
//!
//! ## Features
//!
//! - Dual-head network (shared body, value head, policy head) whose two
//!   head gradients are superposed into a single body update
//! - Small dense layer stack on `ndarray` with pluggable activations
//! - PUCT-guided tree search with virtual loss and pluggable selection and
//!   backup policies
//! - Shortest-path extraction over the explored tree
//! - Autodidactic Iteration trainer that generates its own targets from
//!   scrambles of the solved state
//! - A 2×2×2 cube as a reference puzzle
//!
//! ## Basic Usage
//!
//! ```
//! use adi_solver::{
//!     cube::PocketCube, DualHeadNet, NetConfig, PuzzleState, SolverConfig, TreeSearchSolver,
//! };
//!
//! fn main() -> Result<(), adi_solver::SolverError> {
//!     let net = DualHeadNet::new(
//!         &[PocketCube::ENCODING_WIDTH, 64, 32],
//!         &[32, 16, 1],
//!         &[32, 16, PocketCube::MOVE_COUNT],
//!         NetConfig::default().with_seed(7),
//!     )?;
//!
//!     // One quarter turn away from solved
//!     let start = PocketCube::solved().apply_move(3);
//!
//!     let mut solver = TreeSearchSolver::new(&net, SolverConfig::default().with_max_simulations(500));
//!     let moves = solver.solve(&start)?;
//!
//!     let mut state = start;
//!     for m in moves {
//!         state = state.apply_move(m);
//!     }
//!     assert!(state.is_solved());
//!     Ok(())
//! }
//! ```
//!
//! ## How It Works
//!
//! Each simulation of [`TreeSearchSolver`] walks down the explored tree
//! choosing the move that maximises `Q + c * P * sqrt(N) / (1 + n)`. The walk
//! stops at the first state that is either solved or not yet in the tree. A
//! new state is evaluated by the network: its policy becomes the node's
//! prior and its value is backed up along the walk. Once a solved state is
//! seen, a breadth-first search over the explored states returns the
//! shortest move sequence.

pub mod config;
pub mod cube;
pub mod evaluator;
pub mod layers;
pub mod net;
pub mod policy;
pub mod puzzle;
pub mod solver;
pub mod stats;
pub mod trainer;
pub mod tree;
pub mod utils;

pub use config::{NetConfig, SolverConfig, TrainerConfig};
pub use evaluator::{Evaluator, UniformEvaluator, ValuePolicyPair};
pub use layers::{Activation, LayerStack};
pub use net::{DualHeadNet, LossBreakdown};
pub use policy::{BackupPolicy, SelectionPolicy};
pub use puzzle::PuzzleState;
pub use solver::{SimulationOutcome, TreeSearchSolver};
pub use stats::SearchStatistics;
pub use trainer::{AdiTrainer, TrainingReport};
pub use tree::{NodeInfo, SearchTree};

/// Error types for network construction, learning and search
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Layer sizes or hyperparameters are inconsistent
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// A target move index is outside the policy's move-class range
    #[error("Target move index {index} is out of range for {move_count} move classes")]
    InvalidTarget {
        /// The offending move index
        index: usize,
        /// Number of move classes of the policy head
        move_count: usize,
    },

    /// A batch does not match the network's input width or the targets' length
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The simulation budget ran out before a solved state was reached
    #[error("No solution found after {simulations} simulations")]
    NoSolutionFound {
        /// Simulations run before giving up
        simulations: usize,
    },
}

/// Result type for solver operations
pub type Result<T> = std::result::Result<T, SolverError>;
