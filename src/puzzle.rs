//! Traits defining the puzzle state representation consumed by the solver.
//!
//! The [`PuzzleState`] trait is the only interface the network and the
//! search need from a puzzle: encode it, apply a move, recognise the goal.

use std::fmt::Debug;
use std::hash::Hash;

use ndarray::Array1;

/// Trait defining a puzzle configuration
///
/// States are immutable values. Applying a move never changes `self`, it
/// produces a new state. Equality and hashing must be structural because
/// states are used as keys of the search tree.
pub trait PuzzleState: Clone + Debug + Eq + Hash {
    /// Number of move classes. Move ids are `0..MOVE_COUNT`.
    const MOVE_COUNT: usize;

    /// Width of the vector returned by [`one_hot_encode`](Self::one_hot_encode)
    const ENCODING_WIDTH: usize;

    /// Encodes this state as the network's input vector
    ///
    /// The returned vector must have length [`ENCODING_WIDTH`](Self::ENCODING_WIDTH).
    fn one_hot_encode(&self) -> Array1<f64>;

    /// Returns the state reached by applying `move_id`
    ///
    /// `move_id` is always in `0..MOVE_COUNT`.
    fn apply_move(&self, move_id: usize) -> Self;

    /// Returns true if this is a goal configuration
    fn is_solved(&self) -> bool;

    /// Returns every state reachable in one move, indexed by move id
    fn successors(&self) -> Vec<Self> {
        (0..Self::MOVE_COUNT).map(|m| self.apply_move(m)).collect()
    }
}
