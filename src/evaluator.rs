//! Evaluator trait for puzzle state evaluation.
//!
//! The evaluator provides a value estimate and a move policy for puzzle
//! states. In ADI this is the [`DualHeadNet`](crate::net::DualHeadNet); for
//! testing we provide a uniform evaluator.

use crate::{puzzle::PuzzleState, Result};

/// Value estimate and move policy for one state
#[derive(Debug, Clone, PartialEq)]
pub struct ValuePolicyPair {
    /// Estimated value; higher means closer to solved
    pub value: f64,

    /// Probability of each move class. Non-negative and sums to 1.
    pub policy: Vec<f64>,
}

/// Trait for state evaluators
pub trait Evaluator<S: PuzzleState> {
    /// Evaluates a batch of states, returning one pair per state in order
    fn evaluate(&self, states: &[S]) -> Result<Vec<ValuePolicyPair>>;
}

impl<S: PuzzleState, E: Evaluator<S> + ?Sized> Evaluator<S> for &E {
    fn evaluate(&self, states: &[S]) -> Result<Vec<ValuePolicyPair>> {
        (**self).evaluate(states)
    }
}

/// Evaluator with a uniform policy and a constant value for every state
#[derive(Debug, Clone, Default)]
pub struct UniformEvaluator {
    value: f64,
}

impl UniformEvaluator {
    /// Creates an evaluator reporting value 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an evaluator reporting the given value for every state
    pub fn with_value(value: f64) -> Self {
        UniformEvaluator { value }
    }
}

impl<S: PuzzleState> Evaluator<S> for UniformEvaluator {
    fn evaluate(&self, states: &[S]) -> Result<Vec<ValuePolicyPair>> {
        let prob = 1.0 / S::MOVE_COUNT as f64;
        Ok(states
            .iter()
            .map(|_| ValuePolicyPair {
                value: self.value,
                policy: vec![prob; S::MOVE_COUNT],
            })
            .collect())
    }
}
