//! Autodidactic Iteration trainer
//!
//! Generates its own supervision by scrambling the solved state and
//! looking one move ahead with the current network:
//!
//! ```text
//! y_v(x) = max_a [ R(A(x, a)) + v(A(x, a)) ]
//! y_p(x) = argmax_a [ R(A(x, a)) + v(A(x, a)) ]
//! ```
//!
//! with `R = +1` for a solved child (whose own value counts as 0) and `-1`
//! otherwise. The network is then trained on `(x, y_v, y_p)`.

use log::{debug, info};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::TrainerConfig,
    evaluator::Evaluator,
    net::{encode_states, DualHeadNet, LossBreakdown},
    puzzle::PuzzleState,
    utils::argmax,
    Result, SolverError,
};

const SOLVED_REWARD: f64 = 1.0;
const STEP_REWARD: f64 = -1.0;

/// One generated training batch
#[derive(Debug, Clone)]
pub struct TrainingBatch<S> {
    /// Scrambled states
    pub states: Vec<S>,
    /// Value targets, one per state
    pub values: Vec<f64>,
    /// Best move ids, one per state
    pub moves: Vec<usize>,
}

impl<S> TrainingBatch<S> {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the batch holds no samples
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Summary of a training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    /// Iterations completed
    pub iterations: usize,
    /// Losses on each iteration's batch, measured before its update
    pub losses: Vec<LossBreakdown>,
}

impl TrainingReport {
    /// Loss of the last iteration
    pub fn final_loss(&self) -> Option<LossBreakdown> {
        self.losses.last().copied()
    }
}

/// Trains a [`DualHeadNet`] by Autodidactic Iteration
pub struct AdiTrainer<S: PuzzleState> {
    solved: S,
    config: TrainerConfig,
    rng: StdRng,
}

impl<S: PuzzleState> AdiTrainer<S> {
    /// Creates a trainer scrambling from `solved`
    pub fn new(solved: S, config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        if !solved.is_solved() {
            return Err(SolverError::Configuration(
                "the trainer must start from a solved state".to_string(),
            ));
        }
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(AdiTrainer { solved, config, rng })
    }

    /// Random walks from the solved state, every prefix kept
    ///
    /// Returns `scrambles_per_iteration * scramble_depth` states, with
    /// depths `1..=scramble_depth` from each walk.
    pub fn scramble_states(&mut self) -> Vec<S> {
        let mut states =
            Vec::with_capacity(self.config.scrambles_per_iteration * self.config.scramble_depth);
        for _ in 0..self.config.scrambles_per_iteration {
            let mut state = self.solved.clone();
            for _ in 0..self.config.scramble_depth {
                state = state.apply_move(self.rng.gen_range(0..S::MOVE_COUNT));
                states.push(state.clone());
            }
        }
        states
    }

    /// Computes one-step lookahead targets for `states`
    pub fn targets<E: Evaluator<S>>(&self, evaluator: &E, states: Vec<S>) -> Result<TrainingBatch<S>> {
        let children: Vec<S> = states.iter().flat_map(|s| s.successors()).collect();
        let evaluations = evaluator.evaluate(&children)?;
        if evaluations.len() != children.len() {
            return Err(SolverError::InvalidInput(format!(
                "evaluator returned {} results for {} states",
                evaluations.len(),
                children.len()
            )));
        }

        let mut values = Vec::with_capacity(states.len());
        let mut moves = Vec::with_capacity(states.len());

        for (i, _) in states.iter().enumerate() {
            let offset = i * S::MOVE_COUNT;
            let scores: Vec<f64> = (0..S::MOVE_COUNT)
                .map(|m| {
                    if children[offset + m].is_solved() {
                        SOLVED_REWARD
                    } else {
                        STEP_REWARD + evaluations[offset + m].value
                    }
                })
                .collect();
            let best = argmax(&scores);
            values.push(scores[best]);
            moves.push(best);
        }

        Ok(TrainingBatch {
            states,
            values,
            moves,
        })
    }

    /// Generates a fresh batch with the network's current estimates
    pub fn generate_batch(&mut self, net: &DualHeadNet) -> Result<TrainingBatch<S>> {
        let states = self.scramble_states();
        self.targets(net, states)
    }

    /// Runs the configured number of generate-then-learn iterations
    pub fn train(&mut self, net: &mut DualHeadNet) -> Result<TrainingReport> {
        let mut losses = Vec::with_capacity(self.config.iterations);

        for iteration in 0..self.config.iterations {
            let batch = self.generate_batch(net)?;
            let encoded = encode_states(&batch.states, net.input_width())?;

            let loss = net.loss(&encoded, &batch.values, &batch.moves)?;
            net.learn(&encoded, &batch.values, &batch.moves)?;

            debug!(
                "ADI iteration {}: value loss {:.4}, policy loss {:.4}",
                iteration + 1,
                loss.value,
                loss.policy
            );
            losses.push(loss);
        }

        let report = TrainingReport {
            iterations: self.config.iterations,
            losses,
        };
        if let Some(last) = report.final_loss() {
            info!(
                "ADI training finished after {} iterations, final loss {:.4}",
                report.iterations,
                last.total()
            );
        }
        Ok(report)
    }
}
