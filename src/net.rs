//! Dual-head value/policy network
//!
//! A shared body stack feeds two head stacks. The value head regresses a
//! single scalar with squared error; the policy head classifies the move
//! with softmax cross-entropy.
//!
//! Learning runs the body forward once. Each head backpropagates its own
//! loss to the body's output boundary, the body turns each of those two
//! deltas into a gradient from the same cached activations, and the two
//! gradients are superposed with their propagation factors before a single
//! body update is applied.

use log::{debug, trace};
use ndarray::{Array2, Axis};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::NetConfig,
    evaluator::{Evaluator, ValuePolicyPair},
    layers::{Activation, LayerStack},
    puzzle::PuzzleState,
    utils::{one_hot_rows, softmax_rows},
    Result, SolverError,
};

/// Per-head losses on a batch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossBreakdown {
    /// Mean squared error of the value head
    pub value: f64,

    /// Mean cross-entropy of the policy head
    pub policy: f64,
}

impl LossBreakdown {
    /// Sum of both head losses
    pub fn total(&self) -> f64 {
        self.value + self.policy
    }
}

/// Shared-body network with a value head and a policy head
#[derive(Debug, Clone)]
pub struct DualHeadNet {
    body: LayerStack,
    value_head: LayerStack,
    policy_head: LayerStack,
    config: NetConfig,
}

impl DualHeadNet {
    /// Creates a network from three layer-width lists
    ///
    /// The body's output width must equal both heads' input widths and the
    /// value head must end in a single unit.
    pub fn new(
        body_sizes: &[usize],
        value_sizes: &[usize],
        policy_sizes: &[usize],
        config: NetConfig,
    ) -> Result<Self> {
        config.validate()?;

        let body_out = body_sizes.last().copied();
        if body_out.is_none()
            || body_out != value_sizes.first().copied()
            || body_out != policy_sizes.first().copied()
        {
            return Err(SolverError::Configuration(format!(
                "body output width must match both head input widths: body {:?}, value {:?}, policy {:?}",
                body_sizes, value_sizes, policy_sizes
            )));
        }
        if value_sizes.last() != Some(&1) {
            return Err(SolverError::Configuration(format!(
                "value head must end in a single unit, got {:?}",
                value_sizes
            )));
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let body = LayerStack::new(
            body_sizes,
            config.body_activation,
            config.body_activation,
            config.body_learning_rate,
            &mut rng,
        )?;
        let value_head = LayerStack::new(
            value_sizes,
            config.head_activation,
            Activation::Identity,
            config.value_learning_rate,
            &mut rng,
        )?;
        let policy_head = LayerStack::new(
            policy_sizes,
            config.head_activation,
            Activation::Identity,
            config.policy_learning_rate,
            &mut rng,
        )?;

        debug!(
            "Created dual-head network: body {:?}, value {:?}, policy {:?}",
            body_sizes, value_sizes, policy_sizes
        );

        Ok(DualHeadNet {
            body,
            value_head,
            policy_head,
            config,
        })
    }

    /// Width of the encoded state vectors this network accepts
    pub fn input_width(&self) -> usize {
        self.body.input_width()
    }

    /// Number of move classes of the policy head
    pub fn move_count(&self) -> usize {
        self.policy_head.output_width()
    }

    /// The configuration this network was built with
    pub fn config(&self) -> &NetConfig {
        &self.config
    }

    /// Evaluates an encoded batch, one row per state
    ///
    /// Runs the body once and each head once. Parameters are not touched.
    pub fn evaluate_batch(&self, batch: &Array2<f64>) -> Result<Vec<ValuePolicyPair>> {
        let (values, policies) = self.predict(batch)?;

        Ok(values
            .iter()
            .zip(policies.axis_iter(Axis(0)))
            .map(|(&value, policy)| ValuePolicyPair {
                value,
                policy: policy.to_vec(),
            })
            .collect())
    }

    /// Mean losses of both heads on a batch
    pub fn loss(
        &self,
        batch: &Array2<f64>,
        target_values: &[f64],
        target_moves: &[usize],
    ) -> Result<LossBreakdown> {
        self.check_targets(batch, target_values, target_moves)?;
        let (values, policies) = self.predict(batch)?;
        let n = batch.nrows().max(1) as f64;

        let value = values
            .iter()
            .zip(target_values)
            .map(|(v, y)| (v - y) * (v - y))
            .sum::<f64>()
            / n;
        let policy = target_moves
            .iter()
            .enumerate()
            .map(|(row, &m)| -policies[[row, m]].max(1e-12).ln())
            .sum::<f64>()
            / n;

        Ok(LossBreakdown { value, policy })
    }

    /// One gradient step on both heads and the shared body
    ///
    /// Targets are validated before anything is computed, so a failing
    /// call leaves every parameter unchanged.
    pub fn learn(
        &mut self,
        batch: &Array2<f64>,
        target_values: &[f64],
        target_moves: &[usize],
    ) -> Result<()> {
        self.check_targets(batch, target_values, target_moves)?;
        let n = batch.nrows() as f64;

        let body_pass = self.body.forward(batch)?;

        // Value head: d/dv mean((v - y)^2)
        let value_pass = self.value_head.forward(body_pass.output())?;
        let targets = Array2::from_shape_fn((batch.nrows(), 1), |(row, _)| target_values[row]);
        let value_delta = (value_pass.output() - &targets) * (2.0 / n);
        let value_grads = self.value_head.backward(&value_pass, &value_delta)?;

        // Policy head: softmax cross-entropy wrt logits is (p - onehot)
        let policy_pass = self.policy_head.forward(body_pass.output())?;
        let probs = softmax_rows(policy_pass.output());
        let policy_delta = (probs - one_hot_rows(target_moves, self.move_count())) / n;
        let policy_grads = self.policy_head.backward(&policy_pass, &policy_delta)?;

        // Both body gradients come from the same body pass
        let mut body_grads = self
            .body
            .backward(&body_pass, value_grads.input_delta())?
            .scaled(self.config.value_propagation_factor);
        let policy_body_grads = self
            .body
            .backward(&body_pass, policy_grads.input_delta())?
            .scaled(self.config.policy_propagation_factor);
        body_grads.accumulate(&policy_body_grads)?;

        self.value_head
            .apply(&value_grads, self.config.value_learning_rate)?;
        self.policy_head
            .apply(&policy_grads, self.config.policy_learning_rate)?;
        self.body.apply(&body_grads, self.config.body_learning_rate)?;

        trace!("Applied learning step on a batch of {}", batch.nrows());
        Ok(())
    }

    /// Encodes `states` and runs [`learn`](Self::learn)
    pub fn learn_states<S: PuzzleState>(
        &mut self,
        states: &[S],
        target_values: &[f64],
        target_moves: &[usize],
    ) -> Result<()> {
        let batch = encode_states(states, self.input_width())?;
        self.learn(&batch, target_values, target_moves)
    }

    fn predict(&self, batch: &Array2<f64>) -> Result<(Vec<f64>, Array2<f64>)> {
        let body_out = self.body.evaluate(batch)?;
        let values = self.value_head.evaluate(&body_out)?;
        let policies = softmax_rows(&self.policy_head.evaluate(&body_out)?);
        Ok((values.column(0).to_vec(), policies))
    }

    fn check_targets(
        &self,
        batch: &Array2<f64>,
        target_values: &[f64],
        target_moves: &[usize],
    ) -> Result<()> {
        if batch.nrows() != target_values.len() || batch.nrows() != target_moves.len() {
            return Err(SolverError::InvalidInput(format!(
                "batch of {} states with {} value targets and {} move targets",
                batch.nrows(),
                target_values.len(),
                target_moves.len()
            )));
        }
        let move_count = self.move_count();
        if let Some(&index) = target_moves.iter().find(|&&m| m >= move_count) {
            return Err(SolverError::InvalidTarget { index, move_count });
        }
        Ok(())
    }
}

impl<S: PuzzleState> Evaluator<S> for DualHeadNet {
    fn evaluate(&self, states: &[S]) -> Result<Vec<ValuePolicyPair>> {
        if S::MOVE_COUNT != self.move_count() {
            return Err(SolverError::Configuration(format!(
                "puzzle has {} moves but the policy head has {} outputs",
                S::MOVE_COUNT,
                self.move_count()
            )));
        }
        let batch = encode_states(states, self.input_width())?;
        self.evaluate_batch(&batch)
    }
}

/// Stacks the one-hot encodings of `states` into a batch matrix
pub fn encode_states<S: PuzzleState>(states: &[S], width: usize) -> Result<Array2<f64>> {
    let mut batch = Array2::zeros((states.len(), width));
    for (mut row, state) in batch.axis_iter_mut(Axis(0)).zip(states) {
        let encoded = state.one_hot_encode();
        if encoded.len() != width {
            return Err(SolverError::InvalidInput(format!(
                "state encodes to width {} but the network expects {}",
                encoded.len(),
                width
            )));
        }
        row.assign(&encoded);
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn sample_net(config: NetConfig) -> DualHeadNet {
        DualHeadNet::new(&[4, 12, 8], &[8, 4, 1], &[8, 16, 6], config.with_seed(3)).unwrap()
    }

    fn sample_batch() -> Array2<f64> {
        array![
            [1.0, 2.0, 4.0, 3.0],
            [2.0, 4.0, 1.0, 3.0],
            [3.0, 1.0, 2.0, 4.0]
        ]
    }

    #[test]
    fn test_rejects_mismatched_widths() {
        let config = NetConfig::default();
        let err = DualHeadNet::new(&[4, 8], &[6, 1], &[8, 6], config.clone()).unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));

        let err = DualHeadNet::new(&[4, 8], &[8, 1], &[7, 6], config.clone()).unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));

        let err = DualHeadNet::new(&[4, 8], &[8, 2], &[8, 6], config).unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));
    }

    #[test]
    fn test_rejects_negative_learning_rate() {
        let config = NetConfig::default().with_body_learning_rate(-1.0);
        let err = DualHeadNet::new(&[4, 8], &[8, 1], &[8, 6], config).unwrap_err();
        assert!(matches!(err, SolverError::Configuration(_)));
    }

    #[test]
    fn test_evaluate_returns_one_distribution_per_row() {
        let net = sample_net(NetConfig::default());
        let pairs = net.evaluate_batch(&sample_batch()).unwrap();

        assert_eq!(pairs.len(), 3);
        for pair in &pairs {
            assert_eq!(pair.policy.len(), 6);
            assert!((pair.policy.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            assert!(pair.policy.iter().all(|&p| p >= 0.0));
            assert!(pair.value.is_finite());
        }
    }

    #[test]
    fn test_evaluate_is_repeatable() {
        let net = sample_net(NetConfig::default());
        let batch = sample_batch();
        assert_eq!(
            net.evaluate_batch(&batch).unwrap(),
            net.evaluate_batch(&batch).unwrap()
        );
    }

    #[test]
    fn test_learning_reduces_loss() {
        let mut net = sample_net(NetConfig::default());
        let batch = sample_batch();
        let values = [0.8, 0.4, 0.4];
        let moves = [2, 0, 0];

        let before = net.loss(&batch, &values, &moves).unwrap();
        for _ in 0..100 {
            net.learn(&batch, &values, &moves).unwrap();
        }
        let after = net.loss(&batch, &values, &moves).unwrap();

        assert!(
            after.total() < before.total(),
            "loss went from {:?} to {:?}",
            before,
            after
        );
    }

    #[test]
    fn test_invalid_target_leaves_parameters_untouched() {
        let mut net = sample_net(NetConfig::default());
        let batch = sample_batch();
        let before = net.evaluate_batch(&batch).unwrap();

        let err = net.learn(&batch, &[0.8, 0.4, 0.4], &[2, 6, 0]).unwrap_err();
        assert_eq!(
            err,
            SolverError::InvalidTarget {
                index: 6,
                move_count: 6
            }
        );
        assert_eq!(net.evaluate_batch(&batch).unwrap(), before);
    }

    #[test]
    fn test_target_length_mismatch_is_rejected() {
        let mut net = sample_net(NetConfig::default());
        let err = net.learn(&sample_batch(), &[0.8, 0.4], &[2, 0, 0]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_propagation_factors_freeze_body() {
        let mut net = sample_net(NetConfig::default().with_propagation_factors(0.0, 0.0));
        let batch = sample_batch();
        let body_before = net.body.evaluate(&batch).unwrap();

        net.learn(&batch, &[0.8, 0.4, 0.4], &[2, 0, 0]).unwrap();

        assert_eq!(net.body.evaluate(&batch).unwrap(), body_before);
    }

    #[test]
    fn test_body_update_superposes_both_heads() {
        let batch = sample_batch();
        let values = [0.8, 0.4, 0.4];
        let moves = [2, 0, 0];

        let body_after = |value_factor: f64, policy_factor: f64| {
            let mut net = sample_net(
                NetConfig::default().with_propagation_factors(value_factor, policy_factor),
            );
            let before = net.body.evaluate(&batch).unwrap();
            net.learn(&batch, &values, &moves).unwrap();
            net.body.evaluate(&batch).unwrap() - &before
        };

        let value_only = body_after(1.0, 0.0);
        let policy_only = body_after(0.0, 1.0);
        let both = body_after(1.0, 1.0);

        // The body is linear in its update for a single step only to first
        // order, so compare the combined change to the sum loosely.
        let sum = &value_only + &policy_only;
        let scale = both.iter().fold(0.0f64, |m, v| m.max(v.abs()));
        assert!(scale > 0.0);
        for (a, b) in both.iter().zip(sum.iter()) {
            assert!((a - b).abs() <= 0.05 * scale + 1e-9);
        }
        assert!(value_only.iter().any(|v| v.abs() > 0.0));
        assert!(policy_only.iter().any(|v| v.abs() > 0.0));
    }
}
