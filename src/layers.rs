//! Fully-connected layer stacks
//!
//! A [`LayerStack`] is a chain of dense layers sharing one hidden activation
//! and ending in a configurable output activation. Batches are
//! `Array2<f64>` with one sample per row.
//!
//! The forward pass and the backward pass are split so that callers can
//! run one forward pass, derive several independent gradients from it and
//! combine them before touching the parameters:
//!
//! ```
//! use adi_solver::layers::{Activation, LayerStack};
//! use ndarray::array;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(1);
//! let mut stack = LayerStack::new(&[2, 4, 1], Activation::Tanh, Activation::Identity, 0.1, &mut rng)?;
//!
//! let batch = array![[0.5, -1.0], [1.0, 0.25]];
//! let pass = stack.forward(&batch)?;
//! let delta = pass.output() - &array![[1.0], [0.0]];
//!
//! let grads = stack.backward(&pass, &delta)?;
//! stack.apply(&grads, stack.learning_rate())?;
//! # Ok::<(), adi_solver::SolverError>(())
//! ```

use ndarray::{Array1, Array2, Axis};
use rand::Rng;

use crate::{Result, SolverError};

/// Element-wise activation functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Exponential linear unit with alpha = 1
    Elu,
    /// Rectified linear unit
    Relu,
    /// Hyperbolic tangent
    Tanh,
    /// No-op, used for linear outputs
    Identity,
}

impl Activation {
    /// Applies the activation to a pre-activation value
    pub fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Elu => {
                if z > 0.0 {
                    z
                } else {
                    z.exp_m1()
                }
            }
            Activation::Relu => z.max(0.0),
            Activation::Tanh => z.tanh(),
            Activation::Identity => z,
        }
    }

    /// Derivative of the activation at a pre-activation value
    pub fn derivative(self, z: f64) -> f64 {
        match self {
            Activation::Elu => {
                if z > 0.0 {
                    1.0
                } else {
                    z.exp()
                }
            }
            Activation::Relu => {
                if z > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::Tanh => {
                let t = z.tanh();
                1.0 - t * t
            }
            Activation::Identity => 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct DenseLayer {
    /// Shape (inputs, outputs)
    weights: Array2<f64>,
    biases: Array1<f64>,
    activation: Activation,
}

impl DenseLayer {
    fn new<R: Rng + ?Sized>(
        inputs: usize,
        outputs: usize,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        // Xavier-uniform
        let limit = (6.0 / (inputs + outputs) as f64).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit));

        DenseLayer {
            weights,
            biases: Array1::zeros(outputs),
            activation,
        }
    }
}

/// Activations cached by [`LayerStack::forward`]
///
/// A pass is tied to the parameters it was computed with. Apply gradients
/// only after every backward call that needs this pass has run.
#[derive(Debug, Clone)]
pub struct ForwardPass {
    inputs: Vec<Array2<f64>>,
    pre_activations: Vec<Array2<f64>>,
    output: Array2<f64>,
}

impl ForwardPass {
    /// The stack's output for the batch
    pub fn output(&self) -> &Array2<f64> {
        &self.output
    }
}

/// Parameter gradients of a [`LayerStack`] for one batch
#[derive(Debug, Clone)]
pub struct StackGradients {
    weights: Vec<Array2<f64>>,
    biases: Vec<Array1<f64>>,
    input_delta: Array2<f64>,
}

impl StackGradients {
    /// Delta with respect to the stack's input, for further propagation
    pub fn input_delta(&self) -> &Array2<f64> {
        &self.input_delta
    }

    /// Multiplies every gradient, including the input delta, by `factor`
    pub fn scaled(mut self, factor: f64) -> Self {
        for w in &mut self.weights {
            w.mapv_inplace(|g| g * factor);
        }
        for b in &mut self.biases {
            b.mapv_inplace(|g| g * factor);
        }
        self.input_delta.mapv_inplace(|g| g * factor);
        self
    }

    /// Adds `other` into `self`
    ///
    /// Both must come from the same stack and batch size.
    pub fn accumulate(&mut self, other: &StackGradients) -> Result<()> {
        if self.weights.len() != other.weights.len()
            || self.input_delta.dim() != other.input_delta.dim()
        {
            return Err(SolverError::InvalidInput(
                "cannot accumulate gradients of different shapes".to_string(),
            ));
        }
        for (w, o) in self.weights.iter_mut().zip(&other.weights) {
            if w.dim() != o.dim() {
                return Err(SolverError::InvalidInput(
                    "cannot accumulate gradients of different shapes".to_string(),
                ));
            }
            *w += o;
        }
        for (b, o) in self.biases.iter_mut().zip(&other.biases) {
            *b += o;
        }
        self.input_delta += &other.input_delta;
        Ok(())
    }
}

/// A chain of dense layers trained by plain gradient descent
#[derive(Debug, Clone)]
pub struct LayerStack {
    layers: Vec<DenseLayer>,
    learning_rate: f64,
}

impl LayerStack {
    /// Builds a stack from layer widths, input width first
    ///
    /// `[4, 12, 8]` is two layers: 4 → 12 and 12 → 8. Every layer but the
    /// last uses `hidden`, the last uses `output`.
    pub fn new<R: Rng + ?Sized>(
        sizes: &[usize],
        hidden: Activation,
        output: Activation,
        learning_rate: f64,
        rng: &mut R,
    ) -> Result<Self> {
        if sizes.len() < 2 {
            return Err(SolverError::Configuration(format!(
                "a layer stack needs at least an input and an output width, got {:?}",
                sizes
            )));
        }
        if sizes.contains(&0) {
            return Err(SolverError::Configuration(format!(
                "layer widths must be non-zero, got {:?}",
                sizes
            )));
        }

        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let activation = if i == last { output } else { hidden };
                DenseLayer::new(w[0], w[1], activation, rng)
            })
            .collect();

        Ok(LayerStack {
            layers,
            learning_rate,
        })
    }

    /// Width of the input vectors
    pub fn input_width(&self) -> usize {
        self.layers[0].weights.nrows()
    }

    /// Width of the output vectors
    pub fn output_width(&self) -> usize {
        self.layers[self.layers.len() - 1].weights.ncols()
    }

    /// Learning rate this stack was constructed with
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Runs the batch through every layer, caching what backward needs
    pub fn forward(&self, batch: &Array2<f64>) -> Result<ForwardPass> {
        if batch.ncols() != self.input_width() {
            return Err(SolverError::InvalidInput(format!(
                "batch width {} does not match stack input width {}",
                batch.ncols(),
                self.input_width()
            )));
        }

        let mut inputs = Vec::with_capacity(self.layers.len());
        let mut pre_activations = Vec::with_capacity(self.layers.len());
        let mut current = batch.to_owned();

        for layer in &self.layers {
            let z = current.dot(&layer.weights) + &layer.biases;
            let activation = layer.activation;
            let a = z.mapv(|v| activation.apply(v));
            inputs.push(current);
            pre_activations.push(z);
            current = a;
        }

        Ok(ForwardPass {
            inputs,
            pre_activations,
            output: current,
        })
    }

    /// Runs the batch through the stack and returns only the output
    pub fn evaluate(&self, batch: &Array2<f64>) -> Result<Array2<f64>> {
        Ok(self.forward(batch)?.output)
    }

    /// Computes gradients for an upstream delta without touching parameters
    ///
    /// `delta` is the derivative of the loss with respect to the stack's
    /// output and must have the output's shape.
    pub fn backward(&self, pass: &ForwardPass, delta: &Array2<f64>) -> Result<StackGradients> {
        if delta.dim() != pass.output.dim() || pass.inputs.len() != self.layers.len() {
            return Err(SolverError::InvalidInput(format!(
                "delta shape {:?} does not match forward output shape {:?}",
                delta.dim(),
                pass.output.dim()
            )));
        }

        let n = self.layers.len();
        let mut weights = Vec::with_capacity(n);
        let mut biases = Vec::with_capacity(n);
        let mut current = delta.to_owned();

        for (i, layer) in self.layers.iter().enumerate().rev() {
            let activation = layer.activation;
            let dz = current * &pass.pre_activations[i].mapv(|z| activation.derivative(z));
            weights.push(pass.inputs[i].t().dot(&dz));
            biases.push(dz.sum_axis(Axis(0)));
            current = dz.dot(&layer.weights.t());
        }

        weights.reverse();
        biases.reverse();

        Ok(StackGradients {
            weights,
            biases,
            input_delta: current,
        })
    }

    /// Descends along `grads` with the given step size
    pub fn apply(&mut self, grads: &StackGradients, learning_rate: f64) -> Result<()> {
        if grads.weights.len() != self.layers.len() {
            return Err(SolverError::InvalidInput(format!(
                "gradients for {} layers applied to a stack of {}",
                grads.weights.len(),
                self.layers.len()
            )));
        }
        for (layer, (dw, db)) in self
            .layers
            .iter_mut()
            .zip(grads.weights.iter().zip(&grads.biases))
        {
            layer.weights.scaled_add(-learning_rate, dw);
            layer.biases.scaled_add(-learning_rate, db);
        }
        Ok(())
    }

    /// Backpropagates `delta` and applies the update in one call
    ///
    /// Returns the delta at the stack's input.
    pub fn learn_from_delta(
        &mut self,
        pass: &ForwardPass,
        delta: &Array2<f64>,
        learning_rate: f64,
    ) -> Result<Array2<f64>> {
        let grads = self.backward(pass, delta)?;
        self.apply(&grads, learning_rate)?;
        Ok(grads.input_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn stack(sizes: &[usize], hidden: Activation) -> LayerStack {
        let mut rng = StdRng::seed_from_u64(11);
        LayerStack::new(sizes, hidden, Activation::Identity, 0.1, &mut rng).unwrap()
    }

    // Loss used by the gradient check: sum of outputs weighted by `g`
    fn weighted_sum(stack: &LayerStack, x: &Array2<f64>, g: &Array2<f64>) -> f64 {
        (stack.evaluate(x).unwrap() * g).sum()
    }

    #[test]
    fn test_rejects_degenerate_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(LayerStack::new(&[4], Activation::Elu, Activation::Elu, 0.1, &mut rng).is_err());
        assert!(LayerStack::new(&[4, 0, 2], Activation::Elu, Activation::Elu, 0.1, &mut rng).is_err());
    }

    #[test]
    fn test_forward_shapes() {
        let s = stack(&[3, 5, 2], Activation::Elu);
        assert_eq!(s.input_width(), 3);
        assert_eq!(s.output_width(), 2);

        let x = array![[1.0, 0.0, -1.0], [0.5, 0.5, 0.5], [2.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = s.evaluate(&x).unwrap();
        assert_eq!(out.dim(), (4, 2));
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let s = stack(&[3, 2], Activation::Elu);
        let x = array![[1.0, 2.0]];
        assert!(matches!(s.forward(&x), Err(SolverError::InvalidInput(_))));
    }

    #[test]
    fn test_backward_matches_finite_differences() {
        let s = stack(&[3, 4, 2], Activation::Tanh);
        let x = array![[0.3, -0.7, 0.2], [1.0, 0.1, -0.4]];
        let g = array![[0.5, -1.0], [0.25, 2.0]];

        let pass = s.forward(&x).unwrap();
        let grads = s.backward(&pass, &g).unwrap();

        let eps = 1e-6;
        for layer in 0..2 {
            let (rows, cols) = s.layers[layer].weights.dim();
            for i in 0..rows {
                for j in 0..cols {
                    let mut plus = s.clone();
                    plus.layers[layer].weights[[i, j]] += eps;
                    let mut minus = s.clone();
                    minus.layers[layer].weights[[i, j]] -= eps;

                    let numeric =
                        (weighted_sum(&plus, &x, &g) - weighted_sum(&minus, &x, &g)) / (2.0 * eps);
                    let analytic = grads.weights[layer][[i, j]];
                    assert!(
                        (numeric - analytic).abs() < 1e-5,
                        "layer {} weight ({}, {}): numeric {} vs analytic {}",
                        layer,
                        i,
                        j,
                        numeric,
                        analytic
                    );
                }
            }
        }
    }

    #[test]
    fn test_input_delta_matches_finite_differences() {
        let s = stack(&[2, 3, 1], Activation::Elu);
        let x = array![[0.4, -0.9]];
        let g = array![[1.0]];

        let pass = s.forward(&x).unwrap();
        let grads = s.backward(&pass, &g).unwrap();

        let eps = 1e-6;
        for j in 0..2 {
            let mut plus = x.clone();
            plus[[0, j]] += eps;
            let mut minus = x.clone();
            minus[[0, j]] -= eps;
            let numeric = (weighted_sum(&s, &plus, &g) - weighted_sum(&s, &minus, &g)) / (2.0 * eps);
            assert!((numeric - grads.input_delta()[[0, j]]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_scaled_and_accumulated_gradients_superpose() {
        let s = stack(&[2, 3, 2], Activation::Elu);
        let x = array![[0.1, 0.2], [0.3, -0.4]];
        let pass = s.forward(&x).unwrap();

        let d1 = array![[1.0, 0.0], [0.0, 1.0]];
        let d2 = array![[0.5, 0.5], [-1.0, 2.0]];
        let combined = &d1 * 2.0 + &d2 * 0.5;

        let mut sum = s.backward(&pass, &d1).unwrap().scaled(2.0);
        sum.accumulate(&s.backward(&pass, &d2).unwrap().scaled(0.5))
            .unwrap();
        let direct = s.backward(&pass, &combined).unwrap();

        for (a, b) in sum.weights.iter().zip(&direct.weights) {
            for (x, y) in a.iter().zip(b.iter()) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_learn_from_delta_reduces_squared_error() {
        let mut s = stack(&[2, 4, 1], Activation::Tanh);
        let x = array![[0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];
        let y = array![[1.0], [-1.0], [0.5]];

        let error = |s: &LayerStack| (s.evaluate(&x).unwrap() - &y).mapv(|e| e * e).sum();
        let before = error(&s);

        for _ in 0..200 {
            let pass = s.forward(&x).unwrap();
            let delta = (pass.output() - &y) * (2.0 / 3.0);
            let rate = s.learning_rate();
            s.learn_from_delta(&pass, &delta, rate).unwrap();
        }

        assert!(error(&s) < before);
    }

    #[test]
    fn test_elu_derivative_is_continuous_at_zero() {
        let e = Activation::Elu;
        assert!((e.derivative(1e-9) - e.derivative(-1e-9)).abs() < 1e-6);
        assert_eq!(e.apply(2.0), 2.0);
        assert!(e.apply(-50.0) > -1.0 - 1e-12);
    }
}
