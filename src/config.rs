//! Configuration options for the network, the search and the trainer
//!
//! Hyperparameters are carried by explicit structs handed to constructors.
//! Every struct has a `Default` and consuming `with_*` builder methods.

use std::time::Duration;

use crate::{layers::Activation, Result, SolverError};

/// Configuration for [`DualHeadNet`](crate::net::DualHeadNet)
///
/// # Example
///
/// ```
/// use adi_solver::{Activation, NetConfig};
///
/// let config = NetConfig::default()
///     .with_body_learning_rate(0.005)
///     .with_propagation_factors(1.0, 0.5)
///     .with_body_activation(Activation::Relu)
///     .with_seed(42);
/// assert_eq!(config.policy_propagation_factor, 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NetConfig {
    /// Learning rate of the shared body stack
    pub body_learning_rate: f64,

    /// Learning rate of the value head
    pub value_learning_rate: f64,

    /// Learning rate of the policy head
    pub policy_learning_rate: f64,

    /// Scale applied to the value head's delta when it reaches the body
    pub value_propagation_factor: f64,

    /// Scale applied to the policy head's delta when it reaches the body
    pub policy_propagation_factor: f64,

    /// Activation used by every body layer
    pub body_activation: Activation,

    /// Activation used by the hidden layers of both heads
    pub head_activation: Activation,

    /// Seed for weight initialisation. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            body_learning_rate: 0.01,
            value_learning_rate: 0.001,
            policy_learning_rate: 0.1,
            value_propagation_factor: 1.0,
            policy_propagation_factor: 1.0,
            body_activation: Activation::Elu,
            head_activation: Activation::Elu,
            seed: None,
        }
    }
}

impl NetConfig {
    /// Sets the body learning rate
    pub fn with_body_learning_rate(mut self, rate: f64) -> Self {
        self.body_learning_rate = rate;
        self
    }

    /// Sets the value head learning rate
    pub fn with_value_learning_rate(mut self, rate: f64) -> Self {
        self.value_learning_rate = rate;
        self
    }

    /// Sets the policy head learning rate
    pub fn with_policy_learning_rate(mut self, rate: f64) -> Self {
        self.policy_learning_rate = rate;
        self
    }

    /// Sets the value and policy propagation factors
    pub fn with_propagation_factors(mut self, value: f64, policy: f64) -> Self {
        self.value_propagation_factor = value;
        self.policy_propagation_factor = policy;
        self
    }

    /// Sets the body activation
    pub fn with_body_activation(mut self, activation: Activation) -> Self {
        self.body_activation = activation;
        self
    }

    /// Sets the hidden activation of both heads
    pub fn with_head_activation(mut self, activation: Activation) -> Self {
        self.head_activation = activation;
        self
    }

    /// Fixes the weight initialisation seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        let rates = [
            ("body_learning_rate", self.body_learning_rate),
            ("value_learning_rate", self.value_learning_rate),
            ("policy_learning_rate", self.policy_learning_rate),
            ("value_propagation_factor", self.value_propagation_factor),
            ("policy_propagation_factor", self.policy_propagation_factor),
        ];
        for (name, rate) in rates {
            if !rate.is_finite() || rate < 0.0 {
                return Err(SolverError::Configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, rate
                )));
            }
        }
        Ok(())
    }
}

/// Configuration for [`TreeSearchSolver`](crate::solver::TreeSearchSolver)
///
/// # Example
///
/// ```
/// use adi_solver::SolverConfig;
/// use std::time::Duration;
///
/// let config = SolverConfig::default()
///     .with_exploration_factor(1.5)
///     .with_max_simulations(2_000)
///     .with_max_time(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Weight of the prior-driven exploration bonus in the selection score
    pub exploration_factor: f64,

    /// Virtual loss added to an edge while a simulation passes through it
    ///
    /// It is removed again during backup, so completed simulations leave
    /// no trace of it.
    pub loss_step: f64,

    /// Number of simulations after which `solve` gives up
    pub max_simulations: usize,

    /// Wall-clock limit after which `solve` gives up
    pub max_time: Option<Duration>,

    /// Longest selection walk before it is cut off and treated as a leaf
    pub max_depth: Option<usize>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            exploration_factor: 2.0,
            loss_step: 0.1,
            max_simulations: 10_000,
            max_time: None,
            max_depth: None,
        }
    }
}

impl SolverConfig {
    /// Sets the exploration factor
    pub fn with_exploration_factor(mut self, factor: f64) -> Self {
        self.exploration_factor = factor;
        self
    }

    /// Sets the virtual loss step
    pub fn with_loss_step(mut self, loss_step: f64) -> Self {
        self.loss_step = loss_step;
        self
    }

    /// Sets the simulation budget
    pub fn with_max_simulations(mut self, simulations: usize) -> Self {
        self.max_simulations = simulations;
        self
    }

    /// Sets the wall-clock budget
    pub fn with_max_time(mut self, duration: Duration) -> Self {
        self.max_time = Some(duration);
        self
    }

    /// Caps the length of a single selection walk
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !self.exploration_factor.is_finite() || self.exploration_factor < 0.0 {
            return Err(SolverError::Configuration(format!(
                "exploration_factor must be finite and non-negative, got {}",
                self.exploration_factor
            )));
        }
        if !self.loss_step.is_finite() || self.loss_step < 0.0 {
            return Err(SolverError::Configuration(format!(
                "loss_step must be finite and non-negative, got {}",
                self.loss_step
            )));
        }
        if self.max_simulations == 0 {
            return Err(SolverError::Configuration(
                "max_simulations must be at least 1".to_string(),
            ));
        }
        if self.max_depth == Some(0) {
            return Err(SolverError::Configuration(
                "max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for [`AdiTrainer`](crate::trainer::AdiTrainer)
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Longest scramble generated from the solved state
    pub scramble_depth: usize,

    /// Scramble sequences generated per iteration
    ///
    /// Each sequence contributes `scramble_depth` training states.
    pub scrambles_per_iteration: usize,

    /// Number of generate-then-learn rounds
    pub iterations: usize,

    /// Seed for scramble generation. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        TrainerConfig {
            scramble_depth: 8,
            scrambles_per_iteration: 16,
            iterations: 100,
            seed: None,
        }
    }
}

impl TrainerConfig {
    /// Sets the scramble depth
    pub fn with_scramble_depth(mut self, depth: usize) -> Self {
        self.scramble_depth = depth;
        self
    }

    /// Sets the number of scrambles per iteration
    pub fn with_scrambles_per_iteration(mut self, scrambles: usize) -> Self {
        self.scrambles_per_iteration = scrambles;
        self
    }

    /// Sets the number of iterations
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Fixes the scramble seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.scramble_depth == 0 || self.scrambles_per_iteration == 0 {
            return Err(SolverError::Configuration(
                "scramble_depth and scrambles_per_iteration must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
