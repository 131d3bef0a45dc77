use adi_solver::{Activation, NetConfig, SolverConfig, TrainerConfig};
use std::time::Duration;

#[test]
fn test_solver_config_builder_methods() {
    let config = SolverConfig::default()
        .with_exploration_factor(1.5)
        .with_loss_step(0.25)
        .with_max_simulations(5000)
        .with_max_time(Duration::from_secs(30))
        .with_max_depth(20);

    assert_eq!(config.exploration_factor, 1.5);
    assert_eq!(config.loss_step, 0.25);
    assert_eq!(config.max_simulations, 5000);
    assert_eq!(config.max_time, Some(Duration::from_secs(30)));
    assert_eq!(config.max_depth, Some(20));
}

#[test]
fn test_solver_config_default_values() {
    let config = SolverConfig::default();

    assert_eq!(config.exploration_factor, 2.0);
    assert_eq!(config.loss_step, 0.1);
    assert_eq!(config.max_simulations, 10_000);
    assert_eq!(config.max_time, None);
    assert_eq!(config.max_depth, None);
}

#[test]
fn test_net_config_default_values() {
    let config = NetConfig::default();

    assert_eq!(config.body_learning_rate, 0.01);
    assert_eq!(config.value_learning_rate, 0.001);
    assert_eq!(config.policy_learning_rate, 0.1);
    assert_eq!(config.value_propagation_factor, 1.0);
    assert_eq!(config.policy_propagation_factor, 1.0);
    assert_eq!(config.body_activation, Activation::Elu);
    assert_eq!(config.seed, None);
}

#[test]
fn test_net_config_builder_methods() {
    let config = NetConfig::default()
        .with_body_learning_rate(0.02)
        .with_value_learning_rate(0.003)
        .with_policy_learning_rate(0.05)
        .with_propagation_factors(0.5, 2.0)
        .with_head_activation(Activation::Tanh)
        .with_seed(99);

    assert_eq!(config.body_learning_rate, 0.02);
    assert_eq!(config.value_learning_rate, 0.003);
    assert_eq!(config.policy_learning_rate, 0.05);
    assert_eq!(config.value_propagation_factor, 0.5);
    assert_eq!(config.policy_propagation_factor, 2.0);
    assert_eq!(config.head_activation, Activation::Tanh);
    assert_eq!(config.seed, Some(99));
}

#[test]
fn test_trainer_config_builder_methods() {
    let config = TrainerConfig::default()
        .with_scramble_depth(5)
        .with_scrambles_per_iteration(32)
        .with_iterations(10)
        .with_seed(4);

    assert_eq!(config.scramble_depth, 5);
    assert_eq!(config.scrambles_per_iteration, 32);
    assert_eq!(config.iterations, 10);
    assert_eq!(config.seed, Some(4));
}
