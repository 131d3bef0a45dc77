//! Pocket cube example
//!
//! Trains a small dual-head network by Autodidactic Iteration, then uses
//! it to guide the tree search on a few random scrambles.

use adi_solver::{
    cube::{CubeMove, PocketCube},
    AdiTrainer, DualHeadNet, NetConfig, PuzzleState, SolverConfig, TrainerConfig,
    TreeSearchSolver,
};
use rand::{rngs::StdRng, SeedableRng};

fn notation(moves: &[usize]) -> String {
    moves
        .iter()
        .filter_map(|&m| CubeMove::from_id(m))
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), adi_solver::SolverError> {
    // Initialize logging
    env_logger::init();

    println!("ADI Pocket Cube Example");
    println!("=======================");
    println!();

    let mut net = DualHeadNet::new(
        &[PocketCube::ENCODING_WIDTH, 128, 64],
        &[64, 32, 1],
        &[64, 32, PocketCube::MOVE_COUNT],
        NetConfig::default().with_seed(2024),
    )?;

    let trainer_config = TrainerConfig::default()
        .with_scramble_depth(6)
        .with_scrambles_per_iteration(32)
        .with_iterations(200)
        .with_seed(7);
    let mut trainer = AdiTrainer::new(PocketCube::solved(), trainer_config)?;

    println!("Training for 200 iterations...");
    let report = trainer.train(&mut net)?;
    if let (Some(first), Some(last)) = (report.losses.first(), report.final_loss()) {
        println!(
            "Loss: {:.4} -> {:.4} (value {:.4}, policy {:.4})",
            first.total(),
            last.total(),
            last.value,
            last.policy
        );
    }
    println!();

    let config = SolverConfig::default().with_max_simulations(20_000);
    let mut rng = StdRng::seed_from_u64(99);

    for depth in 1..=5 {
        let start = PocketCube::scrambled(depth, &mut rng);
        let mut solver = TreeSearchSolver::new(&net, config.clone());

        match solver.solve(&start) {
            Ok(moves) => {
                let end = start.apply_sequence(&moves);
                println!(
                    "Scramble depth {}: solved with [{}] ({})",
                    depth,
                    notation(&moves),
                    if end.is_solved() { "verified" } else { "NOT solved" }
                );
            }
            Err(e) => println!("Scramble depth {}: {}", depth, e),
        }
        println!("{}", solver.statistics().summary());
        println!();
    }

    Ok(())
}
