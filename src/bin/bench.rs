//! Benchmark for violation scoring and a full optimizer run.
//!
//! Run with: cargo run --release --bin bench

use rand::rngs::StdRng;
use rand::SeedableRng;
use shift_scheduling::config::GeneticConfig;
use shift_scheduling::console::{self, ConsoleListener};
use shift_scheduling::constraints::ViolationScorer;
use shift_scheduling::demo_data::{self, DemoData};
use shift_scheduling::operators;
use shift_scheduling::solver::GeneticAlgorithm;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

const SCORING_ROUNDS: usize = 50;

fn main() -> shift_scheduling::Result<()> {
    let problem = demo_data::generate(DemoData::Large);
    let roster = problem.roster();
    let scorer = ViolationScorer::default();

    println!("Benchmark: Violation Scoring");
    println!("  Slots: {}", problem.slots.len());
    println!("  Employees: {}", problem.employees.len());
    println!();

    let mut rng = StdRng::seed_from_u64(42);
    let population = operators::initialize_population(200, &problem.slots, &roster, &scorer, &mut rng)?;

    let bench_start = Instant::now();
    let mut evaluations: u64 = 0;
    let mut checksum = 0.0;
    for _ in 0..SCORING_ROUNDS {
        for chromosome in &population {
            checksum += scorer.score(chromosome.genes());
            evaluations += 1;
        }
    }
    let elapsed = bench_start.elapsed();

    println!("Results:");
    println!("  Evaluations: {}", evaluations);
    println!("  Time: {:.2?}", elapsed);
    println!("  Evaluations/sec: {:.0}", evaluations as f64 / elapsed.as_secs_f64());

    // Scoring is pure: the cached violations must match a rescore.
    let expected: f64 = population.iter().map(|c| c.violations()).sum::<f64>() * SCORING_ROUNDS as f64;
    assert!((checksum - expected).abs() <= 1e-9 * expected.max(1.0), "Scores drifted!");
    println!("  Checksum: {:.2} (verified)", checksum);
    println!();

    let config = GeneticConfig {
        population_size: 100,
        max_generations: 500,
        report_interval: 50,
        seed: Some(42),
        ..Default::default()
    };
    console::print_run_started(problem.slots.len(), roster.employee_count(), config.population_size);

    let mut ga = GeneticAlgorithm::new(config, scorer)?.with_listener(ConsoleListener::new());
    let run_start = Instant::now();
    let solution = ga.run(&problem.slots, &roster, &CancellationToken::new())?;
    console::print_run_ended(run_start.elapsed(), &solution);

    let schedule = solution.best.into_genes();
    let assignments: usize = schedule.iter().map(|slot| slot.assigned_employees.len()).sum();
    println!("Assignments: {} across {} slots", assignments, schedule.len());

    Ok(())
}
