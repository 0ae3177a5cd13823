//! Genetic algorithm driving the shift assignment search.
//!
//! One run walks `Idle -> Running -> {Completed, Cancelled, Failed}`. Generations are
//! sequential; inside a generation, offspring pairs are bred in parallel on a
//! bounded rayon pool and joined before the generation completes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chromosome::Chromosome;
use crate::config::GeneticConfig;
use crate::constraints::ViolationScorer;
use crate::domain::{Roster, ShiftSlot};
use crate::error::{Result, SchedulingError};
use crate::operators::{crossover, fittest_index, mutate, random_chromosome, tournament_select};
use crate::progress::{NoopListener, ProgressListener};

/// Lifecycle of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// No run has started.
    Idle,
    /// Actively evolving.
    Running,
    /// Finished by convergence or generation limit.
    Completed,
    /// Stopped early by a revoke.
    Cancelled,
    /// Aborted before the first generation, e.g. an uncovered role.
    Failed,
}

impl RunStatus {
    /// Returns the status as a SCREAMING_SNAKE_CASE string for API responses.
    ///
    /// ```
    /// use shift_scheduling::solver::RunStatus;
    ///
    /// assert_eq!(RunStatus::Running.as_str(), "RUNNING");
    /// assert_eq!(RunStatus::Cancelled.as_str(), "CANCELLED");
    /// ```
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Idle => "IDLE",
            RunStatus::Running => "RUNNING",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Cancelled => "CANCELLED",
            RunStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Cancelled | RunStatus::Failed
        )
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Termination {
    /// Found a schedule without violations.
    Converged,
    /// Ran `max_generations` without reaching fitness 1.
    Exhausted,
    /// Revoked; the best schedule so far is still returned.
    Cancelled,
}

/// Result of a run: the best chromosome found and how the run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub best: Chromosome,
    /// Generations fully evolved.
    pub generations: usize,
    pub termination: Termination,
}

/// Genetic algorithm over shift slot assignments.
///
/// # Examples
///
/// ```
/// use chrono::NaiveTime;
/// use shift_scheduling::config::GeneticConfig;
/// use shift_scheduling::constraints::ViolationScorer;
/// use shift_scheduling::domain::{Employee, Requirement, Roster, ShiftSlot};
/// use shift_scheduling::solver::{GeneticAlgorithm, Termination};
/// use tokio_util::sync::CancellationToken;
///
/// let t = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
/// let slots = vec![ShiftSlot::new("mon", 0, t, t, [Requirement::new("Cashier", 1)])];
/// let roster = Roster::from_employees([Employee::new("ann", "Cashier")]);
///
/// let config = GeneticConfig { population_size: 4, tournament_size: 2, seed: Some(1), ..Default::default() };
/// let mut ga = GeneticAlgorithm::new(config, ViolationScorer::default()).unwrap();
/// let solution = ga.run(&slots, &roster, &CancellationToken::new()).unwrap();
///
/// assert_eq!(solution.termination, Termination::Converged);
/// assert_eq!(solution.best.fitness(), 1.0);
/// ```
pub struct GeneticAlgorithm {
    config: GeneticConfig,
    scorer: ViolationScorer,
    rng: StdRng,
    pool: ThreadPool,
    listener: Box<dyn ProgressListener + Send>,
    status: RunStatus,
}

impl GeneticAlgorithm {
    /// Validates the configuration and prepares the worker pool.
    pub fn new(config: GeneticConfig, scorer: ViolationScorer) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("ga-worker-{}", i))
            .build()
            .map_err(|e| SchedulingError::invalid(format!("cannot build worker pool: {}", e)))?;

        Ok(Self {
            config,
            scorer,
            rng,
            pool,
            listener: Box::new(NoopListener),
            status: RunStatus::Idle,
        })
    }

    /// Replaces the progress listener.
    pub fn with_listener(mut self, listener: impl ProgressListener + Send + 'static) -> Self {
        self.listener = Box::new(listener);
        self
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Evolves assignments for `slots` until convergence, the generation
    /// limit, or cancellation.
    ///
    /// Cancellation is checked once per generation boundary and returns the
    /// best chromosome found so far. A roster that cannot staff some
    /// requirement fails before any generation runs.
    pub fn run(
        &mut self,
        slots: &[ShiftSlot],
        roster: &Roster,
        cancel: &CancellationToken,
    ) -> Result<Solution> {
        self.status = RunStatus::Running;
        let started = Instant::now();

        info!(
            slots = slots.len(),
            employees = roster.employee_count(),
            population = self.config.population_size,
            max_generations = self.config.max_generations,
            "Starting genetic algorithm"
        );

        let mut population = match self.initialize(slots, roster) {
            Ok(population) => population,
            Err(e) => {
                self.status = RunStatus::Failed;
                return Err(e);
            }
        };
        let mut best = population[fittest(&population)].clone();
        let mut generations = 0;
        let mut termination = Termination::Exhausted;

        for generation in 0..self.config.max_generations {
            if cancel.is_cancelled() {
                termination = Termination::Cancelled;
                break;
            }

            population = match self.next_generation(&population, roster) {
                Ok(next) => next,
                Err(e) => {
                    self.status = RunStatus::Failed;
                    return Err(e);
                }
            };
            generations = generation + 1;

            let generation_best = &population[fittest(&population)];
            if generation_best.fitness() > best.fitness() {
                best = generation_best.clone();
            }

            if generation % self.config.report_interval == 0 || best.is_feasible() {
                debug!(generation, fitness = best.fitness(), "Generation update");
                self.listener.on_generation_update(generation, best.fitness());
            }

            if best.is_feasible() {
                termination = Termination::Converged;
                break;
            }
        }

        self.status = match termination {
            Termination::Cancelled => RunStatus::Cancelled,
            Termination::Converged | Termination::Exhausted => RunStatus::Completed,
        };

        info!(
            generations,
            fitness = best.fitness(),
            violations = best.violations(),
            termination = ?termination,
            duration_secs = started.elapsed().as_secs_f64(),
            "Genetic algorithm finished"
        );

        Ok(Solution {
            best,
            generations,
            termination,
        })
    }

    fn initialize(&mut self, slots: &[ShiftSlot], roster: &Roster) -> Result<Vec<Chromosome>> {
        roster.check_covers(slots)?;

        let seeds: Vec<u64> = (0..self.config.population_size)
            .map(|_| self.rng.gen())
            .collect();
        let scorer = &self.scorer;
        self.pool.install(|| {
            seeds
                .par_iter()
                .map(|&seed| {
                    let mut rng = StdRng::seed_from_u64(seed);
                    random_chromosome(slots, roster, scorer, &mut rng)
                })
                .collect::<Result<Vec<_>>>()
        })
    }

    /// Two elite copies of the current best, then bred offspring pairs.
    ///
    /// Parents are chosen sequentially from the master RNG; each pair is then
    /// crossed and mutated on its own seeded RNG so results do not depend on
    /// thread scheduling.
    fn next_generation(&mut self, population: &[Chromosome], roster: &Roster) -> Result<Vec<Chromosome>> {
        let size = self.config.population_size;
        let elite = &population[fittest(population)];

        let pairs: Vec<(&Chromosome, &Chromosome, u64)> = (0..size / 2 - 1)
            .map(|_| {
                let p1 = tournament_select(population, self.config.tournament_size, &mut self.rng);
                let p2 = tournament_select(population, self.config.tournament_size, &mut self.rng);
                (p1, p2, self.rng.gen())
            })
            .collect();

        let config = &self.config;
        let scorer = &self.scorer;
        let offspring: Vec<(Chromosome, Chromosome)> = self.pool.install(|| {
            pairs
                .par_iter()
                .map(|&(p1, p2, seed)| -> Result<(Chromosome, Chromosome)> {
                    let mut rng = StdRng::seed_from_u64(seed);
                    let (mut c1, mut c2) = crossover(p1, p2, config.crossover_rate, scorer, &mut rng);
                    mutate(&mut c1, config.mutation_rate, roster, scorer, &mut rng)?;
                    mutate(&mut c2, config.mutation_rate, roster, scorer, &mut rng)?;
                    Ok((c1, c2))
                })
                .collect::<Result<Vec<_>>>()
        })?;

        let mut next = Vec::with_capacity(size);
        next.push(elite.clone());
        next.push(elite.clone());
        for (c1, c2) in offspring {
            next.push(c1);
            next.push(c2);
        }
        Ok(next)
    }
}

/// Index of the fittest member of a non-empty population.
fn fittest(population: &[Chromosome]) -> usize {
    fittest_index(population).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Employee, Requirement};
    use chrono::NaiveTime;
    use std::sync::{Arc, Mutex};

    fn time(hour: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, 0, 0).unwrap()
    }

    fn config(seed: u64) -> GeneticConfig {
        GeneticConfig {
            population_size: 20,
            tournament_size: 3,
            max_generations: 200,
            mutation_rate: 0.1,
            crossover_rate: 0.8,
            report_interval: 1,
            concurrency: 2,
            seed: Some(seed),
        }
    }

    fn cashier_problem() -> (Vec<ShiftSlot>, Roster) {
        let slots = (0..3)
            .map(|day| {
                ShiftSlot::new(
                    format!("slot-{}", day),
                    day,
                    time(9),
                    time(17),
                    [Requirement::new("cashier", 2)],
                )
            })
            .collect();
        let roster = Roster::from_employees([
            Employee::new("c1", "cashier"),
            Employee::new("c2", "cashier"),
        ]);
        (slots, roster)
    }

    /// Two slots a day for a week, one nurse each, from a pool of four nurses.
    fn week_problem() -> (Vec<ShiftSlot>, Roster) {
        let mut slots = Vec::new();
        for day in 0..7 {
            for (i, hour) in [6, 14].into_iter().enumerate() {
                slots.push(ShiftSlot::new(
                    format!("d{}-{}", day, i),
                    day,
                    time(hour),
                    time(hour + 8),
                    [Requirement::new("Nurse", 1)],
                ));
            }
        }
        let roster = Roster::from_employees((0..4).map(|i| Employee::new(format!("n{}", i), "Nurse")));
        (slots, roster)
    }

    #[test]
    fn test_cashier_scenario_converges() {
        let (slots, roster) = cashier_problem();
        let mut ga = GeneticAlgorithm::new(config(1), ViolationScorer::default()).unwrap();

        let solution = ga.run(&slots, &roster, &CancellationToken::new()).unwrap();

        assert_eq!(solution.termination, Termination::Converged);
        assert_eq!(solution.best.fitness(), 1.0);
        assert_eq!(solution.best.len(), 3);
        assert_eq!(ga.status(), RunStatus::Completed);
    }

    #[test]
    fn test_insufficient_employees_runs_no_generation() {
        let slots = vec![ShiftSlot::new("s", 0, time(9), time(17), [Requirement::new("cashier", 2)])];
        let roster = Roster::from_employees([Employee::new("c1", "cashier")]);
        let updates = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&updates);
        let mut ga = GeneticAlgorithm::new(config(2), ViolationScorer::default())
            .unwrap()
            .with_listener(move |_g: usize, _f: f64| *counter.lock().unwrap() += 1);

        let result = ga.run(&slots, &roster, &CancellationToken::new());

        match result {
            Err(SchedulingError::InsufficientEmployees { role, .. }) => assert_eq!(role, "cashier"),
            other => panic!("expected InsufficientEmployees, got {:?}", other.map(|s| s.generations)),
        }
        assert_eq!(*updates.lock().unwrap(), 0);
        assert_eq!(ga.status(), RunStatus::Failed);
    }

    #[test]
    fn test_cancel_returns_best_so_far() {
        let (slots, roster) = week_problem();
        let cfg = GeneticConfig {
            max_generations: 10_000,
            ..config(3)
        };
        let mut ga = GeneticAlgorithm::new(cfg, ViolationScorer::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let solution = ga.run(&slots, &roster, &cancel).unwrap();

        assert_eq!(solution.termination, Termination::Cancelled);
        assert_eq!(solution.generations, 0);
        assert_eq!(solution.best.len(), slots.len());
        assert!(solution.best.fitness() > 0.0);
        assert_eq!(ga.status(), RunStatus::Cancelled);
    }

    #[test]
    fn test_best_fitness_is_monotonic() {
        let (slots, roster) = week_problem();
        let history = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&history);
        let mut ga = GeneticAlgorithm::new(config(4), ViolationScorer::default())
            .unwrap()
            .with_listener(move |g: usize, f: f64| sink.lock().unwrap().push((g, f)));

        let solution = ga.run(&slots, &roster, &CancellationToken::new()).unwrap();

        let history = history.lock().unwrap();
        assert!(!history.is_empty());
        for pair in history.windows(2) {
            assert_eq!(pair[1].0, pair[0].0 + 1, "generations reported in order");
            assert!(pair[1].1 >= pair[0].1, "fitness decreased: {:?}", pair);
        }
        let last = history.last().unwrap();
        assert_eq!(last.1, solution.best.fitness());
    }

    #[test]
    fn test_report_interval() {
        let (slots, roster) = week_problem();
        let reported = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reported);
        let cfg = GeneticConfig {
            report_interval: 5,
            max_generations: 12,
            // Fitness 1 is reachable here, so keep weekly caps impossible to meet.
            ..config(5)
        };
        let scorer = ViolationScorer::new(crate::config::ScorerConfig {
            max_shifts_per_week: 0,
            ..Default::default()
        })
        .unwrap();
        let mut ga = GeneticAlgorithm::new(cfg, scorer)
            .unwrap()
            .with_listener(move |g: usize, _f: f64| sink.lock().unwrap().push(g));

        let solution = ga.run(&slots, &roster, &CancellationToken::new()).unwrap();

        assert_eq!(solution.termination, Termination::Exhausted);
        assert_eq!(solution.generations, 12);
        assert_eq!(*reported.lock().unwrap(), vec![0, 5, 10]);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let (slots, roster) = week_problem();
        let run = |concurrency| {
            let cfg = GeneticConfig {
                max_generations: 30,
                concurrency,
                ..config(6)
            };
            let mut ga = GeneticAlgorithm::new(cfg, ViolationScorer::default()).unwrap();
            let solution = ga.run(&slots, &roster, &CancellationToken::new()).unwrap();
            let assignment: Vec<Vec<String>> = solution
                .best
                .genes()
                .iter()
                .map(|g| g.assigned_employees.iter().map(|e| e.id.clone()).collect())
                .collect();
            (solution.generations, solution.best.fitness(), assignment)
        };

        assert_eq!(run(1), run(4));
    }

    #[test]
    fn test_invalid_config_rejected_before_run() {
        let cfg = GeneticConfig {
            population_size: 5,
            ..config(7)
        };
        assert!(matches!(
            GeneticAlgorithm::new(cfg, ViolationScorer::default()),
            Err(SchedulingError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_population_size_is_preserved() {
        let (slots, roster) = week_problem();
        let mut ga = GeneticAlgorithm::new(config(8), ViolationScorer::default()).unwrap();
        let population = ga.initialize(&slots, &roster).unwrap();

        let next = ga.next_generation(&population, &roster).unwrap();

        assert_eq!(next.len(), 20);
        assert!(next[0].fitness() >= population[fittest(&population)].fitness());
        assert_eq!(next[0].fitness(), next[1].fitness());
    }
}
