//! Optimizer, scorer and server configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

use crate::error::{Result, SchedulingError};

/// Default bind address: same port as the other quickstarts.
const DEFAULT_ADDR: &str = "0.0.0.0:7860";

/// Environment variable overriding the bind address.
const ADDR_ENV: &str = "SCHEDULING_ADDR";

/// Upper bound on `GeneticConfig::concurrency`: one rayon pool is built per run.
pub const MAX_CONCURRENCY: usize = 64;

/// Genetic algorithm parameters.
///
/// Every field has a default so API callers may override only what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneticConfig {
    /// Chromosomes per generation. Must be even and at least 4.
    pub population_size: usize,
    /// Candidates drawn per tournament.
    pub tournament_size: usize,
    pub max_generations: usize,
    /// Per-gene probability of re-sampling an assignment.
    pub mutation_rate: f64,
    /// Probability that a parent pair is recombined at all.
    pub crossover_rate: f64,
    /// Progress is reported every `report_interval` generations.
    pub report_interval: usize,
    /// Worker threads used to breed offspring within one generation,
    /// in `1..=MAX_CONCURRENCY`.
    pub concurrency: usize,
    /// Fixed seed for reproducible runs; entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            tournament_size: 3,
            max_generations: 1000,
            mutation_rate: 0.05,
            crossover_rate: 0.8,
            report_interval: 10,
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get().min(MAX_CONCURRENCY))
                .unwrap_or(1),
            seed: None,
        }
    }
}

impl GeneticConfig {
    /// Rejects parameter combinations the generation loop cannot honor.
    ///
    /// ```
    /// use shift_scheduling::config::GeneticConfig;
    ///
    /// assert!(GeneticConfig::default().validate().is_ok());
    ///
    /// let odd = GeneticConfig { population_size: 7, ..Default::default() };
    /// assert!(odd.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 4 || self.population_size % 2 != 0 {
            return Err(SchedulingError::invalid(format!(
                "populationSize must be even and >= 4, got {}",
                self.population_size
            )));
        }
        if self.tournament_size == 0 || self.tournament_size > self.population_size {
            return Err(SchedulingError::invalid(format!(
                "tournamentSize must be in 1..={}, got {}",
                self.population_size, self.tournament_size
            )));
        }
        if self.max_generations == 0 {
            return Err(SchedulingError::invalid("maxGenerations must be >= 1"));
        }
        check_probability("mutationRate", self.mutation_rate)?;
        check_probability("crossoverRate", self.crossover_rate)?;
        if self.report_interval == 0 {
            return Err(SchedulingError::invalid("reportInterval must be >= 1"));
        }
        if self.concurrency == 0 || self.concurrency > MAX_CONCURRENCY {
            return Err(SchedulingError::invalid(format!(
                "concurrency must be in 1..={}, got {}",
                MAX_CONCURRENCY, self.concurrency
            )));
        }
        Ok(())
    }
}

fn check_probability(name: &str, value: f64) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SchedulingError::invalid(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )))
    }
}

/// Penalty weights for the violation scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorerConfig {
    pub hard_penalty: f64,
    pub soft_penalty: f64,
    pub max_shifts_per_week: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            hard_penalty: 0.8,
            soft_penalty: 0.3,
            max_shifts_per_week: 5,
        }
    }
}

impl ScorerConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("hardPenalty", self.hard_penalty),
            ("softPenalty", self.soft_penalty),
        ] {
            // A zero weight would let violating schedules reach fitness 1.
            if !value.is_finite() || value <= 0.0 {
                return Err(SchedulingError::invalid(format!(
                    "{} must be a finite positive number, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// Reads the bind address from `SCHEDULING_ADDR`, falling back to the default.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(ADDR_ENV).unwrap_or_else(|_| DEFAULT_ADDR.to_string());
        let addr = raw.parse().map_err(|e| {
            SchedulingError::invalid(format!("{} '{}' is not a socket address: {}", ADDR_ENV, raw, e))
        })?;
        Ok(Self { addr })
    }
}
