//! Population operators: initialization, selection, crossover and mutation.
//!
//! Every operator is a pure function over its inputs plus an explicit RNG.
//! Offspring always own fresh gene vectors, so parents that survive into the
//! next generation are never touched.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::chromosome::Chromosome;
use crate::constraints::ViolationScorer;
use crate::domain::{Employee, Roster, ShiftSlot};
use crate::error::{Result, SchedulingError};

/// Draws a fresh assignment for one slot.
///
/// For each requirement, `count` distinct employees are sampled uniformly
/// without replacement from that role's pool. Sampling is local to the slot.
pub fn sample_assignment<R: Rng + ?Sized>(
    slot: &ShiftSlot,
    roster: &Roster,
    rng: &mut R,
) -> Result<Vec<Employee>> {
    let mut assigned = Vec::with_capacity(slot.required_headcount());
    for requirement in slot.requirements.iter() {
        let pool = roster.candidates(&requirement.role).unwrap_or(&[]);
        if pool.len() < requirement.count {
            return Err(SchedulingError::InsufficientEmployees {
                role: requirement.role.clone(),
                required: requirement.count,
                available: pool.len(),
            });
        }
        assigned.extend(pool.choose_multiple(rng, requirement.count).cloned());
    }
    Ok(assigned)
}

/// Builds one random chromosome over the given slots.
pub fn random_chromosome<R: Rng + ?Sized>(
    slots: &[ShiftSlot],
    roster: &Roster,
    scorer: &ViolationScorer,
    rng: &mut R,
) -> Result<Chromosome> {
    let genes = slots
        .iter()
        .map(|slot| -> Result<ShiftSlot> {
            Ok(slot.with_assignment(sample_assignment(slot, roster, rng)?))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Chromosome::new(genes, scorer))
}

/// Builds `population_size` random chromosomes.
pub fn initialize_population<R: Rng + ?Sized>(
    population_size: usize,
    slots: &[ShiftSlot],
    roster: &Roster,
    scorer: &ViolationScorer,
    rng: &mut R,
) -> Result<Vec<Chromosome>> {
    (0..population_size)
        .map(|_| random_chromosome(slots, roster, scorer, rng))
        .collect()
}

/// Index of the fittest chromosome; ties go to the first one.
pub fn fittest_index(population: &[Chromosome]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, chromosome) in population.iter().enumerate() {
        match best {
            Some(b) if population[b].fitness() >= chromosome.fitness() => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Tournament selection.
///
/// Draws `tournament_size` contestants uniformly with replacement and returns
/// the fittest, ties going to the first drawn. A tournament as large as the
/// population covers every member, so it always returns the population's best.
///
/// # Panics
///
/// Panics if `population` is empty.
pub fn tournament_select<'a, R: Rng + ?Sized>(
    population: &'a [Chromosome],
    tournament_size: usize,
    rng: &mut R,
) -> &'a Chromosome {
    if tournament_size >= population.len() {
        let best = fittest_index(population).expect("tournament over an empty population");
        return &population[best];
    }

    let mut winner = &population[rng.gen_range(0..population.len())];
    for _ in 1..tournament_size {
        let contestant = &population[rng.gen_range(0..population.len())];
        if contestant.fitness() > winner.fitness() {
            winner = contestant;
        }
    }
    winner
}

/// Uniform crossover.
///
/// With probability `1 - crossover_rate` the parents are returned unchanged.
/// Otherwise each gene index flips a fair coin to swap or keep, and both
/// children are re-scored.
pub fn crossover<R: Rng + ?Sized>(
    parent1: &Chromosome,
    parent2: &Chromosome,
    crossover_rate: f64,
    scorer: &ViolationScorer,
    rng: &mut R,
) -> (Chromosome, Chromosome) {
    if !rng.gen_bool(crossover_rate) {
        return (parent1.clone(), parent2.clone());
    }

    let n = parent1.len().min(parent2.len());
    let mut genes1 = Vec::with_capacity(n);
    let mut genes2 = Vec::with_capacity(n);
    for (a, b) in parent1.genes().iter().zip(parent2.genes()) {
        if rng.gen_bool(0.5) {
            genes1.push(b.clone());
            genes2.push(a.clone());
        } else {
            genes1.push(a.clone());
            genes2.push(b.clone());
        }
    }

    (Chromosome::new(genes1, scorer), Chromosome::new(genes2, scorer))
}

/// Re-samples each gene's assignment with probability `mutation_rate`, then
/// re-scores once.
pub fn mutate<R: Rng + ?Sized>(
    chromosome: &mut Chromosome,
    mutation_rate: f64,
    roster: &Roster,
    scorer: &ViolationScorer,
    rng: &mut R,
) -> Result<()> {
    for gene in chromosome.genes_mut() {
        if rng.gen_bool(mutation_rate) {
            gene.assigned_employees = sample_assignment(gene, roster, rng)?;
        }
    }
    chromosome.recompute(scorer);
    Ok(())
}
