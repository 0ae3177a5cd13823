//! Candidate schedule with its derived fitness.

use serde::Serialize;

use crate::constraints::ViolationScorer;
use crate::domain::ShiftSlot;

/// A full candidate schedule: one gene per shift slot.
///
/// Fitness is `1 / (1 + violations)`, in `(0, 1]`, and equals `1` exactly
/// when the schedule has no violations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chromosome {
    genes: Vec<ShiftSlot>,
    violations: f64,
    fitness: f64,
}

impl Chromosome {
    /// Builds a chromosome and scores it eagerly.
    pub fn new(genes: Vec<ShiftSlot>, scorer: &ViolationScorer) -> Self {
        let mut chromosome = Self {
            genes,
            violations: 0.0,
            fitness: 1.0,
        };
        chromosome.recompute(scorer);
        chromosome
    }

    /// Re-derives fitness after the genes were replaced.
    pub fn recompute(&mut self, scorer: &ViolationScorer) {
        self.violations = scorer.score(&self.genes);
        self.fitness = 1.0 / (1.0 + self.violations);
    }

    pub fn genes(&self) -> &[ShiftSlot] {
        &self.genes
    }

    pub(crate) fn genes_mut(&mut self) -> &mut [ShiftSlot] {
        &mut self.genes
    }

    pub fn into_genes(self) -> Vec<ShiftSlot> {
        self.genes
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Weighted violation total behind the fitness.
    pub fn violations(&self) -> f64 {
        self.violations
    }

    pub fn is_feasible(&self) -> bool {
        self.fitness == 1.0
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Employee, Requirement};
    use chrono::NaiveTime;

    fn slot(id: &str, day: u32, assigned: Vec<Employee>) -> ShiftSlot {
        let t = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
        ShiftSlot::new(id, day, t, t, [Requirement::new("Nurse", 1)]).with_assignment(assigned)
    }

    #[test]
    fn test_feasible_fitness_is_one() {
        let genes = vec![slot("s1", 0, vec![Employee::new("a", "Nurse")])];
        let chromosome = Chromosome::new(genes, &ViolationScorer::default());

        assert_eq!(chromosome.fitness(), 1.0);
        assert_eq!(chromosome.violations(), 0.0);
        assert!(chromosome.is_feasible());
    }

    #[test]
    fn test_fitness_bounds() {
        let scorer = ViolationScorer::default();
        let genes = vec![slot("s1", 0, vec![]), slot("s2", 0, vec![])];
        let chromosome = Chromosome::new(genes, &scorer);

        // Two headcount and two role coverage violations.
        let expected = 1.0 / (1.0 + 4.0 * 0.8);
        assert!((chromosome.fitness() - expected).abs() < 1e-12);
        assert!(chromosome.fitness() > 0.0 && chromosome.fitness() < 1.0);
        assert!(!chromosome.is_feasible());
    }

    #[test]
    fn test_recompute_after_gene_change() {
        let scorer = ViolationScorer::default();
        let mut chromosome = Chromosome::new(vec![slot("s1", 0, vec![])], &scorer);
        assert!(!chromosome.is_feasible());

        chromosome.genes_mut()[0].assigned_employees = vec![Employee::new("a", "Nurse")];
        chromosome.recompute(&scorer);

        assert!(chromosome.is_feasible());
        assert_eq!(chromosome.len(), 1);
    }
}
