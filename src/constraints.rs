//! Violation scoring for candidate schedules.
//!
//! A schedule is scored by counting rule violations and weighting each
//! instance by the hard or soft penalty:
//!
//! - **Headcount** (hard): assigned count differs from the total requirement
//! - **Duplicate in slot** (hard): one employee listed twice in a slot
//! - **Role coverage** (hard): a requirement's role count is not met exactly
//! - **One slot per day** (hard): an employee works several slots on one day
//! - **Weekly workload** (hard): an employee exceeds `max_shifts_per_week`
//! - **Rest ordering** (soft): a late slot followed by an earlier slot the next day

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::config::ScorerConfig;
use crate::domain::ShiftSlot;
use crate::error::Result;

/// Instance counts per violation rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationReport {
    pub headcount: usize,
    pub duplicate_in_slot: usize,
    pub role_coverage: usize,
    pub same_day: usize,
    pub weekly_overwork: usize,
    pub rest_ordering: usize,
}

/// One line of a constraint breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSummary {
    pub name: &'static str,
    pub hard: bool,
    pub matches: usize,
    pub penalty: f64,
}

impl ViolationReport {
    pub fn hard_count(&self) -> usize {
        self.headcount
            + self.duplicate_in_slot
            + self.role_coverage
            + self.same_day
            + self.weekly_overwork
    }

    pub fn soft_count(&self) -> usize {
        self.rest_ordering
    }

    /// No violation of any kind.
    pub fn is_feasible(&self) -> bool {
        self.hard_count() == 0 && self.soft_count() == 0
    }

    /// Weighted total: hard instances times `hard_penalty` plus soft instances
    /// times `soft_penalty`.
    pub fn penalty(&self, hard_penalty: f64, soft_penalty: f64) -> f64 {
        self.hard_count() as f64 * hard_penalty + self.soft_count() as f64 * soft_penalty
    }

    /// Per-constraint breakdown in rule order.
    pub fn constraints(&self, scorer: &ViolationScorer) -> Vec<ConstraintSummary> {
        let hard = |name, matches: usize| ConstraintSummary {
            name,
            hard: true,
            matches,
            penalty: matches as f64 * scorer.config.hard_penalty,
        };
        vec![
            hard("Headcount", self.headcount),
            hard("Duplicate in slot", self.duplicate_in_slot),
            hard("Role coverage", self.role_coverage),
            hard("One slot per day", self.same_day),
            hard("Weekly workload", self.weekly_overwork),
            ConstraintSummary {
                name: "Rest ordering",
                hard: false,
                matches: self.rest_ordering,
                penalty: self.rest_ordering as f64 * scorer.config.soft_penalty,
            },
        ]
    }
}

/// Computes a non-negative penalty for a full candidate schedule.
///
/// Holds only its penalty weights; scoring is pure and safe to share
/// across worker threads.
#[derive(Debug, Clone, Default)]
pub struct ViolationScorer {
    config: ScorerConfig,
}

impl ViolationScorer {
    pub fn new(config: ScorerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Weighted violation total, always `>= 0`.
    pub fn score(&self, genes: &[ShiftSlot]) -> f64 {
        self.analyze(genes)
            .penalty(self.config.hard_penalty, self.config.soft_penalty)
    }

    /// Counts violation instances for every rule.
    pub fn analyze(&self, genes: &[ShiftSlot]) -> ViolationReport {
        let mut report = ViolationReport::default();

        for slot in genes {
            check_slot(slot, &mut report);
        }

        let days = group_by_day(genes);
        report.same_day = count_same_day(&days);
        report.weekly_overwork = count_overwork(genes, self.config.max_shifts_per_week);
        report.rest_ordering = count_rest_ordering(&days);

        report
    }
}

/// Rules local to one slot: headcount, duplicates and role coverage.
fn check_slot(slot: &ShiftSlot, report: &mut ViolationReport) {
    if slot.assigned_employees.len() != slot.required_headcount() {
        report.headcount += 1;
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for employee in &slot.assigned_employees {
        *seen.entry(employee.id.as_str()).or_insert(0) += 1;
    }
    report.duplicate_in_slot += seen.values().map(|n| n - 1).sum::<usize>();

    for requirement in slot.requirements.iter() {
        let covered = slot
            .assigned_employees
            .iter()
            .filter(|e| e.role == requirement.role)
            .count();
        if covered != requirement.count {
            report.role_coverage += 1;
        }
    }
}

/// Slots grouped by day, keeping caller order within each day.
fn group_by_day(genes: &[ShiftSlot]) -> BTreeMap<u32, Vec<&ShiftSlot>> {
    let mut days: BTreeMap<u32, Vec<&ShiftSlot>> = BTreeMap::new();
    for slot in genes {
        days.entry(slot.day).or_default().push(slot);
    }
    days
}

fn count_same_day(days: &BTreeMap<u32, Vec<&ShiftSlot>>) -> usize {
    let mut violations = 0;
    for slots in days.values() {
        // Distinct slots per employee; repeats inside a slot are counted elsewhere.
        let mut slots_worked: HashMap<&str, usize> = HashMap::new();
        for slot in slots {
            let mut ids: Vec<&str> = slot.assigned_employees.iter().map(|e| e.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            for id in ids {
                *slots_worked.entry(id).or_insert(0) += 1;
            }
        }
        violations += slots_worked.values().map(|n| n - 1).sum::<usize>();
    }
    violations
}

fn count_overwork(genes: &[ShiftSlot], max_shifts_per_week: usize) -> usize {
    let mut assignments: HashMap<&str, usize> = HashMap::new();
    for employee in genes.iter().flat_map(|s| s.assigned_employees.iter()) {
        *assignments.entry(employee.id.as_str()).or_insert(0) += 1;
    }
    assignments
        .values()
        .filter(|&&n| n > max_shifts_per_week)
        .count()
}

fn count_rest_ordering(days: &BTreeMap<u32, Vec<&ShiftSlot>>) -> usize {
    let mut violations = 0;
    for (day, slots) in days {
        let Some(next_day) = day.checked_add(1).and_then(|d| days.get(&d)) else {
            continue;
        };
        for (j, slot) in slots.iter().enumerate() {
            let earlier_next_day = &next_day[..j.min(next_day.len())];
            for employee in &slot.assigned_employees {
                if earlier_next_day.iter().any(|s| s.assigns(employee)) {
                    violations += 1;
                }
            }
        }
    }
    violations
}
