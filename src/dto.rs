//! DTOs for REST API requests/responses.

use serde::{Deserialize, Serialize};

use crate::config::{GeneticConfig, ScorerConfig};
use crate::constraints::{ConstraintSummary, ViolationScorer};
use crate::demo_data::DemoProblem;
use crate::domain::{Employee, Roster, ShiftSlot};
use crate::service::RunRequest;
use crate::solver::{Solution, Termination};

/// A scheduling problem, optionally with assignments and tuning overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDto {
    pub slots: Vec<ShiftSlot>,
    pub employees: Vec<Employee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<GeneticConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scorer: Option<ScorerConfig>,
}

impl ScheduleDto {
    pub fn from_problem(problem: &DemoProblem) -> Self {
        Self {
            slots: problem.slots.clone(),
            employees: problem.employees.clone(),
            config: None,
            scorer: None,
        }
    }

    pub fn scorer_config(&self) -> ScorerConfig {
        self.scorer.clone().unwrap_or_default()
    }

    pub fn to_request(&self) -> RunRequest {
        RunRequest {
            slots: self.slots.clone(),
            roster: Roster::from_employees(self.employees.iter().cloned()),
            config: self.config.clone().unwrap_or_default(),
            scorer: self.scorer_config(),
        }
    }
}

/// Best schedule of a finished run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDto {
    pub slots: Vec<ShiftSlot>,
    pub fitness: f64,
    pub violations: f64,
    pub generations: usize,
    pub termination: Termination,
    pub constraints: Vec<ConstraintSummary>,
}

impl SolutionDto {
    pub fn from_solution(solution: &Solution, scorer: &ViolationScorer) -> Self {
        let genes = solution.best.genes();
        Self {
            slots: genes.to_vec(),
            fitness: solution.best.fitness(),
            violations: solution.best.violations(),
            generations: solution.generations,
            termination: solution.termination,
            constraints: scorer.analyze(genes).constraints(scorer),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub solver_engine: &'static str,
}

/// Response for violation analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub score: f64,
    pub fitness: f64,
    pub feasible: bool,
    pub constraints: Vec<ConstraintSummary>,
}

impl AnalyzeResponse {
    pub fn analyze(slots: &[ShiftSlot], scorer: &ViolationScorer) -> Self {
        let report = scorer.analyze(slots);
        let score = report.penalty(scorer.config().hard_penalty, scorer.config().soft_penalty);
        Self {
            score,
            fitness: 1.0 / (1.0 + score),
            feasible: report.is_feasible(),
            constraints: report.constraints(scorer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_data::{generate, DemoData};

    #[test]
    fn test_schedule_dto_round_trips_through_json() {
        let dto = ScheduleDto::from_problem(&generate(DemoData::Small));
        let json = serde_json::to_string(&dto).unwrap();

        assert!(json.contains("\"startTime\""));
        assert!(json.contains("\"assignedEmployees\""));

        let parsed: ScheduleDto = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.slots.len(), dto.slots.len());
        assert_eq!(parsed.employees, dto.employees);
    }

    #[test]
    fn test_to_request_applies_defaults() {
        let json = r#"{
            "slots": [{"id": "s1", "day": 0, "startTime": "09:00:00", "endTime": "17:00:00",
                       "requirements": [{"role": "Nurse", "count": 1}]}],
            "employees": [{"id": "n1", "role": "Nurse"}],
            "config": {"populationSize": 10}
        }"#;
        let dto: ScheduleDto = serde_json::from_str(json).unwrap();
        let request = dto.to_request();

        assert_eq!(request.config.population_size, 10);
        assert_eq!(request.config.tournament_size, GeneticConfig::default().tournament_size);
        assert_eq!(request.scorer, ScorerConfig::default());
        assert_eq!(request.roster.candidates("Nurse").map(<[_]>::len), Some(1));
        assert!(request.slots[0].assigned_employees.is_empty());
    }

    #[test]
    fn test_analyze_unassigned_schedule() {
        let problem = generate(DemoData::Small);
        let response = AnalyzeResponse::analyze(&problem.slots, &ViolationScorer::default());

        assert!(!response.feasible);
        assert!(response.score > 0.0);
        assert!(response.fitness < 1.0);
        // Every slot misses its headcount.
        assert_eq!(response.constraints[0].matches, problem.slots.len());
    }
}
