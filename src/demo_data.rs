//! Demo data generators for shift scheduling.

use chrono::NaiveTime;
use rand::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::domain::{Employee, Requirement, Roster, ShiftSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemoData {
    Small,
    Large,
}

impl std::str::FromStr for DemoData {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "SMALL" => Ok(DemoData::Small),
            "LARGE" => Ok(DemoData::Large),
            _ => Err(()),
        }
    }
}

impl DemoData {
    pub fn as_str(&self) -> &'static str {
        match self {
            DemoData::Small => "SMALL",
            DemoData::Large => "LARGE",
        }
    }

    fn parameters(&self) -> DemoDataParameters {
        match self {
            DemoData::Small => DemoDataParameters {
                days_in_schedule: 7,
                shift_start_hours: vec![6, 14],
                doctor_count: 4,
                nurse_count: 8,
                // (doctors, nurses) per slot
                staffing_distribution: vec![((1, 1), 3.0), ((1, 2), 1.0)],
            },
            DemoData::Large => DemoDataParameters {
                days_in_schedule: 7,
                shift_start_hours: vec![6, 14, 22],
                doctor_count: 12,
                nurse_count: 25,
                staffing_distribution: vec![((1, 2), 3.0), ((2, 3), 2.0), ((1, 4), 1.0)],
            },
        }
    }
}

struct DemoDataParameters {
    days_in_schedule: u32,
    shift_start_hours: Vec<u32>,
    doctor_count: usize,
    nurse_count: usize,
    staffing_distribution: Vec<((usize, usize), f64)>,
}

/// A generated problem: slots in chronological order plus the employees.
#[derive(Debug, Clone)]
pub struct DemoProblem {
    pub slots: Vec<ShiftSlot>,
    pub employees: Vec<Employee>,
}

impl DemoProblem {
    pub fn roster(&self) -> Roster {
        Roster::from_employees(self.employees.iter().cloned())
    }
}

/// List of available demo data sets.
pub fn list_demo_data() -> Vec<&'static str> {
    [DemoData::Small, DemoData::Large]
        .iter()
        .map(DemoData::as_str)
        .collect()
}

/// Generates a demo problem for the given size.
pub fn generate(demo: DemoData) -> DemoProblem {
    let params = demo.parameters();
    let mut rng = StdRng::seed_from_u64(0);

    let mut names = generate_name_permutations(&mut rng).into_iter();
    let mut employees = Vec::with_capacity(params.doctor_count + params.nurse_count);
    for (role, count) in [("Doctor", params.doctor_count), ("Nurse", params.nurse_count)] {
        for _ in 0..count {
            let name = names.next().unwrap_or_else(|| format!("{} {}", role, employees.len()));
            employees.push(Employee::new(name, role));
        }
    }

    let mut slots = Vec::new();
    for day in 0..params.days_in_schedule {
        for &hour in &params.shift_start_hours {
            let (doctors, nurses) = pick_staffing(&mut rng, &params.staffing_distribution);
            slots.push(ShiftSlot::new(
                format!("{}-{:02}", day, hour),
                day,
                time(hour),
                time((hour + 8) % 24),
                [
                    Requirement::new("Doctor", doctors),
                    Requirement::new("Nurse", nurses),
                ],
            ));
        }
    }

    DemoProblem { slots, employees }
}

fn time(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Pick a staffing level based on weighted distribution.
fn pick_staffing(rng: &mut StdRng, distribution: &[((usize, usize), f64)]) -> (usize, usize) {
    let total_weight: f64 = distribution.iter().map(|(_, w)| w).sum();
    let mut choice = rng.gen::<f64>() * total_weight;

    for (staffing, weight) in distribution {
        if choice < *weight {
            return *staffing;
        }
        choice -= weight;
    }
    distribution.last().map(|(s, _)| *s).unwrap_or((1, 1))
}

const FIRST_NAMES: &[&str] = &[
    "Amy", "Beth", "Carl", "Dan", "Elsa", "Flo", "Gus", "Hugo", "Ivy", "Jay",
];
const LAST_NAMES: &[&str] = &[
    "Cole", "Fox", "Green", "Jones", "King", "Li", "Poe", "Rye", "Smith", "Watt",
];

fn generate_name_permutations(rng: &mut StdRng) -> Vec<String> {
    let mut names = Vec::with_capacity(FIRST_NAMES.len() * LAST_NAMES.len());
    for first in FIRST_NAMES {
        for last in LAST_NAMES {
            names.push(format!("{} {}", first, last));
        }
    }
    names.shuffle(rng);
    names
}
