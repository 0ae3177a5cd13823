//! Domain model for the shift assignment problem.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::{Result, SchedulingError};

/// An employee who can be assigned to shift slots.
///
/// Two employees are the same person when their ids match, whatever the role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub role: String,
}

impl Employee {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
        }
    }
}

impl PartialEq for Employee {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Employee {}

impl Hash for Employee {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// How many employees of a role a slot needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub role: String,
    pub count: usize,
}

impl Requirement {
    pub fn new(role: impl Into<String>, count: usize) -> Self {
        Self {
            role: role.into(),
            count,
        }
    }
}

/// A slot on the schedule that must be staffed: one gene of a chromosome.
///
/// `requirements` is shared between every copy of the slot; only
/// `assigned_employees` differs between candidate schedules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSlot {
    pub id: String,
    /// Day index within the scheduling horizon.
    pub day: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub requirements: Arc<[Requirement]>,
    #[serde(default)]
    pub assigned_employees: Vec<Employee>,
}

impl ShiftSlot {
    pub fn new(
        id: impl Into<String>,
        day: u32,
        start_time: NaiveTime,
        end_time: NaiveTime,
        requirements: impl IntoIterator<Item = Requirement>,
    ) -> Self {
        Self {
            id: id.into(),
            day,
            start_time,
            end_time,
            requirements: requirements.into_iter().collect(),
            assigned_employees: Vec::new(),
        }
    }

    /// Total headcount demanded by all requirements.
    ///
    /// ```
    /// use chrono::NaiveTime;
    /// use shift_scheduling::domain::{Requirement, ShiftSlot};
    ///
    /// let t = NaiveTime::from_hms_opt(6, 0, 0).unwrap();
    /// let slot = ShiftSlot::new("s1", 0, t, t, [Requirement::new("Doctor", 1), Requirement::new("Nurse", 2)]);
    /// assert_eq!(slot.required_headcount(), 3);
    /// ```
    pub fn required_headcount(&self) -> usize {
        self.requirements.iter().map(|r| r.count).sum()
    }

    /// Returns true if the employee is assigned to this slot.
    pub fn assigns(&self, employee: &Employee) -> bool {
        self.assigned_employees.iter().any(|e| e == employee)
    }

    /// Returns a copy of this slot carrying a different assignment.
    pub fn with_assignment(&self, assigned_employees: Vec<Employee>) -> Self {
        Self {
            id: self.id.clone(),
            day: self.day,
            start_time: self.start_time,
            end_time: self.end_time,
            requirements: Arc::clone(&self.requirements),
            assigned_employees,
        }
    }
}

/// Candidate employees grouped by role.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    by_role: HashMap<String, Vec<Employee>>,
}

impl Roster {
    /// Groups employees by role, keeping their input order within each role.
    pub fn from_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let mut by_role: HashMap<String, Vec<Employee>> = HashMap::new();
        for employee in employees {
            by_role
                .entry(employee.role.clone())
                .or_default()
                .push(employee);
        }
        Self { by_role }
    }

    pub fn candidates(&self, role: &str) -> Option<&[Employee]> {
        self.by_role.get(role).map(Vec::as_slice)
    }

    pub fn employee_count(&self) -> usize {
        self.by_role.values().map(Vec::len).sum()
    }

    /// Checks that every requirement of every slot is positive and can be
    /// sampled without replacement from this roster.
    pub fn check_covers(&self, slots: &[ShiftSlot]) -> Result<()> {
        for slot in slots {
            if let Some(empty) = slot.requirements.iter().find(|r| r.count == 0) {
                return Err(SchedulingError::invalid(format!(
                    "slot '{}' requires zero employees of role '{}'",
                    slot.id, empty.role
                )));
            }
        }
        for requirement in slots.iter().flat_map(|s| s.requirements.iter()) {
            let available = self.candidates(&requirement.role).map_or(0, <[_]>::len);
            if available < requirement.count {
                return Err(SchedulingError::InsufficientEmployees {
                    role: requirement.role.clone(),
                    required: requirement.count,
                    available,
                });
            }
        }
        Ok(())
    }
}
