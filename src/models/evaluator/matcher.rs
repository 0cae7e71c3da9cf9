use chrono::{DateTime, Utc};

use crate::errors::AppError;
use super::types::*;
use super::EvaluatorDirectory;

/// Builds the evaluator set for a forward decision.
///
/// Selection is scoped to one department at a time: switching department
/// drops everything selected so far. Capacity is reported, never enforced.
#[derive(Debug, Default)]
pub struct AssignmentMatcher {
    department: Option<String>,
    pool: Vec<Evaluator>,
    selected: Vec<String>,
}

impl AssignmentMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn department(&self) -> Option<&str> {
        self.department.as_deref()
    }

    /// Load the department's evaluators from the directory.
    pub async fn select_department(
        &mut self,
        directory: &dyn EvaluatorDirectory,
        department: &str,
    ) -> Result<&[Evaluator], AppError> {
        let evaluators = directory.list_by_department(department).await?;
        self.set_pool(department, evaluators);
        Ok(&self.pool)
    }

    /// Install a department listing. Entries from other departments are dropped.
    pub fn set_pool(&mut self, department: &str, evaluators: Vec<Evaluator>) {
        if self.department.as_deref() != Some(department) {
            self.selected.clear();
        }
        self.department = Some(department.to_string());
        self.pool = evaluators
            .into_iter()
            .filter(|e| e.department == department)
            .collect();
    }

    /// Select an evaluator. Returns `false` if it was already selected.
    pub fn add(&mut self, evaluator_id: &str) -> Result<bool, AppError> {
        let Some(department) = self.department.as_deref() else {
            return Err(AppError::Validation(
                "A department must be chosen before selecting evaluators".to_string(),
            ));
        };
        if !self.pool.iter().any(|e| e.id == evaluator_id) {
            return Err(AppError::Validation(format!(
                "Evaluator '{evaluator_id}' is not listed in department '{department}'"
            )));
        }
        if self.selected.iter().any(|id| id == evaluator_id) {
            return Ok(false);
        }
        self.selected.push(evaluator_id.to_string());
        Ok(true)
    }

    pub fn remove(&mut self, evaluator_id: &str) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| id != evaluator_id);
        self.selected.len() != before
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.pool
            .iter()
            .map(|e| Candidate {
                evaluator: e.clone(),
                over_capacity: e.is_over_capacity(),
                selected: self.selected.contains(&e.id),
            })
            .collect()
    }

    /// One message per selected evaluator that is busy or at capacity.
    pub fn capacity_warnings(&self) -> Vec<String> {
        self.selected
            .iter()
            .filter_map(|id| self.pool.iter().find(|e| &e.id == id))
            .filter_map(|e| {
                if e.is_over_capacity() {
                    Some(format!(
                        "{} ({}) is at capacity: {}/{} reviews",
                        e.name, e.id, e.current_workload, e.max_workload
                    ))
                } else if e.availability == Availability::Busy {
                    Some(format!("{} ({}) is marked busy", e.name, e.id))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Turn the selection into an assignment.
    pub fn finish(
        &self,
        proposal_id: &str,
        deadline: DateTime<Utc>,
        assigned_at: DateTime<Utc>,
    ) -> Result<Assignment, AppError> {
        let department = self.department.clone().unwrap_or_default();
        if self.selected.is_empty() {
            return Err(AppError::Assignment(
                "Forwarding requires at least one evaluator".to_string(),
            ));
        }
        Ok(Assignment {
            proposal_id: proposal_id.to_string(),
            department,
            evaluator_ids: self.selected.clone(),
            deadline,
            assigned_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn evaluator(id: &str, department: &str, workload: u32) -> Evaluator {
        Evaluator {
            id: id.to_string(),
            name: format!("Evaluator {id}"),
            department: department.to_string(),
            specialties: Default::default(),
            availability: Availability::Available,
            current_workload: workload,
            max_workload: 3,
            rating: 4.5,
            completed_reviews: 10,
            agency: "WMSU".to_string(),
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn duplicate_additions_are_no_ops() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0), evaluator("E-3", "CCS", 1)]);
        assert!(m.add("E-1").unwrap());
        assert!(!m.add("E-1").unwrap());
        assert!(m.add("E-3").unwrap());
        assert_eq!(m.selected(), ["E-1", "E-3"]);
    }

    #[test]
    fn changing_department_clears_selection() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0)]);
        m.add("E-1").unwrap();
        m.set_pool("COE", vec![evaluator("E-2", "COE", 0)]);
        assert!(m.selected().is_empty());
        assert!(m.add("E-1").is_err());
    }

    #[test]
    fn reloading_same_department_keeps_selection() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0)]);
        m.add("E-1").unwrap();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0)]);
        assert_eq!(m.selected(), ["E-1"]);
    }

    #[test]
    fn foreign_department_entries_are_filtered_out() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0), evaluator("E-2", "COE", 0)]);
        assert!(m.candidates().iter().all(|c| c.evaluator.department == "CCS"));
        assert!(matches!(m.add("E-2"), Err(AppError::Validation(_))));
    }

    #[test]
    fn over_capacity_is_selectable_but_flagged() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 3)]);
        assert!(m.add("E-1").unwrap());
        assert!(m.candidates()[0].over_capacity);
        assert_eq!(m.capacity_warnings().len(), 1);
    }

    #[test]
    fn empty_selection_is_an_assignment_error() {
        let mut m = AssignmentMatcher::new();
        m.set_pool("CCS", vec![evaluator("E-1", "CCS", 0)]);
        assert!(matches!(m.finish("P-1", at(), at()), Err(AppError::Assignment(_))));
        m.add("E-1").unwrap();
        assert!(m.remove("E-1"));
        assert!(matches!(m.finish("P-1", at(), at()), Err(AppError::Assignment(_))));
    }
}
