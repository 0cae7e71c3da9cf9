use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    Busy,
}

impl Availability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Availability::Available => "available",
            Availability::Busy => "busy",
        }
    }
}

/// An evaluator as listed by the external directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluator {
    pub id: String,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub specialties: BTreeSet<String>,
    pub availability: Availability,
    pub current_workload: u32,
    pub max_workload: u32,
    #[serde(default)]
    pub rating: f32,
    #[serde(default)]
    pub completed_reviews: u32,
    #[serde(default)]
    pub agency: String,
}

impl Evaluator {
    pub fn is_over_capacity(&self) -> bool {
        self.current_workload >= self.max_workload
    }
}

/// An evaluator offered for selection, with the capacity signals a caller
/// should warn on.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(flatten)]
    pub evaluator: Evaluator,
    pub over_capacity: bool,
    pub selected: bool,
}

/// Evaluators chosen to review a proposal. Replaced whole on re-forward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub proposal_id: String,
    pub department: String,
    /// Ordered and free of duplicates.
    pub evaluator_ids: Vec<String>,
    pub deadline: DateTime<Utc>,
    pub assigned_at: DateTime<Utc>,
}
