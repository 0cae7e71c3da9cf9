use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::models::evaluator::Assignment;

/// Lifecycle status of a proposal. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    SentToEvaluators,
    RevisionRequired,
    RevisedProposal,
    RejectedProposal,
    Approved,
}

impl Status {
    pub const ALL: [Status; 6] = [
        Status::Pending,
        Status::SentToEvaluators,
        Status::RevisionRequired,
        Status::RevisedProposal,
        Status::RejectedProposal,
        Status::Approved,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::SentToEvaluators => "sent_to_evaluators",
            Status::RevisionRequired => "revision_required",
            Status::RevisedProposal => "revised_proposal",
            Status::RejectedProposal => "rejected_proposal",
            Status::Approved => "approved",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Approved | Status::RejectedProposal)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Unknown proposal status '{s}'"))
    }
}

/// Identity of the proponent who submitted a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub id: String,
    pub name: String,
    pub agency: String,
}

/// A proposal record as held by the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub submitter: Submitter,
    pub department: String,
    pub submitted_at: DateTime<Utc>,
    pub status: Status,
    pub assignment: Option<Assignment>,
    pub document_ref: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    /// Optimistic-concurrency stamp, bumped by every committed decision.
    pub version: i64,
}

impl Proposal {
    pub fn is_assigned_to(&self, evaluator_id: &str) -> bool {
        self.assignment
            .as_ref()
            .is_some_and(|a| a.evaluator_ids.iter().any(|id| id == evaluator_id))
    }
}

/// Input for registering a new proposal.
#[derive(Debug, Clone)]
pub struct NewProposal {
    pub title: String,
    pub submitter: Submitter,
    pub department: String,
    pub submitted_at: DateTime<Utc>,
    pub document_ref: Option<String>,
}

/// JSON body of `POST /api/v1/proposals`. The submitter id comes from the actor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalForm {
    pub title: String,
    pub department: String,
    pub proponent_name: String,
    #[serde(default)]
    pub agency: String,
    pub document_ref: Option<String>,
}

/// Registry list filter. `None` fields match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalFilter {
    pub status: Option<Status>,
    pub submitter: Option<String>,
    pub department: Option<String>,
}

impl ProposalFilter {
    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.status.is_none_or(|s| proposal.status == s)
            && self.submitter.as_deref().is_none_or(|s| proposal.submitter.id == s)
            && self.department.as_deref().is_none_or(|d| proposal.department == d)
    }
}

/// Proposal as returned to a reader. Identity fields are optional because the
/// redactor may strip them for evaluators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalView {
    pub id: String,
    pub title: String,
    pub submitter_id: Option<String>,
    pub proponent_name: Option<String>,
    pub proponent_agency: Option<String>,
    pub department: String,
    pub submitted_at: DateTime<Utc>,
    pub status: Status,
    pub evaluator_ids: Vec<String>,
    pub document_ref: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl From<&Proposal> for ProposalView {
    fn from(p: &Proposal) -> Self {
        ProposalView {
            id: p.id.clone(),
            title: p.title.clone(),
            submitter_id: Some(p.submitter.id.clone()),
            proponent_name: Some(p.submitter.name.clone()),
            proponent_agency: Some(p.submitter.agency.clone()),
            department: p.department.clone(),
            submitted_at: p.submitted_at,
            status: p.status,
            evaluator_ids: p
                .assignment
                .as_ref()
                .map(|a| a.evaluator_ids.clone())
                .unwrap_or_default(),
            document_ref: p.document_ref.clone(),
            deadline: p.deadline,
        }
    }
}
