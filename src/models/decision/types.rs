use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::session::Role;
use crate::models::comments::StructuredComments;
use crate::models::proposal::Status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionKind {
    Forward,
    RequestRevision,
    Reject,
    Approve,
    Resubmit,
}

impl DecisionKind {
    pub const ALL: [DecisionKind; 5] = [
        DecisionKind::Forward,
        DecisionKind::RequestRevision,
        DecisionKind::Reject,
        DecisionKind::Approve,
        DecisionKind::Resubmit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionKind::Forward => "forward",
            DecisionKind::RequestRevision => "request_revision",
            DecisionKind::Reject => "reject",
            DecisionKind::Approve => "approve",
            DecisionKind::Resubmit => "resubmit",
        }
    }
}

impl fmt::Display for DecisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DecisionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DecisionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("Unknown decision kind '{s}'"))
    }
}

/// Which proponent identity fields evaluators may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProponentVisibility {
    Name,
    Agency,
    Both,
    None,
}

impl ProponentVisibility {
    pub fn shows_name(&self) -> bool {
        matches!(self, ProponentVisibility::Name | ProponentVisibility::Both)
    }

    pub fn shows_agency(&self) -> bool {
        matches!(self, ProponentVisibility::Agency | ProponentVisibility::Both)
    }
}

/// Reference to a file held by the external store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub id: String,
    pub name: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub media_type: String,
    pub size: u64,
}

/// Kind-specific content of a committed decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decisionKind", rename_all = "snake_case")]
pub enum DecisionOutcome {
    #[serde(rename_all = "camelCase")]
    Forward {
        department: String,
        evaluator_ids: Vec<String>,
        deadline: DateTime<Utc>,
        proponent_visibility: ProponentVisibility,
        comments: Option<StructuredComments>,
    },
    #[serde(rename_all = "camelCase")]
    RequestRevision {
        deadline: DateTime<Utc>,
        comments: StructuredComments,
    },
    Reject {
        comments: StructuredComments,
    },
    Approve {
        comments: StructuredComments,
    },
    #[serde(rename_all = "camelCase")]
    Resubmit {
        document_ref: Option<String>,
        response: Option<String>,
    },
}

impl DecisionOutcome {
    pub fn kind(&self) -> DecisionKind {
        match self {
            DecisionOutcome::Forward { .. } => DecisionKind::Forward,
            DecisionOutcome::RequestRevision { .. } => DecisionKind::RequestRevision,
            DecisionOutcome::Reject { .. } => DecisionKind::Reject,
            DecisionOutcome::Approve { .. } => DecisionKind::Approve,
            DecisionOutcome::Resubmit { .. } => DecisionKind::Resubmit,
        }
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        match self {
            DecisionOutcome::Forward { deadline, .. }
            | DecisionOutcome::RequestRevision { deadline, .. } => Some(*deadline),
            _ => None,
        }
    }

    pub fn comments(&self) -> Option<&StructuredComments> {
        match self {
            DecisionOutcome::Forward { comments, .. } => comments.as_ref(),
            DecisionOutcome::RequestRevision { comments, .. }
            | DecisionOutcome::Reject { comments }
            | DecisionOutcome::Approve { comments } => Some(comments),
            DecisionOutcome::Resubmit { .. } => None,
        }
    }

    pub fn proponent_visibility(&self) -> Option<ProponentVisibility> {
        match self {
            DecisionOutcome::Forward { proponent_visibility, .. } => Some(*proponent_visibility),
            _ => None,
        }
    }

    pub fn document_ref(&self) -> Option<&str> {
        match self {
            DecisionOutcome::Resubmit { document_ref, .. } => document_ref.as_deref(),
            _ => None,
        }
    }
}

/// Immutable record of one reviewer action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub proposal_id: String,
    pub from_status: Status,
    pub to_status: Status,
    pub reviewer_id: String,
    pub reviewer_role: Role,
    pub reviewed_at: DateTime<Utc>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(flatten)]
    pub outcome: DecisionOutcome,
}

impl Decision {
    pub fn kind(&self) -> DecisionKind {
        self.outcome.kind()
    }
}
