use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::decision::Decision;
use super::types::*;
use super::{DecisionCommit, ProposalRegistry, apply_to};

#[derive(Default)]
struct Inner {
    proposals: Vec<Proposal>,
    history: HashMap<String, Vec<Decision>>,
    next_id: u64,
}

/// Registry held in process memory. Used when no database is configured and
/// by the integration tests.
#[derive(Default)]
pub struct MemoryRegistry {
    inner: RwLock<Inner>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProposalRegistry for MemoryRegistry {
    async fn get(&self, id: &str) -> Result<Option<Proposal>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.proposals.iter().find(|p| p.id == id).cloned())
    }

    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .proposals
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewProposal) -> Result<Proposal, AppError> {
        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let proposal = Proposal {
            id: format!("P-{}", inner.next_id),
            title: new.title,
            submitter: new.submitter,
            department: new.department,
            submitted_at: new.submitted_at,
            status: Status::Pending,
            assignment: None,
            document_ref: new.document_ref,
            deadline: None,
            version: 1,
        };
        inner.proposals.push(proposal.clone());
        Ok(proposal)
    }

    async fn apply_decision(&self, commit: DecisionCommit<'_>) -> Result<Proposal, AppError> {
        let mut inner = self.inner.write().await;
        let id = commit.decision.proposal_id.as_str();
        let proposal = inner
            .proposals
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Proposal {id} not found")))?;
        if proposal.version != commit.expected_version {
            return Err(AppError::Conflict(format!(
                "Proposal {id} changed (version {} != {})",
                proposal.version, commit.expected_version
            )));
        }
        apply_to(proposal, &commit);
        let updated = proposal.clone();
        inner
            .history
            .entry(id.to_string())
            .or_default()
            .push(commit.decision.clone());
        Ok(updated)
    }

    async fn history(&self, id: &str) -> Result<Vec<Decision>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.history.get(id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Role;
    use crate::models::decision::DecisionOutcome;
    use chrono::{TimeZone, Utc};

    fn new_proposal() -> NewProposal {
        NewProposal {
            title: "Soil microbiome survey".into(),
            submitter: Submitter { id: "U-1".into(), name: "Ana Cruz".into(), agency: "DOST".into() },
            department: "CCS".into(),
            submitted_at: Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap(),
            document_ref: None,
        }
    }

    fn resubmit(proposal_id: &str) -> Decision {
        Decision {
            id: "D-1".into(),
            proposal_id: proposal_id.into(),
            from_status: Status::Pending,
            to_status: Status::RevisedProposal,
            reviewer_id: "U-1".into(),
            reviewer_role: Role::Proponent,
            reviewed_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            attachments: vec![],
            outcome: DecisionOutcome::Resubmit { document_ref: Some("s3://v2".into()), response: None },
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let reg = MemoryRegistry::new();
        let a = reg.create(new_proposal()).await.unwrap();
        let b = reg.create(new_proposal()).await.unwrap();
        assert_eq!((a.id.as_str(), b.id.as_str()), ("P-1", "P-2"));
        assert_eq!(a.status, Status::Pending);
        assert_eq!(a.version, 1);
    }

    #[tokio::test]
    async fn stale_version_is_conflict_and_changes_nothing() {
        let reg = MemoryRegistry::new();
        let p = reg.create(new_proposal()).await.unwrap();
        let decision = resubmit(&p.id);

        let err = reg
            .apply_decision(DecisionCommit { expected_version: 7, decision: &decision, assignment: None })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(reg.history(&p.id).await.unwrap().is_empty());

        let updated = reg
            .apply_decision(DecisionCommit { expected_version: 1, decision: &decision, assignment: None })
            .await
            .unwrap();
        assert_eq!(updated.version, 2);
        assert_eq!(updated.document_ref.as_deref(), Some("s3://v2"));
        assert_eq!(reg.history(&p.id).await.unwrap().len(), 1);
    }
}
