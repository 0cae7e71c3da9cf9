use crate::auth::session::{Actor, Role};
use crate::errors::AppError;
use crate::models::decision::Decision;
use crate::models::evaluator::{AssignmentMatcher, Candidate};
use crate::models::proposal::redact::{redact_for_evaluator, visibility_policy};
use crate::models::proposal::{Proposal, ProposalFilter, ProposalView};
use crate::models::workflow::{ActorClass, AvailableTransition, find_available_transitions};
use super::DecisionEngine;

/// How a given actor relates to a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Full,
    Redacted,
    Denied,
}

fn access(actor: &Actor, proposal: &Proposal) -> Access {
    if actor.roles.is_staff() || proposal.submitter.id == actor.id {
        Access::Full
    } else if actor.roles.has(Role::Evaluator) && proposal.is_assigned_to(&actor.id) {
        Access::Redacted
    } else {
        Access::Denied
    }
}

impl DecisionEngine {
    async fn view_for(&self, actor: &Actor, proposal: &Proposal) -> Result<Option<ProposalView>, AppError> {
        match access(actor, proposal) {
            Access::Full => Ok(Some(ProposalView::from(proposal))),
            Access::Redacted => {
                let history = self.registry.history(&proposal.id).await?;
                let policy = visibility_policy(&history);
                Ok(Some(redact_for_evaluator(ProposalView::from(proposal), policy)))
            }
            Access::Denied => Ok(None),
        }
    }

    /// Read one proposal. Assigned evaluators get the redacted view.
    pub async fn read_proposal(&self, actor: &Actor, id: &str) -> Result<ProposalView, AppError> {
        let proposal = self.load(id).await?;
        self.view_for(actor, &proposal)
            .await?
            .ok_or_else(|| AppError::Authorization(format!("{} may not read proposal {id}", actor.id)))
    }

    /// Proposals matching `filter` that the actor may see, oldest first.
    pub async fn list_proposals(&self, actor: &Actor, filter: &ProposalFilter) -> Result<Vec<ProposalView>, AppError> {
        let mut filter = filter.clone();
        if !actor.roles.is_staff() {
            if !actor.roles.has(Role::Evaluator) {
                filter.submitter = Some(actor.id.clone());
            } else if filter.submitter.as_deref().is_some_and(|s| s != actor.id) {
                return Err(AppError::Authorization(
                    "Evaluators may only filter proposals by their own submitter id".to_string(),
                ));
            }
        }
        let proposals = self.registry.list(&filter).await?;
        let mut views = Vec::with_capacity(proposals.len());
        for proposal in &proposals {
            if let Some(view) = self.view_for(actor, proposal).await? {
                views.push(view);
            }
        }
        Ok(views)
    }

    /// Decision history in commit order.
    pub async fn history(&self, actor: &Actor, id: &str) -> Result<Vec<Decision>, AppError> {
        let proposal = self.load(id).await?;
        if access(actor, &proposal) != Access::Full {
            return Err(AppError::Authorization(format!(
                "{} may not read the history of proposal {id}",
                actor.id
            )));
        }
        self.registry.history(id).await
    }

    /// Edges the actor could take on the proposal right now.
    pub async fn available_transitions(&self, actor: &Actor, id: &str) -> Result<Vec<AvailableTransition>, AppError> {
        let proposal = self.load(id).await?;
        if access(actor, &proposal) == Access::Denied {
            return Err(AppError::Authorization(format!(
                "{} may not view transitions of proposal {id}",
                actor.id
            )));
        }
        let edges = find_available_transitions(proposal.status, &actor.roles);
        Ok(edges
            .into_iter()
            .filter(|edge| match edge.actor_class {
                ActorClass::Evaluator => proposal.is_assigned_to(&actor.id),
                ActorClass::Proponent => proposal.submitter.id == actor.id,
                ActorClass::Staff => true,
            })
            .collect())
    }

    /// Evaluators a staff member can pick from for `department`.
    pub async fn evaluator_candidates(&self, actor: &Actor, department: &str) -> Result<Vec<Candidate>, AppError> {
        if !actor.roles.is_staff() {
            return Err(AppError::Authorization("Only staff may browse evaluators".to_string()));
        }
        let mut matcher = AssignmentMatcher::new();
        matcher.select_department(self.directory(), department).await?;
        Ok(matcher.candidates())
    }
}
