pub mod memory;
pub mod queries;
pub mod redact;
pub mod types;

pub use memory::MemoryRegistry;
pub use queries::PgRegistry;
pub use types::*;

use async_trait::async_trait;

use crate::errors::AppError;
use crate::models::decision::Decision;
use crate::models::evaluator::Assignment;

/// Everything [`ProposalRegistry::apply_decision`] writes in one atomic step.
#[derive(Debug, Clone, Copy)]
pub struct DecisionCommit<'a> {
    /// Version the engine validated against. A mismatch is `Conflict`.
    pub expected_version: i64,
    pub decision: &'a Decision,
    /// Replaces the current assignment when present (forward only).
    pub assignment: Option<&'a Assignment>,
}

/// Durable store of proposals and their decision history. No business rules;
/// `apply_decision` is the only mutation of an existing proposal.
#[async_trait]
pub trait ProposalRegistry: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Proposal>, AppError>;

    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, AppError>;

    /// Register a new proposal in `pending` with version 1.
    async fn create(&self, proposal: NewProposal) -> Result<Proposal, AppError>;

    /// Append the decision, move the status, update deadline, document and
    /// assignment, and bump the version. All or nothing.
    async fn apply_decision(&self, commit: DecisionCommit<'_>) -> Result<Proposal, AppError>;

    /// Decisions for a proposal, oldest first.
    async fn history(&self, id: &str) -> Result<Vec<Decision>, AppError>;
}

/// Apply a commit to an in-hand proposal record. Shared by the backends so
/// they agree on which fields a decision touches.
pub(crate) fn apply_to(proposal: &mut Proposal, commit: &DecisionCommit<'_>) {
    let outcome = &commit.decision.outcome;
    proposal.status = commit.decision.to_status;
    proposal.deadline = outcome.deadline();
    if let Some(doc) = outcome.document_ref() {
        proposal.document_ref = Some(doc.to_string());
    }
    if let Some(assignment) = commit.assignment {
        proposal.assignment = Some(assignment.clone());
    }
    proposal.version += 1;
}
