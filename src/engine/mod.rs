pub mod reads;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use crate::audit;
use crate::auth::session::{Actor, Role};
use crate::auth::validate::{validate_optional, validate_required};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::ids;
use crate::models::comments::{CommentComposer, CommentsInput, SectionKey, StructuredComments};
use crate::models::decision::{
    Decision, DecisionKind, DecisionOutcome, DecisionPayload, DecisionRequest, DurationDays, compute_deadline,
};
use crate::models::evaluator::{Assignment, AssignmentMatcher, EvaluatorDirectory};
use crate::models::proposal::{
    DecisionCommit, NewProposal, Proposal, ProposalForm, ProposalRegistry, Status, Submitter,
};
use crate::models::workflow::{ActorClass, Transition, find_transition};
use crate::notify::{DomainEvent, NotificationDispatcher};

/// Commit attempts before a version conflict is surfaced to the caller.
pub const MAX_COMMIT_ATTEMPTS: u32 = 3;

/// Window applied when an evaluator recommends revision without choosing one.
const EVALUATOR_REVISION_WINDOW: DurationDays = DurationDays::Days14;

/// Result of a committed decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReceipt {
    pub decision: Decision,
    pub status: Status,
    pub assignment: Option<Assignment>,
    pub capacity_warnings: Vec<String>,
}

/// The proposal state machine and its collaborators.
#[derive(Clone)]
pub struct DecisionEngine {
    registry: Arc<dyn ProposalRegistry>,
    directory: Arc<dyn EvaluatorDirectory>,
    notifier: Arc<dyn NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

/// Kind-specific output of validation, ready to commit.
struct Prepared {
    outcome: DecisionOutcome,
    assignment: Option<Assignment>,
    capacity_warnings: Vec<String>,
}

impl DecisionEngine {
    pub fn new(
        registry: Arc<dyn ProposalRegistry>,
        directory: Arc<dyn EvaluatorDirectory>,
        notifier: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        DecisionEngine { registry, directory, notifier, clock }
    }

    pub fn directory(&self) -> &dyn EvaluatorDirectory {
        self.directory.as_ref()
    }

    /// Validate and commit one decision, then log and notify.
    ///
    /// A version conflict re-reads the proposal and validates again from
    /// scratch, so a lost race usually surfaces as `InvalidTransition`.
    pub async fn submit_decision(&self, actor: &Actor, request: DecisionRequest) -> Result<DecisionReceipt, AppError> {
        let mut attempt = 1;
        let receipt = loop {
            match self.try_commit(actor, &request).await {
                Err(AppError::Conflict(msg)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    log::warn!("Decision on {} hit a conflict (attempt {attempt}): {msg}", request.proposal_id);
                    attempt += 1;
                }
                other => break other?,
            }
        };

        audit::log_decision(&receipt.decision);
        self.notify(&receipt).await;
        Ok(receipt)
    }

    async fn try_commit(&self, actor: &Actor, request: &DecisionRequest) -> Result<DecisionReceipt, AppError> {
        let proposal = self.load(&request.proposal_id).await?;
        let kind = request.kind();
        let transition = find_transition(proposal.status, kind)
            .ok_or(AppError::InvalidTransition { from: proposal.status, kind })?;
        let role = authorize(actor, &proposal, transition)?;
        let payload = request.payload()?;

        let now = self.clock.now();
        let prepared = self.prepare(actor, &proposal, transition, &payload, now).await?;

        let decision = Decision {
            id: ids::generate("D"),
            proposal_id: proposal.id.clone(),
            from_status: proposal.status,
            to_status: transition.to,
            reviewer_id: actor.id.clone(),
            reviewer_role: role,
            reviewed_at: now,
            attachments: request.attachments.clone(),
            outcome: prepared.outcome,
        };

        let updated = self
            .registry
            .apply_decision(DecisionCommit {
                expected_version: proposal.version,
                decision: &decision,
                assignment: prepared.assignment.as_ref(),
            })
            .await?;

        Ok(DecisionReceipt {
            decision,
            status: updated.status,
            assignment: updated.assignment,
            capacity_warnings: prepared.capacity_warnings,
        })
    }

    async fn prepare(
        &self,
        actor: &Actor,
        proposal: &Proposal,
        transition: &Transition,
        payload: &DecisionPayload,
        now: DateTime<Utc>,
    ) -> Result<Prepared, AppError> {
        let by_evaluator = transition.actor == ActorClass::Evaluator;
        let compose = |input: &CommentsInput| CommentComposer::from_input(&actor.id, self.clock.clone(), input);

        let (outcome, assignment, capacity_warnings) = match payload {
            DecisionPayload::Forward { department, evaluator_ids, duration, visibility, comments } => {
                let mut matcher = AssignmentMatcher::new();
                matcher.select_department(self.directory.as_ref(), department).await?;
                for id in evaluator_ids {
                    matcher.add(id)?;
                }
                let deadline = compute_deadline(now, *duration);
                let assignment = matcher.finish(&proposal.id, deadline, now)?;
                let comments = comments.as_ref().map(compose).transpose()?.map(CommentComposer::finish);
                let outcome = DecisionOutcome::Forward {
                    department: department.clone(),
                    evaluator_ids: assignment.evaluator_ids.clone(),
                    deadline,
                    proponent_visibility: *visibility,
                    comments,
                };
                (outcome, Some(assignment), matcher.capacity_warnings())
            }
            DecisionPayload::RequestRevision { duration, comments } => {
                let duration = match (duration, by_evaluator) {
                    (Some(d), _) => *d,
                    (None, true) => EVALUATOR_REVISION_WINDOW,
                    (None, false) => {
                        return Err(AppError::Validation(
                            "durationDays is required for 'request_revision' decisions".to_string(),
                        ));
                    }
                };
                let comments = compose(comments)?.finish();
                if by_evaluator {
                    require_overall(&comments)?;
                } else if comments.is_blank() {
                    return Err(AppError::Validation(
                        "A revision request needs at least one non-empty comment section".to_string(),
                    ));
                }
                let outcome = DecisionOutcome::RequestRevision { deadline: compute_deadline(now, duration), comments };
                (outcome, None, Vec::new())
            }
            DecisionPayload::Reject { comments } => {
                let mut composer = compose(comments)?;
                if by_evaluator {
                    require_overall(composer.document())?;
                } else if composer.apply_rejection_placeholder() {
                    log::debug!("Applied rejection placeholder to {}", proposal.id);
                }
                (DecisionOutcome::Reject { comments: composer.finish() }, None, Vec::new())
            }
            DecisionPayload::Approve { comments } => {
                let comments = compose(comments)?.finish();
                require_overall(&comments)?;
                (DecisionOutcome::Approve { comments }, None, Vec::new())
            }
            DecisionPayload::Resubmit { document_ref, response } => {
                let outcome = DecisionOutcome::Resubmit {
                    document_ref: document_ref.clone(),
                    response: response.clone(),
                };
                (outcome, None, Vec::new())
            }
        };

        Ok(Prepared { outcome, assignment, capacity_warnings })
    }

    /// Register a new proposal for the calling proponent.
    pub async fn create_proposal(&self, actor: &Actor, form: ProposalForm) -> Result<Proposal, AppError> {
        if !actor.roles.has(Role::Proponent) {
            return Err(AppError::Authorization("Only proponents may submit proposals".to_string()));
        }
        let checks = [
            validate_required(&form.title, "Title", 256),
            validate_required(&form.department, "Department", 128),
            validate_required(&form.proponent_name, "Proponent name", 256),
            validate_optional(&form.agency, "Agency", 256),
            form.document_ref.as_deref().and_then(|d| validate_optional(d, "documentRef", 1024)),
        ];
        if let Some(msg) = checks.into_iter().flatten().next() {
            return Err(AppError::Validation(msg));
        }

        let proposal = self
            .registry
            .create(NewProposal {
                title: form.title.trim().to_string(),
                submitter: Submitter {
                    id: actor.id.clone(),
                    name: form.proponent_name.trim().to_string(),
                    agency: form.agency.trim().to_string(),
                },
                department: form.department.trim().to_string(),
                submitted_at: self.clock.now(),
                document_ref: form.document_ref.filter(|d| !d.trim().is_empty()),
            })
            .await?;
        log::info!(target: "audit", "{} created proposal {}", actor.id, proposal.id);
        Ok(proposal)
    }

    pub(crate) async fn load(&self, id: &str) -> Result<Proposal, AppError> {
        self.registry
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Proposal {id} not found")))
    }

    async fn notify(&self, receipt: &DecisionReceipt) {
        let decision = &receipt.decision;
        let recipients = match self.recipients(decision, receipt.assignment.as_ref()).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Could not resolve recipients for {}: {e}", decision.id);
                return;
            }
        };
        let event = DomainEvent {
            event_type: event_type(decision.kind()).to_string(),
            proposal_id: decision.proposal_id.clone(),
            recipients,
            payload: json!({
                "decisionId": decision.id,
                "fromStatus": decision.from_status,
                "toStatus": decision.to_status,
                "reviewerId": decision.reviewer_id,
                "deadline": decision.outcome.deadline(),
            }),
            occurred_at: decision.reviewed_at,
        };
        if let Err(e) = self.notifier.enqueue(event) {
            log::warn!("Notification for decision {} not enqueued: {e}", decision.id);
        }
    }

    async fn recipients(&self, decision: &Decision, assignment: Option<&Assignment>) -> Result<Vec<String>, AppError> {
        match decision.kind() {
            DecisionKind::Forward => Ok(assignment.map(|a| a.evaluator_ids.clone()).unwrap_or_default()),
            DecisionKind::Resubmit => {
                let history = self.registry.history(&decision.proposal_id).await?;
                Ok(history
                    .iter()
                    .rev()
                    .find(|d| d.kind() == DecisionKind::RequestRevision)
                    .map(|d| vec![d.reviewer_id.clone()])
                    .unwrap_or_default())
            }
            _ => {
                let proposal = self.load(&decision.proposal_id).await?;
                Ok(vec![proposal.submitter.id])
            }
        }
    }
}

/// Role under which `actor` may take `transition` on `proposal`.
fn authorize(actor: &Actor, proposal: &Proposal, transition: &Transition) -> Result<Role, AppError> {
    let denied = |reason: &str| {
        AppError::Authorization(format!(
            "{} may not {} proposal {} in status {}: {reason}",
            actor.id, transition.kind, proposal.id, proposal.status
        ))
    };
    let role = transition
        .actor
        .permitted_role(&actor.roles)
        .ok_or_else(|| denied(&format!("requires the {} role", transition.actor.as_str())))?;
    match transition.actor {
        ActorClass::Evaluator if !proposal.is_assigned_to(&actor.id) => Err(denied("not assigned to this proposal")),
        ActorClass::Proponent if proposal.submitter.id != actor.id => Err(denied("not the submitter")),
        _ => Ok(role),
    }
}

fn require_overall(comments: &StructuredComments) -> Result<(), AppError> {
    if comments.section(SectionKey::Overall).is_blank() {
        return Err(AppError::Validation("An evaluator decision needs an overall comment".to_string()));
    }
    Ok(())
}

fn event_type(kind: DecisionKind) -> &'static str {
    match kind {
        DecisionKind::Forward => "proposal.forwarded",
        DecisionKind::RequestRevision => "proposal.revision_requested",
        DecisionKind::Reject => "proposal.rejected",
        DecisionKind::Approve => "proposal.approved",
        DecisionKind::Resubmit => "proposal.resubmitted",
    }
}
