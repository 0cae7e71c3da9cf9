use crate::auth::session::Roles;
use crate::models::decision::DecisionKind;
use crate::models::proposal::Status;
use super::types::*;

use ActorClass::{Evaluator, Proponent, Staff};
use DecisionKind::{Approve, Forward, Reject, RequestRevision, Resubmit};
use Status::*;

const fn edge(from: Status, kind: DecisionKind, to: Status, actor: ActorClass) -> Transition {
    Transition { from, kind, to, actor }
}

/// Every legal edge. Anything absent is an invalid transition.
pub const TRANSITIONS: &[Transition] = &[
    edge(Pending, Forward, SentToEvaluators, Staff),
    edge(Pending, RequestRevision, RevisionRequired, Staff),
    edge(Pending, Reject, RejectedProposal, Staff),
    edge(RevisedProposal, Forward, SentToEvaluators, Staff),
    edge(RevisedProposal, RequestRevision, RevisionRequired, Staff),
    edge(RevisedProposal, Reject, RejectedProposal, Staff),
    edge(SentToEvaluators, Approve, Approved, Evaluator),
    edge(SentToEvaluators, RequestRevision, RevisionRequired, Evaluator),
    edge(SentToEvaluators, Reject, RejectedProposal, Evaluator),
    edge(RevisionRequired, Resubmit, RevisedProposal, Proponent),
];

/// Look up the edge leaving `from` for `kind`.
pub fn find_transition(from: Status, kind: DecisionKind) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.from == from && t.kind == kind)
}

fn label(t: &Transition) -> &'static str {
    match (t.kind, t.actor) {
        (Forward, _) => "Forward to Evaluators",
        (RequestRevision, Evaluator) => "Recommend Revision",
        (RequestRevision, _) => "Request Revision",
        (Reject, Evaluator) => "Recommend Rejection",
        (Reject, _) => "Reject Proposal",
        (Approve, _) => "Approve Proposal",
        (Resubmit, _) => "Submit Revised Proposal",
    }
}

/// Edges from `current` whose actor class the roles satisfy.
///
/// Role membership only; assignment and ownership checks belong to the
/// engine, which knows the proposal.
pub fn find_available_transitions(current: Status, roles: &Roles) -> Vec<AvailableTransition> {
    TRANSITIONS
        .iter()
        .filter(|t| t.from == current)
        .filter(|t| t.actor.permitted_role(roles).is_some())
        .map(|t| AvailableTransition {
            decision_kind: t.kind,
            to_status: t.to,
            actor_class: t.actor,
            transition_label: label(t),
            requires_deadline: matches!(t.kind, Forward | RequestRevision),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::session::Role;

    #[test]
    fn terminal_statuses_have_no_outgoing_edges() {
        for status in Status::ALL.into_iter().filter(Status::is_terminal) {
            for kind in DecisionKind::ALL {
                assert!(find_transition(status, kind).is_none());
            }
        }
    }

    #[test]
    fn edges_are_unique_per_status_and_kind() {
        for (i, a) in TRANSITIONS.iter().enumerate() {
            for b in &TRANSITIONS[i + 1..] {
                assert!(!(a.from == b.from && a.kind == b.kind), "duplicate edge {a:?}");
            }
        }
    }

    #[test]
    fn evaluator_reject_lands_in_rejected() {
        let t = find_transition(SentToEvaluators, Reject).unwrap();
        assert_eq!(t.to, RejectedProposal);
        assert_eq!(t.actor, Evaluator);
    }

    #[test]
    fn pending_offers_staff_three_options() {
        let staff = Roles::from_iter([Role::Staff]);
        let kinds: Vec<_> = find_available_transitions(Pending, &staff)
            .into_iter()
            .map(|t| t.decision_kind)
            .collect();
        assert_eq!(kinds, [Forward, RequestRevision, Reject]);

        let evaluator = Roles::from_iter([Role::Evaluator]);
        assert!(find_available_transitions(Pending, &evaluator).is_empty());
    }

    #[test]
    fn admin_takes_staff_edges_under_admin_role() {
        let admin = Roles::from_iter([Role::Admin]);
        assert_eq!(Staff.permitted_role(&admin), Some(Role::Admin));
        assert_eq!(Evaluator.permitted_role(&admin), None);
    }
}
