use crate::models::decision::{Decision, ProponentVisibility};
use super::types::ProposalView;

/// Disclosure policy in force for a proposal: the one chosen by its most
/// recent forward decision. Without one nothing is disclosed.
pub fn visibility_policy(history: &[Decision]) -> ProponentVisibility {
    history
        .iter()
        .rev()
        .find_map(|d| d.outcome.proponent_visibility())
        .unwrap_or(ProponentVisibility::None)
}

/// Strip the identity fields `policy` withholds from evaluators.
pub fn redact_for_evaluator(mut view: ProposalView, policy: ProponentVisibility) -> ProposalView {
    view.submitter_id = None;
    if !policy.shows_name() {
        view.proponent_name = None;
    }
    if !policy.shows_agency() {
        view.proponent_agency = None;
    }
    view
}
