use serde::Serialize;

use crate::auth::session::{Role, Roles};
use crate::models::decision::DecisionKind;
use crate::models::proposal::Status;

/// Who may take an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorClass {
    /// Staff or admin.
    Staff,
    /// An evaluator on the proposal's assignment.
    Evaluator,
    /// The proposal's submitter.
    Proponent,
}

impl ActorClass {
    /// The role under which `roles` may take an edge of this class, if any.
    pub fn permitted_role(&self, roles: &Roles) -> Option<Role> {
        match self {
            ActorClass::Staff if roles.has(Role::Staff) => Some(Role::Staff),
            ActorClass::Staff if roles.has(Role::Admin) => Some(Role::Admin),
            ActorClass::Evaluator if roles.has(Role::Evaluator) => Some(Role::Evaluator),
            ActorClass::Proponent if roles.has(Role::Proponent) => Some(Role::Proponent),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActorClass::Staff => "staff",
            ActorClass::Evaluator => "evaluator",
            ActorClass::Proponent => "proponent",
        }
    }
}

/// One edge of the proposal state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: Status,
    pub kind: DecisionKind,
    pub to: Status,
    pub actor: ActorClass,
}

/// Information about an available transition for client rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableTransition {
    pub decision_kind: DecisionKind,
    pub to_status: Status,
    pub actor_class: ActorClass,
    pub transition_label: &'static str,
    pub requires_deadline: bool,
}
