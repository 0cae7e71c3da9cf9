use serde::Serialize;
use serde_json::{Value, json};

use crate::models::decision::{Decision, DecisionOutcome};

/// One audit-trail line. The durable trail is the decision history itself;
/// this is the operator-facing log of it.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub action: String,
    pub actor_id: String,
    pub target_type: &'static str,
    pub target_id: String,
    pub details: Value,
}

impl AuditEntry {
    pub fn from_decision(decision: &Decision) -> Self {
        let mut details = json!({
            "decision_id": decision.id,
            "from_status": decision.from_status,
            "to_status": decision.to_status,
            "reviewer_role": decision.reviewer_role,
            "attachments": decision.attachments.len(),
            "summary": summary(decision),
        });
        if let DecisionOutcome::Forward { evaluator_ids, department, .. } = &decision.outcome {
            details["department"] = json!(department);
            details["evaluator_ids"] = json!(evaluator_ids);
        }
        if let Some(deadline) = decision.outcome.deadline() {
            details["deadline"] = json!(deadline);
        }
        AuditEntry {
            action: format!("proposal.{}", decision.kind()),
            actor_id: decision.reviewer_id.clone(),
            target_type: "proposal",
            target_id: decision.proposal_id.clone(),
            details,
        }
    }
}

fn summary(decision: &Decision) -> String {
    format!(
        "{} {} moved {} from {} to {}",
        decision.reviewer_role, decision.reviewer_id, decision.proposal_id, decision.from_status, decision.to_status
    )
}

/// Emit an audit line for a committed decision under log target `audit`.
pub fn log_decision(decision: &Decision) {
    let entry = AuditEntry::from_decision(decision);
    match serde_json::to_string(&entry) {
        Ok(line) => log::info!(target: "audit", "{line}"),
        Err(e) => log::error!(target: "audit", "Failed to serialize audit entry for {}: {e}", entry.target_id),
    }
}
