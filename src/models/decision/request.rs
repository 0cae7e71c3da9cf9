use serde::Deserialize;
use std::collections::HashSet;

use crate::auth::validate::{validate_identifier, validate_optional, validate_required};
use crate::errors::AppError;
use crate::models::comments::{CommentsInput, SectionKey};
use super::deadline::DurationDays;
use super::types::*;

const MAX_RESPONSE_CHARS: usize = 2000;
const MAX_REF_CHARS: usize = 1024;

/// JSON body of `POST /api/v1/decisions`, before validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionSubmission {
    pub proposal_id: String,
    pub decision_kind: DecisionKind,
    pub comments: Option<CommentsInput>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    pub duration_days: Option<u32>,
    pub department: Option<String>,
    pub evaluator_ids: Option<Vec<String>>,
    pub proponent_visibility: Option<ProponentVisibility>,
    pub document_ref: Option<String>,
    pub response: Option<String>,
}

/// A decision request whose envelope (proposal id, kind, attachments) has
/// been checked. Kind-specific fields are checked by [`DecisionRequest::payload`]
/// once the engine knows the edge exists and the actor may take it.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionRequest {
    pub proposal_id: String,
    pub attachments: Vec<Attachment>,
    kind: DecisionKind,
    fields: DecisionFields,
}

#[derive(Debug, Clone, PartialEq)]
struct DecisionFields {
    comments: Option<CommentsInput>,
    duration_days: Option<u32>,
    department: Option<String>,
    evaluator_ids: Option<Vec<String>>,
    proponent_visibility: Option<ProponentVisibility>,
    document_ref: Option<String>,
    response: Option<String>,
}

/// Validated kind-specific content. Each variant carries only what its
/// kind uses.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionPayload {
    Forward {
        department: String,
        evaluator_ids: Vec<String>,
        duration: DurationDays,
        visibility: ProponentVisibility,
        comments: Option<CommentsInput>,
    },
    /// `duration` is mandatory for staff, defaulted for evaluators.
    RequestRevision {
        duration: Option<DurationDays>,
        comments: CommentsInput,
    },
    Reject {
        comments: CommentsInput,
    },
    Approve {
        comments: CommentsInput,
    },
    Resubmit {
        document_ref: Option<String>,
        response: Option<String>,
    },
}

impl DecisionRequest {
    pub fn kind(&self) -> DecisionKind {
        self.kind
    }

    /// Check the fields `kind` needs and build its payload.
    pub fn payload(&self) -> Result<DecisionPayload, AppError> {
        let kind = self.kind;
        let f = self.fields.clone();
        let duration = f.duration_days.map(DurationDays::try_from).transpose()?;

        let payload = match kind {
            DecisionKind::Forward => {
                let department = required(f.department, "department", kind)?;
                check(validate_required(&department, "department", 128))?;
                let evaluator_ids = f.evaluator_ids.unwrap_or_default();
                for id in &evaluator_ids {
                    check(validate_identifier(id, "Evaluator id"))?;
                }
                DecisionPayload::Forward {
                    department: department.trim().to_string(),
                    evaluator_ids,
                    duration: required(duration, "durationDays", kind)?,
                    visibility: required(f.proponent_visibility, "proponentVisibility", kind)?,
                    comments: f.comments,
                }
            }
            DecisionKind::RequestRevision => DecisionPayload::RequestRevision {
                duration,
                comments: f.comments.unwrap_or_default(),
            },
            DecisionKind::Reject => DecisionPayload::Reject {
                comments: f.comments.unwrap_or_default(),
            },
            DecisionKind::Approve => DecisionPayload::Approve {
                comments: f.comments.unwrap_or_default(),
            },
            DecisionKind::Resubmit => {
                let response = resubmit_response(f.response, f.comments)?;
                if let Some(r) = &response {
                    check(validate_optional(r, "Revision response", MAX_RESPONSE_CHARS))?;
                }
                if let Some(d) = &f.document_ref {
                    check(validate_required(d, "documentRef", MAX_REF_CHARS))?;
                }
                DecisionPayload::Resubmit {
                    document_ref: f.document_ref,
                    response,
                }
            }
        };
        Ok(payload)
    }
}

fn required<T>(value: Option<T>, field: &str, kind: DecisionKind) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::Validation(format!("{field} is required for '{kind}' decisions")))
}

fn check(msg: Option<String>) -> Result<(), AppError> {
    match msg {
        Some(m) => Err(AppError::Validation(m)),
        None => Ok(()),
    }
}

fn check_attachments(attachments: &[Attachment]) -> Result<(), AppError> {
    let mut seen = HashSet::new();
    for a in attachments {
        check(validate_required(&a.id, "Attachment id", 128))?;
        check(validate_required(&a.name, "Attachment name", 256))?;
        if !seen.insert(a.id.as_str()) {
            return Err(AppError::Validation(format!("Duplicate attachment id '{}'", a.id)));
        }
    }
    Ok(())
}

/// A resubmission carries one free-text response, given either as
/// `response` or as `comments.overall`.
fn resubmit_response(response: Option<String>, comments: Option<CommentsInput>) -> Result<Option<String>, AppError> {
    let Some(comments) = comments else {
        return Ok(response);
    };
    let has_sections = SectionKey::ALL
        .into_iter()
        .filter(|k| !matches!(k, SectionKey::Overall))
        .any(|k| comments.get(k).is_some());
    if has_sections || !comments.additional.is_empty() {
        return Err(AppError::Validation(
            "A resubmission only takes a response; review sections are not accepted".to_string(),
        ));
    }
    match (response, comments.overall) {
        (Some(_), Some(_)) => Err(AppError::Validation(
            "Give the revision response either as response or as comments.overall".to_string(),
        )),
        (response, overall) => Ok(response.or(overall)),
    }
}

impl TryFrom<DecisionSubmission> for DecisionRequest {
    type Error = AppError;

    fn try_from(sub: DecisionSubmission) -> Result<Self, Self::Error> {
        check(validate_identifier(&sub.proposal_id, "proposalId"))?;
        check_attachments(&sub.attachments)?;

        Ok(DecisionRequest {
            proposal_id: sub.proposal_id,
            attachments: sub.attachments,
            kind: sub.decision_kind,
            fields: DecisionFields {
                comments: sub.comments,
                duration_days: sub.duration_days,
                department: sub.department,
                evaluator_ids: sub.evaluator_ids,
                proponent_visibility: sub.proponent_visibility,
                document_ref: sub.document_ref,
                response: sub.response,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(json: serde_json::Value) -> DecisionSubmission {
        serde_json::from_value(json).unwrap()
    }

    fn payload(json: serde_json::Value) -> Result<DecisionPayload, AppError> {
        DecisionRequest::try_from(submission(json))?.payload()
    }

    #[test]
    fn forward_parses_all_fields() {
        let req = DecisionRequest::try_from(submission(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "forward",
            "department": "CCS",
            "evaluatorIds": ["E-1", "E-3"],
            "durationDays": 14,
            "proponentVisibility": "both"
        })))
        .unwrap();
        assert_eq!(req.kind(), DecisionKind::Forward);
        match req.payload().unwrap() {
            DecisionPayload::Forward { department, evaluator_ids, duration, visibility, .. } => {
                assert_eq!(department, "CCS");
                assert_eq!(evaluator_ids, ["E-1", "E-3"]);
                assert_eq!(duration, DurationDays::Days14);
                assert_eq!(visibility, ProponentVisibility::Both);
            }
            other => panic!("unexpected payload {other:?}"),
        }
    }

    #[test]
    fn envelope_accepts_incomplete_kind_fields() {
        let req = DecisionRequest::try_from(submission(serde_json::json!({
            "proposalId": "P-404",
            "decisionKind": "forward",
            "durationDays": 10
        })))
        .unwrap();
        assert_eq!(req.proposal_id, "P-404");
        assert!(matches!(req.payload(), Err(AppError::Validation(_))));
    }

    #[test]
    fn forward_without_duration_is_validation_error() {
        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "forward",
            "department": "CCS",
            "evaluatorIds": ["E-1"],
            "proponentVisibility": "name"
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("durationDays")));
    }

    #[test]
    fn forward_without_visibility_is_validation_error() {
        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "forward",
            "department": "CCS",
            "evaluatorIds": ["E-1"],
            "durationDays": 7
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("proponentVisibility")));
    }

    #[test]
    fn unlisted_duration_is_rejected_for_any_kind() {
        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "request_revision",
            "durationDays": 10
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn duplicate_attachment_ids_are_rejected() {
        let attachment = serde_json::json!({
            "id": "A-1", "name": "review.pdf", "uploadedBy": "S-1",
            "uploadedAt": "2025-01-01T00:00:00Z", "mediaType": "application/pdf", "size": 1024
        });
        let err = DecisionRequest::try_from(submission(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "reject",
            "attachments": [attachment.clone(), attachment]
        })))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m.contains("Duplicate")));
    }

    #[test]
    fn resubmit_takes_overall_or_response() {
        let from_overall = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "resubmit",
            "documentRef": "s3://bucket/P-1/v2.pdf",
            "comments": {"overall": "Budget revised"}
        }))
        .unwrap();
        assert_eq!(
            from_overall,
            DecisionPayload::Resubmit {
                document_ref: Some("s3://bucket/P-1/v2.pdf".into()),
                response: Some("Budget revised".into()),
            }
        );

        let from_response = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "resubmit",
            "response": "Timeline extended"
        }))
        .unwrap();
        assert_eq!(
            from_response,
            DecisionPayload::Resubmit { document_ref: None, response: Some("Timeline extended".into()) }
        );
    }

    #[test]
    fn resubmit_rejects_review_sections() {
        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "resubmit",
            "comments": {"overall": "Done", "budget": "Cut travel"}
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "resubmit",
            "comments": {"additional": [{"title": "Notes", "content": "x"}]}
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = payload(serde_json::json!({
            "proposalId": "P-1",
            "decisionKind": "resubmit",
            "response": "One",
            "comments": {"overall": "Two"}
        }))
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
