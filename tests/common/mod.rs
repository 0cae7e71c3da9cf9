//! Shared test infrastructure for engine and HTTP tests.
//!
//! - `setup_engine()` - in-memory registry, fixed clock, recording dispatcher
//! - `setup_engine_with()` - same, with a caller-supplied dispatcher
//! - `test_state()` - `AppState` over the same fixture for `actix_web::test`

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use proposal_review::auth::session::{Actor, Role, StaticRoleDirectory};
use proposal_review::clock::FixedClock;
use proposal_review::engine::DecisionEngine;
use proposal_review::errors::AppError;
use proposal_review::models::decision::{DecisionRequest, DecisionSubmission};
use proposal_review::models::evaluator::{Availability, Evaluator, StaticDirectory};
use proposal_review::models::proposal::{MemoryRegistry, Proposal, ProposalForm, ProposalRegistry};
use proposal_review::notify::{DomainEvent, NotificationDispatcher};
use proposal_review::state::AppState;

// ============================================================================
// TEST CONSTANTS
// ============================================================================

pub const STAFF: &str = "S-1";
pub const ADMIN: &str = "A-1";
pub const PROPONENT: &str = "U-1";
pub const OTHER_PROPONENT: &str = "U-2";

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
}

// ============================================================================
// DISPATCHERS
// ============================================================================

/// Keeps every enqueued event.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub events: Mutex<Vec<DomainEvent>>,
}

impl RecordingDispatcher {
    pub fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl NotificationDispatcher for RecordingDispatcher {
    fn enqueue(&self, event: DomainEvent) -> Result<(), AppError> {
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}

/// Rejects every event, as a dead queue would.
pub struct FailingDispatcher;

impl NotificationDispatcher for FailingDispatcher {
    fn enqueue(&self, _event: DomainEvent) -> Result<(), AppError> {
        Err(AppError::Internal("notification queue closed".into()))
    }
}

// ============================================================================
// FIXTURE
// ============================================================================

pub struct TestEnv {
    pub engine: DecisionEngine,
    pub registry: Arc<MemoryRegistry>,
    pub clock: Arc<FixedClock>,
    pub dispatcher: Arc<RecordingDispatcher>,
}

impl TestEnv {
    pub async fn proposal(&self, id: &str) -> Proposal {
        self.registry.get(id).await.unwrap().expect("proposal exists")
    }
}

fn evaluator(id: &str, name: &str, department: &str, availability: Availability, current: u32, max: u32) -> Evaluator {
    Evaluator {
        id: id.into(),
        name: name.into(),
        department: department.into(),
        specialties: BTreeSet::from(["research".to_string()]),
        availability,
        current_workload: current,
        max_workload: max,
        rating: 4.5,
        completed_reviews: 10,
        agency: "DLSU".into(),
    }
}

/// E-1..E-3 in CCS (E-2 busy, E-3 at capacity), E-4 in COE.
pub fn directory() -> StaticDirectory {
    StaticDirectory::new(vec![
        evaluator("E-1", "Dr. Maria Santos", "CCS", Availability::Available, 2, 5),
        evaluator("E-2", "Dr. Jose Reyes", "CCS", Availability::Busy, 1, 5),
        evaluator("E-3", "Dr. Ana Lim", "CCS", Availability::Available, 5, 5),
        evaluator("E-4", "Engr. Paolo Cruz", "COE", Availability::Available, 0, 4),
    ])
}

pub fn setup_engine() -> TestEnv {
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let mut env = setup_engine_with(dispatcher.clone());
    env.dispatcher = dispatcher;
    env
}

pub fn setup_engine_with(notifier: Arc<dyn NotificationDispatcher>) -> TestEnv {
    let registry = Arc::new(MemoryRegistry::new());
    let clock = Arc::new(FixedClock::new(start_time()));
    let engine = DecisionEngine::new(registry.clone(), Arc::new(directory()), notifier, clock.clone());
    TestEnv {
        engine,
        registry,
        clock,
        dispatcher: Arc::new(RecordingDispatcher::default()),
    }
}

pub fn roles() -> StaticRoleDirectory {
    StaticRoleDirectory::default()
        .with(STAFF, [Role::Staff])
        .with(ADMIN, [Role::Admin])
        .with("E-1", [Role::Evaluator])
        .with("E-2", [Role::Evaluator])
        .with("E-3", [Role::Evaluator])
        .with("E-4", [Role::Evaluator])
        .with(PROPONENT, [Role::Proponent])
        .with(OTHER_PROPONENT, [Role::Proponent])
}

pub fn test_state(env: &TestEnv) -> AppState {
    AppState {
        engine: env.engine.clone(),
        roles: Arc::new(roles()),
    }
}

// ============================================================================
// ACTORS AND REQUESTS
// ============================================================================

pub fn staff() -> Actor {
    Actor::new(STAFF, [Role::Staff])
}

pub fn admin() -> Actor {
    Actor::new(ADMIN, [Role::Admin])
}

pub fn evaluator_actor(id: &str) -> Actor {
    Actor::new(id, [Role::Evaluator])
}

pub fn proponent() -> Actor {
    Actor::new(PROPONENT, [Role::Proponent])
}

pub fn other_proponent() -> Actor {
    Actor::new(OTHER_PROPONENT, [Role::Proponent])
}

pub fn proposal_form(title: &str) -> ProposalForm {
    ProposalForm {
        title: title.into(),
        department: "CCS".into(),
        proponent_name: "Ana Cruz".into(),
        agency: "DOST-PCIEERD".into(),
        document_ref: Some("s3://proposals/v1.pdf".into()),
    }
}

/// Create a pending proposal submitted by [`PROPONENT`].
pub async fn pending_proposal(env: &TestEnv) -> Proposal {
    env.engine
        .create_proposal(&proponent(), proposal_form("Adaptive traffic signal control"))
        .await
        .expect("create proposal")
}

/// Parse and validate a decision body the way the HTTP handler does.
pub fn request(body: serde_json::Value) -> Result<DecisionRequest, AppError> {
    let submission: DecisionSubmission = serde_json::from_value(body).expect("decision body shape");
    DecisionRequest::try_from(submission)
}

pub fn forward(proposal_id: &str, evaluators: &[&str], days: u32, visibility: &str) -> DecisionRequest {
    request(serde_json::json!({
        "proposalId": proposal_id,
        "decisionKind": "forward",
        "department": "CCS",
        "evaluatorIds": evaluators,
        "durationDays": days,
        "proponentVisibility": visibility,
    }))
    .expect("valid forward")
}

/// Pending proposal forwarded to E-1 and E-3 with `visibility`.
pub async fn forwarded_proposal(env: &TestEnv, visibility: &str) -> Proposal {
    let p = pending_proposal(env).await;
    env.engine
        .submit_decision(&staff(), forward(&p.id, &["E-1", "E-3"], 14, visibility))
        .await
        .expect("forward");
    env.proposal(&p.id).await
}

/// An evaluator body for `kind` carrying an overall comment.
pub fn evaluator_decision(proposal_id: &str, kind: &str, overall: &str) -> DecisionRequest {
    request(serde_json::json!({
        "proposalId": proposal_id,
        "decisionKind": kind,
        "comments": { "overall": overall },
    }))
    .expect("valid evaluator decision")
}
