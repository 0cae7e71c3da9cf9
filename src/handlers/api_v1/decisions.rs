use actix_web::{web, HttpResponse};

use crate::auth::session::Actor;
use crate::errors::AppError;
use crate::models::decision::{DecisionRequest, DecisionSubmission};
use crate::state::AppState;

/// POST /api/v1/decisions - Validate and commit a decision
pub async fn submit(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    body: web::Json<DecisionSubmission>,
) -> Result<HttpResponse, AppError> {
    let request = DecisionRequest::try_from(body.into_inner())?;
    let receipt = state.engine.submit_decision(&actor, request).await?;
    Ok(HttpResponse::Created().json(receipt))
}
