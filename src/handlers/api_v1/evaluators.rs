use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::session::Actor;
use crate::auth::validate::validate_required;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DepartmentQuery {
    pub department: String,
}

/// GET /api/v1/evaluators?department=D - Assignment candidates with capacity flags
pub async fn list(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    query: web::Query<DepartmentQuery>,
) -> Result<HttpResponse, AppError> {
    if let Some(msg) = validate_required(&query.department, "department", 128) {
        return Err(AppError::Validation(msg));
    }
    let candidates = state
        .engine
        .evaluator_candidates(&actor, query.department.trim())
        .await?;
    Ok(HttpResponse::Ok().json(candidates))
}
