use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::session::Actor;
use crate::errors::AppError;
use crate::models::proposal::{ProposalFilter, ProposalForm, ProposalView, Status};
use crate::state::AppState;
use super::PageParams;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<Status>,
    pub submitter: Option<String>,
    pub department: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// GET /api/v1/proposals - List proposals visible to the caller.
/// Query params: status, submitter, department (filters), page (default 1), per_page (default 25).
pub async fn list(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();
    let filter = ProposalFilter {
        status: query.status,
        submitter: query.submitter,
        department: query.department,
    };
    let paging = PageParams { page: query.page, per_page: query.per_page };
    let views = state.engine.list_proposals(&actor, &filter).await?;
    Ok(HttpResponse::Ok().json(paging.paginate(views)))
}

/// POST /api/v1/proposals - Submit a new proposal as the calling proponent
pub async fn create(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    body: web::Json<ProposalForm>,
) -> Result<HttpResponse, AppError> {
    let proposal = state.engine.create_proposal(&actor, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ProposalView::from(&proposal)))
}

/// GET /api/v1/proposals/{id}
pub async fn read(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let view = state.engine.read_proposal(&actor, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// GET /api/v1/proposals/{id}/decisions - Decision history, oldest first
pub async fn history(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let decisions = state.engine.history(&actor, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(decisions))
}

/// GET /api/v1/proposals/{id}/transitions
pub async fn transitions(
    state: web::Data<AppState>,
    actor: web::ReqData<Actor>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let available = state.engine.available_transitions(&actor, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(available))
}
