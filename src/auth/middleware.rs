use actix_web::{
    Error, HttpMessage, HttpResponse, ResponseError,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web,
};

use crate::auth::session::Actor;
use crate::auth::validate::validate_identifier;
use crate::errors::AppError;
use crate::state::AppState;

/// Header carrying the already-authenticated caller id.
pub const ACTOR_HEADER: &str = "X-Actor-Id";

/// Middleware that resolves the caller into an [`Actor`] stored in the
/// request extensions. Rejects with 401 when no usable id is present.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let actor_id = req
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| validate_identifier(v, ACTOR_HEADER).is_none());

    let Some(actor_id) = actor_id else {
        let response = AppError::Unauthenticated.error_response();
        return Ok(req.into_response(response).map_into_right_body());
    };

    let roles = match req.app_data::<web::Data<AppState>>() {
        Some(state) => state.roles.roles_for(&actor_id).await,
        None => Err(AppError::Internal("AppState not registered".to_string())),
    };
    let roles = match roles {
        Ok(roles) => roles,
        Err(e) => {
            let response: HttpResponse = e.error_response();
            return Ok(req.into_response(response).map_into_right_body());
        }
    };

    req.extensions_mut().insert(Actor { id: actor_id, roles });
    next.call(req).await.map(|res| res.map_into_left_body())
}
