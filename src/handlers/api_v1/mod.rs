pub mod decisions;
pub mod evaluators;
pub mod proposals;

use actix_web::{
    web, Error, ResponseError,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Paginated response wrapper for list endpoints.
#[derive(Serialize, Debug)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

/// `page` / `per_page` query parameters. Defaults 1 and 25, capped at 100.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageParams {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(25).clamp(1, 100)
    }

    /// Slice one page out of a full result list.
    pub fn paginate<T: Serialize>(&self, items: Vec<T>) -> PaginatedResponse<T> {
        let (page, per_page) = (self.page(), self.per_page());
        let total = items.len() as i64;
        let offset = usize::try_from((page - 1).saturating_mul(per_page)).unwrap_or(usize::MAX);
        let items = items
            .into_iter()
            .skip(offset)
            .take(per_page as usize)
            .collect();
        PaginatedResponse { items, page, per_page, total }
    }
}

/// CSRF protection for REST API mutation endpoints.
///
/// Rejects POST/PUT/DELETE requests that don't have Content-Type: application/json.
/// GET requests are exempt.
async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();

    if method == actix_web::http::Method::POST
        || method == actix_web::http::Method::PUT
        || method == actix_web::http::Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = AppError::Validation(
                "Content-Type must be application/json for mutation requests".to_string(),
            )
            .error_response();
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// Configure API v1 routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/decisions")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::post().to(decisions::submit))
    );
    cfg.service(
        web::scope("/proposals")
            .wrap(actix_web::middleware::from_fn(require_json_content_type))
            .route("", web::get().to(proposals::list))
            .route("", web::post().to(proposals::create))
            .route("/{id}", web::get().to(proposals::read))
            .route("/{id}/decisions", web::get().to(proposals::history))
            .route("/{id}/transitions", web::get().to(proposals::transitions))
    );
    cfg.service(
        web::scope("/evaluators")
            .route("", web::get().to(evaluators::list))
    );
}
