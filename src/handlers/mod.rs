pub mod api_v1;

use actix_web::{error, web};

use crate::auth::middleware::require_auth;
use crate::errors::AppError;

/// Register extractor configs and the authenticated `/api/v1` scope.
pub fn configure_app(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(256 * 1024)
            .error_handler(|err, _req| bad_request(err.to_string())),
    )
    .app_data(web::QueryConfig::default().error_handler(|err, _req| bad_request(err.to_string())))
    .app_data(web::PathConfig::default().error_handler(|err, _req| bad_request(err.to_string())))
    .service(
        web::scope("/api/v1")
            .wrap(actix_web::middleware::from_fn(require_auth))
            .configure(api_v1::configure),
    );
}

fn bad_request(message: String) -> actix_web::Error {
    error::Error::from(AppError::Validation(message))
}
