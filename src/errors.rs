use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use std::fmt;

use crate::models::decision::DecisionKind;
use crate::models::proposal::Status;

#[derive(Debug)]
pub enum AppError {
    Db(sqlx::Error),
    Migrate(sqlx::migrate::MigrateError),
    Json(serde_json::Error),
    Config(String),
    Internal(String),
    /// A required field is missing or malformed for the requested decision kind.
    Validation(String),
    /// No edge leaves `from` for `kind`.
    InvalidTransition { from: Status, kind: DecisionKind },
    Authorization(String),
    Unauthenticated,
    /// A forward decision selected no evaluators.
    Assignment(String),
    NotFound(String),
    /// The proposal changed between read and commit.
    Conflict(String),
}

impl AppError {
    /// Machine-readable kind used in JSON error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::Authorization(_) => "authorization_error",
            AppError::Unauthenticated => "unauthenticated",
            AppError::Assignment(_) => "assignment_error",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::Db(_)
            | AppError::Migrate(_)
            | AppError::Json(_)
            | AppError::Config(_)
            | AppError::Internal(_) => "internal_error",
        }
    }

    fn is_internal(&self) -> bool {
        self.kind() == "internal_error"
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Db(e) => write!(f, "Database error: {e}"),
            AppError::Migrate(e) => write!(f, "Migration error: {e}"),
            AppError::Json(e) => write!(f, "JSON error: {e}"),
            AppError::Config(e) => write!(f, "Configuration error: {e}"),
            AppError::Internal(e) => write!(f, "Internal error: {e}"),
            AppError::Validation(e) => write!(f, "{e}"),
            AppError::InvalidTransition { from, kind } => {
                write!(f, "Decision '{}' is not allowed from status '{}'", kind.as_str(), from.as_str())
            }
            AppError::Authorization(e) => write!(f, "{e}"),
            AppError::Unauthenticated => write!(f, "Missing actor identity"),
            AppError::Assignment(e) => write!(f, "{e}"),
            AppError::NotFound(e) => write!(f, "{e}"),
            AppError::Conflict(e) => write!(f, "{e}"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidTransition { .. } | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::Assignment(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = if self.is_internal() {
            log::error!("{self}");
            "Internal Server Error".to_string()
        } else {
            self.to_string()
        };
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "kind": self.kind(),
            "message": message,
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Db(e)
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        AppError::Migrate(e)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Json(e)
    }
}
