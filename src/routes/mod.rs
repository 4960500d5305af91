// Route exports
pub mod auth;
pub mod care;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::error::{CareError, ErrorKind};
use crate::models::ErrorResponse;
use crate::services::CareService;

pub use auth::{issue_token, AuthConfig};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub service: CareService,
}

/// Errors returned by HTTP handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Care(#[from] CareError),

    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::InvalidPayload(errors.to_string())
    }
}

impl ApiError {
    fn label(&self) -> &'static str {
        match self {
            ApiError::Care(e) => e.kind().as_str(),
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidPayload(_) => "validation",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Care(e) => match e.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                ErrorKind::Authorization => StatusCode::FORBIDDEN,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage details stay in the logs
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Request failed: {}", self);
            "internal storage failure".to_string()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.label().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError::InvalidPayload(format!("Invalid JSON: {err}")).into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidPayload(format!("Invalid query: {err}")).into()
}

/// Handle malformed path segments such as non-UUID booking ids
pub fn handle_path_error(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidPayload(format!("Invalid path: {err}")).into()
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(care::configure),
    );
}
