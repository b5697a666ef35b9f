use actix_web::{HttpResponse, ResponseError};
use tracing::{error, warn};

use crate::api::validation::ErrorResponse;
use crate::db::StoreError;
use crate::matching::{InconsistentDecision, SwipeError};

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Malformed input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// Like after dislike, or the reverse
    #[error("Inconsistent decision: {0}")]
    InconsistentDecision(InconsistentDecision),

    /// A record points at a user or job that does not exist
    #[error("Referential error: {0}")]
    Referential(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::Validation(errors.to_string())
    }
}

impl From<SwipeError> for ServiceError {
    fn from(err: SwipeError) -> Self {
        match err {
            SwipeError::Inconsistent(inner) => ServiceError::InconsistentDecision(inner),
            other => ServiceError::Referential(other.to_string()),
        }
    }
}

impl ResponseError for ServiceError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ServiceError::Store(e) => {
                error!("Store error: {}", e);
                HttpResponse::InternalServerError().json(ErrorResponse {
                    error: "Failed to process request".to_string(),
                    fields: serde_json::json!({"message": "Database error occurred"}),
                })
            }
            ServiceError::Validation(msg) => {
                warn!("Validation error: {}", msg);
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: "Validation failed".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::InconsistentDecision(e) => {
                warn!("Inconsistent decision: {}", e);
                HttpResponse::Conflict().json(ErrorResponse {
                    error: "Inconsistent decision".to_string(),
                    fields: serde_json::json!({
                        "actor": e.actor,
                        "target": e.target,
                        "existing": e.existing,
                    }),
                })
            }
            ServiceError::Referential(msg) => {
                warn!("Referential error: {}", msg);
                HttpResponse::UnprocessableEntity().json(ErrorResponse {
                    error: "Unknown reference".to_string(),
                    fields: serde_json::json!({"message": msg}),
                })
            }
            ServiceError::NotFound(what) => {
                warn!("Not found: {}", what);
                HttpResponse::NotFound().json(ErrorResponse {
                    error: "Not found".to_string(),
                    fields: serde_json::json!({"message": format!("{} not found", what)}),
                })
            }
        }
    }
}
