use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::auth::AuthError;
use crate::engine::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),
    #[error("forbidden")]
    Forbidden,
    #[error("{message}")]
    BadRequest {
        message: String,
        errors: Vec<FieldError>,
    },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError::BadRequest {
            message: format!("{field}: {message}"),
            errors: vec![FieldError {
                field: field.to_string(),
                message,
            }],
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Engine(e) => match e {
                EngineError::NotFound { .. } => StatusCode::NOT_FOUND,
                EngineError::Validation { .. }
                | EngineError::PaymentNotConfirmed(_)
                | EngineError::PaymentMismatch { .. }
                | EngineError::NoAvailability
                | EngineError::AlreadyCancelled(_)
                | EngineError::LimitExceeded(_) => StatusCode::BAD_REQUEST,
                EngineError::Payment(_) | EngineError::Wal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Engine(EngineError::Validation { field, message }) => ErrorBody {
                message: format!("{field}: {message}"),
                errors: vec![FieldError {
                    field: field.to_string(),
                    message,
                }],
            },
            ApiError::Engine(EngineError::NotFound { entity, .. }) => ErrorBody {
                message: format!("{entity} not found"),
                errors: Vec::new(),
            },
            ApiError::BadRequest { message, errors } => ErrorBody { message, errors },
            ApiError::Unauthorized(_) => ErrorBody {
                message: "Unauthorized".into(),
                errors: Vec::new(),
            },
            other if status.is_server_error() => {
                tracing::error!("request failed: {other}");
                ErrorBody {
                    message: "Something went wrong".into(),
                    errors: Vec::new(),
                }
            }
            other => ErrorBody {
                message: other.to_string(),
                errors: Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}
