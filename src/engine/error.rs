use thiserror::Error;
use ulid::Ulid;

use crate::payment::PaymentError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: Ulid },
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },
    #[error("payment {0} has not succeeded")]
    PaymentNotConfirmed(String),
    #[error("payment {intent} does not cover this booking: {reason}")]
    PaymentMismatch {
        intent: String,
        reason: &'static str,
    },
    #[error("no available room numbers for the selected dates")]
    NoAvailability,
    #[error("booking {0} has already been cancelled")]
    AlreadyCancelled(Ulid),
    #[error("limit exceeded: {0}")]
    LimitExceeded(&'static str),
    #[error("payment gateway: {0}")]
    Payment(#[from] PaymentError),
    #[error("WAL error: {0}")]
    Wal(String),
}

impl EngineError {
    pub fn not_found(entity: &'static str, id: Ulid) -> Self {
        EngineError::NotFound { entity, id }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field,
            message: message.into(),
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::NotFound { .. } => "not_found",
            EngineError::Validation { .. } => "validation",
            EngineError::PaymentNotConfirmed(_) => "payment_not_confirmed",
            EngineError::PaymentMismatch { .. } => "payment_mismatch",
            EngineError::NoAvailability => "no_availability",
            EngineError::AlreadyCancelled(_) => "already_cancelled",
            EngineError::LimitExceeded(_) => "limit_exceeded",
            EngineError::Payment(_) => "payment_gateway",
            EngineError::Wal(_) => "wal",
        }
    }
}
