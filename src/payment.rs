//! Payment collaborator contract.
//!
//! The engine only needs two things from a payment processor: an intent for
//! an amount, and later the intent's status together with the amount and
//! metadata it was issued for. Gateway wire protocols live behind
//! [`PaymentGateway`].

use async_trait::async_trait;
use dashmap::DashMap;
use rust_decimal::Decimal;
use thiserror::Error;
use ulid::Ulid;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("unknown payment intent {0}")]
    UnknownIntent(String),
    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    RequiresConfirmation,
    Processing,
    Succeeded,
    Failed,
}

/// Context attached to an intent so the processor's dashboard can trace it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentMetadata {
    pub hotel_id: Ulid,
    pub room_type_id: Ulid,
    pub room_number_id: Ulid,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
    pub amount: Decimal,
}

/// What the processor knows about an intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentDetails {
    pub id: String,
    pub status: PaymentStatus,
    pub amount: Decimal,
    pub metadata: IntentMetadata,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, PaymentError>;

    async fn retrieve(&self, intent_id: &str) -> Result<IntentDetails, PaymentError>;

    async fn status(&self, intent_id: &str) -> Result<PaymentStatus, PaymentError> {
        Ok(self.retrieve(intent_id).await?.status)
    }
}

/// In-process gateway for tests and local runs.
///
/// Intents start as `RequiresConfirmation`; `succeed`/`fail` play the part
/// of the client confirming the card. With `auto_confirm` every intent the
/// gateway has issued reports `Succeeded`.
pub struct InMemoryPaymentGateway {
    intents: DashMap<String, IntentDetails>,
    auto_confirm: bool,
}

impl InMemoryPaymentGateway {
    pub fn new(auto_confirm: bool) -> Self {
        Self {
            intents: DashMap::new(),
            auto_confirm,
        }
    }

    /// Register an intent captured out of band.
    pub fn insert_succeeded(&self, intent_id: &str, amount: Decimal, metadata: IntentMetadata) {
        self.intents.insert(
            intent_id.to_string(),
            IntentDetails {
                id: intent_id.to_string(),
                status: PaymentStatus::Succeeded,
                amount,
                metadata,
            },
        );
    }

    pub fn succeed(&self, intent_id: &str) -> Result<(), PaymentError> {
        self.set_status(intent_id, PaymentStatus::Succeeded)
    }

    pub fn fail(&self, intent_id: &str) -> Result<(), PaymentError> {
        self.set_status(intent_id, PaymentStatus::Failed)
    }

    fn set_status(&self, intent_id: &str, status: PaymentStatus) -> Result<(), PaymentError> {
        let mut intent = self
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::UnknownIntent(intent_id.to_string()))?;
        intent.status = status;
        Ok(())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(
        &self,
        amount: Decimal,
        currency: &str,
        metadata: IntentMetadata,
    ) -> Result<PaymentIntent, PaymentError> {
        let id = format!("pi_{}", Ulid::new());
        let client_secret = format!("{id}_secret_{}", Ulid::new());
        tracing::debug!(
            hotel_id = %metadata.hotel_id,
            room_number_id = %metadata.room_number_id,
            user_id = %metadata.user_id,
            "issued intent {id} for {amount} {currency}"
        );
        self.intents.insert(
            id.clone(),
            IntentDetails {
                id: id.clone(),
                status: PaymentStatus::RequiresConfirmation,
                amount,
                metadata,
            },
        );
        Ok(PaymentIntent {
            id,
            client_secret,
            amount,
        })
    }

    async fn retrieve(&self, intent_id: &str) -> Result<IntentDetails, PaymentError> {
        let mut details = self
            .intents
            .get(intent_id)
            .map(|d| d.value().clone())
            .ok_or_else(|| PaymentError::UnknownIntent(intent_id.to_string()))?;
        if self.auto_confirm && details.status == PaymentStatus::RequiresConfirmation {
            details.status = PaymentStatus::Succeeded;
        }
        Ok(details)
    }
}
