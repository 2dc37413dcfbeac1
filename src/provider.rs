//! The seam between the HTTP handlers and the payment API.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::models::{
    CreatedSession, NewCoupon, NewPaymentIntent, PaymentIntentSummary, SessionConfig,
    SessionDetails,
};

#[derive(Debug, Error)]
pub enum ProviderError {
    /// The payment API rejected or failed the call.
    #[error("{0}")]
    Api(String),

    /// The request could not be turned into a valid API call.
    #[error("{0}")]
    InvalidRequest(String),
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Api(err.to_string())
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Every operation is a single call against the payment API.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_checkout_session(&self, config: &SessionConfig)
        -> ProviderResult<CreatedSession>;

    /// Retrieves a session expanded with line items, customer, payment
    /// intent and invoice.
    async fn retrieve_checkout_session(&self, session_id: &str) -> ProviderResult<SessionDetails>;

    async fn list_coupons(&self, limit: u64) -> ProviderResult<Vec<Value>>;

    async fn create_coupon(&self, coupon: &NewCoupon) -> ProviderResult<Value>;

    /// Creates a payment intent with automatic payment methods enabled and
    /// returns its client secret.
    async fn create_payment_intent(&self, intent: &NewPaymentIntent)
        -> ProviderResult<Option<String>>;

    async fn retrieve_payment_intent(&self, intent_id: &str)
        -> ProviderResult<PaymentIntentSummary>;
}

/// Object ids are interpolated into request paths, so only the characters
/// the API issues are accepted.
pub fn validate_object_id(id: &str) -> ProviderResult<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(ProviderError::InvalidRequest(format!("invalid object id: {id:?}")))
    }
}
