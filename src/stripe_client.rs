use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use stripe::{
    Client, Coupon, CouponDuration, CreateCoupon, CreatePaymentIntent,
    CreatePaymentIntentAutomaticPaymentMethods, Currency, ListCoupons, PaymentIntent,
    PaymentIntentId, StripeError,
};

use crate::models::{
    CreatedSession, NewCoupon, NewPaymentIntent, PaymentIntentSummary, SessionConfig,
    SessionDetails,
};
use crate::provider::{validate_object_id, PaymentProvider, ProviderError, ProviderResult};

const SESSION_EXPANSIONS: [&str; 4] = ["line_items", "customer", "payment_intent", "invoice"];

impl From<StripeError> for ProviderError {
    fn from(err: StripeError) -> Self {
        let message = match &err {
            StripeError::Stripe(request) => request.message.clone(),
            _ => None,
        };
        Self::Api(message.unwrap_or_else(|| err.to_string()))
    }
}

#[derive(Serialize)]
struct ExpandParams<'a> {
    expand: &'a [&'a str],
}

/// `PaymentProvider` backed by the Stripe API.
#[derive(Clone)]
pub struct StripeProvider {
    client: Arc<Client>,
}

impl StripeProvider {
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            client: Arc::new(Client::new(secret_key.into())),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_checkout_session(
        &self,
        config: &SessionConfig,
    ) -> ProviderResult<CreatedSession> {
        // Pass-through options are free-form JSON, so the session goes out as
        // a raw form post rather than through the typed params.
        let form = config.to_form()?;
        let session = self
            .client
            .post_form::<CreatedSession, _>("/checkout/sessions", form)
            .await?;
        Ok(session)
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> ProviderResult<SessionDetails> {
        let session_id = validate_object_id(session_id)?;
        let session = self
            .client
            .get_query::<SessionDetails, _>(
                &format!("/checkout/sessions/{session_id}"),
                ExpandParams {
                    expand: &SESSION_EXPANSIONS,
                },
            )
            .await?;
        Ok(session)
    }

    async fn list_coupons(&self, limit: u64) -> ProviderResult<Vec<Value>> {
        let mut params = ListCoupons::new();
        params.limit = Some(limit);
        let coupons = Coupon::list(&self.client, &params).await?;
        coupons
            .data
            .into_iter()
            .map(|coupon| serde_json::to_value(coupon).map_err(ProviderError::from))
            .collect()
    }

    async fn create_coupon(&self, coupon: &NewCoupon) -> ProviderResult<Value> {
        let mut params = CreateCoupon::new();
        params.name = Some(coupon.name.as_str());
        params.percent_off = Some(coupon.percent_off);
        params.duration = Some(CouponDuration::Once);
        let created = Coupon::create(&self.client, params).await?;
        Ok(serde_json::to_value(created)?)
    }

    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> ProviderResult<Option<String>> {
        let currency: Currency = intent.currency.to_lowercase().parse().map_err(|_| {
            ProviderError::InvalidRequest(format!("unsupported currency: {}", intent.currency))
        })?;

        let mut params = CreatePaymentIntent::new(intent.amount, currency);
        params.automatic_payment_methods = Some(CreatePaymentIntentAutomaticPaymentMethods {
            allow_redirects: None,
            enabled: true,
        });
        params.description = Some(intent.description.as_str());
        if !intent.metadata.is_empty() {
            params.metadata = Some(intent.metadata.iter().cloned().collect::<HashMap<_, _>>());
        }

        let created = PaymentIntent::create(&self.client, params).await?;
        Ok(created.client_secret)
    }

    async fn retrieve_payment_intent(
        &self,
        intent_id: &str,
    ) -> ProviderResult<PaymentIntentSummary> {
        let id: PaymentIntentId = validate_object_id(intent_id)?.parse().map_err(|_| {
            ProviderError::InvalidRequest(format!("invalid payment intent id: {intent_id:?}"))
        })?;
        let intent = PaymentIntent::retrieve(&self.client, &id, &[]).await?;
        Ok(PaymentIntentSummary {
            status: intent.status.as_str().to_string(),
            amount: intent.amount,
            currency: intent.currency.to_string(),
            receipt_email: intent.receipt_email,
        })
    }
}
