#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use checkout_demo::models::{
    CreatedSession, NewCoupon, NewPaymentIntent, PaymentIntentSummary, SessionConfig,
    SessionDetails,
};
use checkout_demo::provider::{PaymentProvider, ProviderError, ProviderResult};
use checkout_demo::{app, AppConfig, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const WEBHOOK_SECRET: &str = "whsec_test_secret";

/// Records every call and answers with canned data, or with `failure` when set.
#[derive(Default)]
pub struct MockProvider {
    pub failure: Option<String>,
    pub session: Option<SessionDetails>,
    pub intent_status: Option<String>,
    pub session_configs: Mutex<Vec<SessionConfig>>,
    pub retrieved_sessions: Mutex<Vec<String>>,
    pub coupon_limits: Mutex<Vec<u64>>,
    pub created_coupons: Mutex<Vec<NewCoupon>>,
    pub payment_intents: Mutex<Vec<NewPaymentIntent>>,
}

impl MockProvider {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    fn check(&self) -> ProviderResult<()> {
        match &self.failure {
            Some(message) => Err(ProviderError::Api(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl PaymentProvider for MockProvider {
    async fn create_checkout_session(
        &self,
        config: &SessionConfig,
    ) -> ProviderResult<CreatedSession> {
        self.check()?;
        self.session_configs.lock().unwrap().push(config.clone());
        Ok(CreatedSession {
            id: "cs_test_123".to_string(),
            client_secret: Some("cs_test_123_secret_abc".to_string()),
            url: Some("https://checkout.stripe.com/c/pay/cs_test_123".to_string()),
        })
    }

    async fn retrieve_checkout_session(&self, session_id: &str) -> ProviderResult<SessionDetails> {
        self.check()?;
        self.retrieved_sessions
            .lock()
            .unwrap()
            .push(session_id.to_string());
        Ok(self.session.clone().unwrap_or_default())
    }

    async fn list_coupons(&self, limit: u64) -> ProviderResult<Vec<Value>> {
        self.check()?;
        self.coupon_limits.lock().unwrap().push(limit);
        Ok(vec![json!({"id": "co_1", "percent_off": 20.0})])
    }

    async fn create_coupon(&self, coupon: &NewCoupon) -> ProviderResult<Value> {
        self.check()?;
        self.created_coupons.lock().unwrap().push(coupon.clone());
        Ok(json!({"id": "co_new", "name": coupon.name, "percent_off": coupon.percent_off, "duration": "once"}))
    }

    async fn create_payment_intent(
        &self,
        intent: &NewPaymentIntent,
    ) -> ProviderResult<Option<String>> {
        self.check()?;
        self.payment_intents.lock().unwrap().push(intent.clone());
        Ok(Some("pi_123_secret_xyz".to_string()))
    }

    async fn retrieve_payment_intent(
        &self,
        _intent_id: &str,
    ) -> ProviderResult<PaymentIntentSummary> {
        self.check()?;
        Ok(PaymentIntentSummary {
            status: self
                .intent_status
                .clone()
                .unwrap_or_else(|| "succeeded".to_string()),
            amount: 2000,
            currency: "usd".to_string(),
            receipt_email: Some("jane@example.com".to_string()),
        })
    }
}

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|name| match name {
        "STRIPE_SECRET_KEY" => Some("sk_test_123".to_string()),
        "STRIPE_PUBLISHABLE_KEY" => Some("pk_test_123".to_string()),
        "STRIPE_WEBHOOK_SECRET" => Some(WEBHOOK_SECRET.to_string()),
        _ => None,
    })
    .unwrap()
}

pub async fn send(
    provider: Arc<MockProvider>,
    config: AppConfig,
    request: Request<Body>,
) -> Response<Body> {
    let state = AppState::new(provider, config);
    app(state).oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
