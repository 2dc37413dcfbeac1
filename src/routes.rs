use std::sync::Arc;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Query, Request, State},
    http::{header, HeaderMap},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::checkout::build_session_config;
use crate::config::AppConfig;
use crate::dtos::{
    ClientSecretResponse, CreateCheckoutSessionRequest, CreateCheckoutSessionResponse,
    CreatePaymentIntentRequest, PaymentStatusQuery, PaymentStatusResponse, PublicConfig,
    SessionStatusQuery, SessionStatusResponse, StripeWebhookResult,
};
use crate::error::ApiError;
use crate::models::{NewCoupon, NewPaymentIntent, UiMode};
use crate::provider::PaymentProvider;
use crate::webhook::{self, Dispatch, WebhookError};

const COUPON_LIST_LIMIT: u64 = 20;

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn PaymentProvider>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(provider: Arc<dyn PaymentProvider>, config: AppConfig) -> Self {
        Self {
            provider,
            config: Arc::new(config),
        }
    }
}

/// Builds the application router. Paths without a route are served from the
/// configured static directory.
pub fn app(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/config", get(public_config))
        .route("/create-checkout-session", post(create_checkout_session))
        .route("/coupons", get(list_coupons))
        .route("/create-test-coupon", post(create_test_coupon))
        .route("/session-status", get(session_status))
        .route("/create-payment-intent", post(create_payment_intent))
        .route("/payment-status", get(payment_status))
        .route("/webhook", post(stripe_webhook))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSON body that falls back to `T::default()` when the request carries no
/// JSON content type, so bodiless posts get the documented defaults.
pub struct JsonOrDefault<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonOrDefault<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self(T::default())),
            Err(rejection) => Err(rejection),
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn log_failure(operation: &'static str) -> impl FnOnce(ApiError) -> ApiError {
    move |err| {
        tracing::error!(error = %err, "Error {operation}");
        err
    }
}

async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(PublicConfig {
        publishable_key: state.config.stripe_publishable_key.clone(),
    })
}

async fn create_checkout_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    JsonOrDefault(request): JsonOrDefault<CreateCheckoutSessionRequest>,
) -> Result<Json<CreateCheckoutSessionResponse>, ApiError> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| state.config.fallback_origin());

    let ui_mode = request.ui_mode;
    let config = build_session_config(request, &origin, now());
    tracing::debug!(mode = ?config.mode, ?ui_mode, %origin, "Creating checkout session");

    let session = state
        .provider
        .create_checkout_session(&config)
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("creating checkout session"))?;

    let response = match ui_mode {
        UiMode::Embedded | UiMode::Custom => CreateCheckoutSessionResponse {
            session_id: session.id,
            client_secret: session.client_secret,
            url: None,
        },
        UiMode::Hosted => CreateCheckoutSessionResponse {
            session_id: session.id,
            client_secret: None,
            url: session.url,
        },
    };
    Ok(Json(response))
}

async fn list_coupons(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    let coupons = state
        .provider
        .list_coupons(COUPON_LIST_LIMIT)
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("listing coupons"))?;
    Ok(Json(coupons))
}

async fn create_test_coupon(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let coupon = state
        .provider
        .create_coupon(&NewCoupon::test_coupon())
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("creating test coupon"))?;
    Ok(Json(coupon))
}

async fn session_status(
    State(state): State<AppState>,
    Query(query): Query<SessionStatusQuery>,
) -> Result<Json<SessionStatusResponse>, ApiError> {
    let session_id = query
        .session_id
        .ok_or(ApiError::MissingParameter("session_id"))?;
    let session = state
        .provider
        .retrieve_checkout_session(&session_id)
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("retrieving session status"))?;
    Ok(Json(session.into()))
}

async fn create_payment_intent(
    State(state): State<AppState>,
    JsonOrDefault(request): JsonOrDefault<CreatePaymentIntentRequest>,
) -> Result<Json<ClientSecretResponse>, ApiError> {
    let intent = NewPaymentIntent {
        amount: request.amount,
        currency: request.currency,
        description: request.product_name,
        metadata: request
            .metadata
            .into_iter()
            .map(|(key, value)| match value {
                Value::String(s) => (key, s),
                other => (key, other.to_string()),
            })
            .collect(),
    };

    let client_secret = state
        .provider
        .create_payment_intent(&intent)
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("creating payment intent"))?;
    Ok(Json(ClientSecretResponse { client_secret }))
}

async fn payment_status(
    State(state): State<AppState>,
    Query(query): Query<PaymentStatusQuery>,
) -> Result<Json<PaymentStatusResponse>, ApiError> {
    let intent_id = query
        .payment_intent
        .ok_or(ApiError::MissingParameter("payment_intent"))?;
    let intent = state
        .provider
        .retrieve_payment_intent(&intent_id)
        .await
        .map_err(ApiError::from)
        .map_err(log_failure("retrieving payment status"))?;

    let status = if intent.status == "succeeded" {
        "complete".to_string()
    } else {
        intent.status
    };
    Ok(Json(PaymentStatusResponse {
        status,
        amount: intent.amount,
        currency: intent.currency,
        customer_email: intent.receipt_email,
    }))
}

async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StripeWebhookResult>, ApiError> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let verified = state
        .config
        .stripe_webhook_secret
        .as_deref()
        .ok_or(WebhookError::MissingSecret)
        .and_then(|secret| webhook::construct_event(&body, signature, secret, now()));

    let event = match verified {
        Ok(event) => event,
        Err(err) => {
            tracing::warn!(error = %err, "Webhook signature verification failed");
            return Err(err.into());
        }
    };

    match webhook::dispatch(&event) {
        Dispatch::CheckoutCompleted { session_id } => {
            tracing::info!(event_id = %event.id, %session_id, "Checkout completed");
        }
        Dispatch::Unhandled { event_type } => {
            tracing::info!(event_id = %event.id, %event_type, "Unhandled event type");
        }
    }
    Ok(Json(StripeWebhookResult { received: true }))
}
