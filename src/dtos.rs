use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::{CheckoutMode, LineItem, SessionDetails, UiMode};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCheckoutSessionRequest {
    pub mode: CheckoutMode,
    pub line_items: Option<Vec<LineItem>>,
    pub ui_mode: UiMode,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_fields: Vec<Value>,
    pub phone_number_collection: bool,
    pub shipping_address_collection: Option<ShippingAddressOptions>,
    pub allow_promotion_codes: bool,
    pub consent_collection: Option<Value>,
    pub custom_text: Option<Value>,
    pub customer_email: Option<String>,
    pub billing_address_collection: Option<String>,
    pub tax_id_collection: bool,
    pub adjustable_quantity: bool,
    pub submit_type: Option<String>,
    pub locale: Option<String>,
    pub expires_in_minutes: Option<i64>,
    pub payment_method_types: Option<Vec<String>>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub shipping_options: Vec<Value>,
    pub automatic_tax: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub discounts: Vec<Value>,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
    pub trial_period_days: Option<i64>,
    pub invoice_creation: bool,
    pub customer_creation: Option<String>,
    pub recovery_enabled: bool,
    pub saved_payment_method_options: Option<Value>,
}

/// An explicit `null` from the frontend means "not set".
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddressOptions {
    pub allowed_countries: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutSessionResponse {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publishable_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionStatusQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub status: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
    pub amount_subtotal: Option<i64>,
    pub total_details: Option<Value>,
    pub currency: Option<String>,
    pub line_items: Option<Vec<Value>>,
    pub shipping: Option<Value>,
    pub shipping_cost: Option<Value>,
    pub custom_fields: Option<Value>,
    pub metadata: Option<Value>,
    pub invoice: Option<Value>,
}

impl From<SessionDetails> for SessionStatusResponse {
    fn from(session: SessionDetails) -> Self {
        let customer = session.customer_details.unwrap_or_default();
        Self {
            status: session.status,
            customer_email: customer.email,
            customer_name: customer.name,
            customer_phone: customer.phone,
            payment_status: session.payment_status,
            amount_total: session.amount_total,
            amount_subtotal: session.amount_subtotal,
            total_details: session.total_details,
            currency: session.currency,
            line_items: session.line_items.map(|page| page.data),
            shipping: session.shipping_details,
            shipping_cost: session.shipping_cost,
            custom_fields: session.custom_fields,
            metadata: session.metadata,
            invoice: session.invoice,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatePaymentIntentRequest {
    pub amount: i64,
    pub currency: String,
    pub product_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metadata: Map<String, Value>,
}

impl Default for CreatePaymentIntentRequest {
    fn default() -> Self {
        Self {
            amount: 2000,
            currency: "usd".to_string(),
            product_name: "Sample Product".to_string(),
            metadata: Map::new(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSecretResponse {
    pub client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentStatusQuery {
    pub payment_intent: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaymentStatusResponse {
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub customer_email: Option<String>,
}

#[derive(serde::Serialize)]
pub struct StripeWebhookResult {
    pub received: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
