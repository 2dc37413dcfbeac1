//! Provider-facing shapes: Checkout Session parameters as Stripe expects them
//! and the slices of Stripe objects this server reads back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    #[default]
    Payment,
    Subscription,
    Setup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Embedded,
    Hosted,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enabled {
    pub enabled: bool,
}

impl Enabled {
    pub fn on() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_data: Option<PriceData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adjustable_quantity: Option<AdjustableQuantity>,
    /// Any other line-item parameter, forwarded untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_data: Option<ProductData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring: Option<Recurring>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProductData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurring {
    pub interval: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustableQuantity {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShippingAddressCollection {
    pub allowed_countries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceCreation {
    pub enabled: bool,
    pub invoice_data: InvoiceData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceData {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AfterExpiration {
    pub recovery: Recovery,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recovery {
    pub enabled: bool,
    pub allow_promotion_codes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionData {
    pub trial_period_days: u32,
}

/// Parameters for `POST /v1/checkout/sessions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionConfig {
    pub ui_mode: UiMode,
    pub line_items: Vec<LineItem>,
    pub mode: CheckoutMode,
    pub phone_number_collection: Enabled,
    pub allow_promotion_codes: bool,
    pub billing_address_collection: String,
    pub locale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_creation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id_collection: Option<Enabled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub automatic_tax: Option<Enabled>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address_collection: Option<ShippingAddressCollection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_options: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent_collection: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounts: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_creation: Option<InvoiceCreation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_expiration: Option<AfterExpiration>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_data: Option<SubscriptionData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_payment_method_options: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

impl SessionConfig {
    /// Renders the parameters as JSON with every `null` removed, ready for
    /// form encoding.
    pub fn to_form(&self) -> Result<Value, serde_json::Error> {
        Ok(prune_nulls(serde_json::to_value(self)?))
    }
}

/// Recursively drops `null` object members and array elements. Form
/// encoding has no representation for them.
pub fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|v| !v.is_null())
                .map(prune_nulls)
                .collect(),
        ),
        other => other,
    }
}

/// The fields of a freshly created Checkout Session this server returns.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedSession {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub data: Vec<Value>,
}

/// A retrieved Checkout Session, expanded with line items, customer,
/// payment intent and invoice.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct SessionDetails {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub amount_subtotal: Option<i64>,
    #[serde(default)]
    pub total_details: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub line_items: Option<ListPage>,
    #[serde(default)]
    pub shipping_details: Option<Value>,
    #[serde(default)]
    pub shipping_cost: Option<Value>,
    #[serde(default)]
    pub custom_fields: Option<Value>,
    #[serde(default)]
    pub metadata: Option<Value>,
    #[serde(default)]
    pub invoice: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCoupon {
    pub name: String,
    pub percent_off: f64,
}

impl NewCoupon {
    /// The one-shot 20% coupon the demo creates on request.
    pub fn test_coupon() -> Self {
        Self {
            name: "20% Off Test Coupon".to_string(),
            percent_off: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentIntent {
    pub amount: i64,
    pub currency: String,
    pub description: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentSummary {
    pub status: String,
    pub amount: i64,
    pub currency: String,
    pub receipt_email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prune_nulls_drops_nested_nulls() {
        let pruned = prune_nulls(json!({
            "a": null,
            "b": {"c": null, "d": 1},
            "e": [null, {"f": null, "g": "x"}],
        }));
        assert_eq!(pruned, json!({"b": {"d": 1}, "e": [{"g": "x"}]}));
    }

    #[test]
    fn line_item_keeps_unknown_fields() {
        let item: LineItem = serde_json::from_value(json!({
            "price": "price_123",
            "quantity": 2,
            "tax_rates": ["txr_1"],
        }))
        .unwrap();
        assert_eq!(item.price.as_deref(), Some("price_123"));
        assert_eq!(item.quantity, Some(2));
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({"price": "price_123", "quantity": 2, "tax_rates": ["txr_1"]})
        );
    }

    #[test]
    fn session_details_tolerates_missing_fields() {
        let details: SessionDetails = serde_json::from_value(json!({
            "id": "cs_test_1",
            "status": "complete",
            "line_items": {"object": "list", "data": [{"id": "li_1"}]},
        }))
        .unwrap();
        assert_eq!(details.status.as_deref(), Some("complete"));
        assert!(details.customer_details.is_none());
        assert_eq!(details.line_items.unwrap().data.len(), 1);
    }
}
